use crate::generator::crew::{AgentSpec, TaskSpec};

pub const RESEARCHER: AgentSpec = AgentSpec {
    role: "{topic} Senior Data Researcher",
    goal: "Uncover cutting-edge developments in {topic} that matter to an {audience_level} audience",
    backstory: "You're a seasoned researcher with a knack for uncovering the latest developments in {topic}. \
Known for your ability to find the most relevant information and present it in a clear and concise manner.",
};

pub const PLANNER: AgentSpec = AgentSpec {
    role: "{topic} Educational Content Planner",
    goal: "Turn research findings about {topic} into a structured learning plan for an {audience_level} audience",
    backstory: "You're an experienced instructional designer. You break complex subjects into \
well-ordered sections, each with a clear goal, a reason to care and trustworthy sources.",
};

pub const RESEARCH_TASK: TaskSpec = TaskSpec {
    description: "Conduct a thorough research about {topic}. Make sure you find any interesting and \
relevant information given the audience level is {audience_level}. Collect the sources you rely on.",
    expected_output: "A list with 10 bullet points of the most relevant information about {topic}, \
each followed by the URL of its source.",
};

pub const PLANNING_TASK: TaskSpec = TaskSpec {
    description: "Review the research about {topic} and design an educational plan for an \
{audience_level} audience. Split the material into sections that build on each other.",
    expected_output: "An educational plan made of sections. Every section has a title, a high level \
goal, why it is important, the sources it draws on and an outline of its content.",
};
