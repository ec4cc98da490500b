// 教学研究 crew
// 研究员（可使用网络搜索）负责收集资料 → 规划师把资料整理为结构化的教学计划

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::generator::crew::{Crew, CrewInputs, CrewOutput};
use crate::llm::LLMClient;
use crate::notify::UpdateSender;

pub mod agents;
pub mod types;

pub use types::{EducationalPlan, Section};

/// 研究 crew：researcher → planner，顺序执行
pub struct EduResearchCrew {
    llm_client: LLMClient,
    updates: UpdateSender,
}

impl EduResearchCrew {
    pub const NAME: &'static str = "EduResearchCrew";

    pub fn new(llm_client: LLMClient, updates: UpdateSender) -> Self {
        Self {
            llm_client,
            updates,
        }
    }
}

#[async_trait]
impl Crew for EduResearchCrew {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn kickoff(&self, inputs: &CrewInputs) -> Result<CrewOutput> {
        self.updates
            .send_update(Self::NAME, "Starting research phase...");

        tracing::info!("🔎 研究员开始调研...");
        let research_notes = self
            .llm_client
            .prompt_with_tools(
                &agents::RESEARCHER.system_prompt(inputs),
                &agents::RESEARCH_TASK.user_prompt(inputs, &[]),
            )
            .await
            .context("research task failed")?;

        tracing::info!("🗂️ 规划师整理教学计划...");
        let plan: EducationalPlan = self
            .llm_client
            .extract(
                &agents::PLANNER.system_prompt(inputs),
                &agents::PLANNING_TASK.user_prompt(inputs, &[research_notes.as_str()]),
            )
            .await
            .context("planning task failed")?;

        tracing::info!(sections = plan.sections.len(), "✓ 教学计划已生成");

        let raw = serde_json::to_string_pretty(&plan)?;
        Ok(CrewOutput::structured(raw, serde_json::to_value(&plan)?))
    }
}
