use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::generator::crew::{Crew, CrewInputs, CrewOutput};
use crate::llm::LLMClient;

pub mod agents;

/// 内容写作 crew：writer → editor，顺序执行，输出最后一步的文本
pub struct EduContentWriterCrew {
    llm_client: LLMClient,
}

impl EduContentWriterCrew {
    pub const NAME: &'static str = "EduContentWriterCrew";

    pub fn new(llm_client: LLMClient) -> Self {
        Self { llm_client }
    }
}

#[async_trait]
impl Crew for EduContentWriterCrew {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn kickoff(&self, inputs: &CrewInputs) -> Result<CrewOutput> {
        let draft = self
            .llm_client
            .prompt(
                &agents::CONTENT_WRITER.system_prompt(inputs),
                &agents::WRITING_TASK.user_prompt(inputs, &[]),
            )
            .await
            .context("writing task failed")?;
        tracing::debug!(chars = draft.len(), "✍️ 初稿完成");

        let edited = self
            .llm_client
            .prompt(
                &agents::EDITOR.system_prompt(inputs),
                &agents::EDITING_TASK.user_prompt(inputs, &[draft.as_str()]),
            )
            .await
            .context("editing task failed")?;
        tracing::debug!(chars = edited.len(), "✍️ 编辑完成");

        Ok(CrewOutput::raw(edited))
    }
}
