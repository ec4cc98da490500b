use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use crate::config::Config;
use crate::frontend::FrontendProcess;
use crate::generator::compose::EduContentWriterCrew;
use crate::generator::context::GeneratorContext;
use crate::generator::crew::Crew;
use crate::generator::outlet::{MarkdownOutlet, Outlet};
use crate::generator::research::{EduResearchCrew, EducationalPlan};
use crate::llm::LLMClient;
use crate::notify::{BroadcastServer, StageKeys, UpdateSender, update_queue};

/// 流水线各阶段的错误
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("research stage failed")]
    Research(#[source] anyhow::Error),

    #[error("research stage returned an invalid educational plan")]
    InvalidPlan(#[source] anyhow::Error),

    #[error("content generation failed for section '{section}'")]
    Content {
        section: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to save markdown to {}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FlowError {
    /// 出错的阶段
    pub fn stage(&self) -> &'static str {
        match self {
            FlowError::Research(_) | FlowError::InvalidPlan(_) => StageKeys::RESEARCH,
            FlowError::Content { .. } => StageKeys::CONTENT,
            FlowError::Persist { .. } => StageKeys::SAVE,
        }
    }
}

/// 阶段计时
#[derive(Debug, Default)]
pub struct StageTimings {
    durations: Vec<(&'static str, Duration)>,
}

impl StageTimings {
    pub fn record(&mut self, stage: &'static str, started: Instant) {
        self.durations.push((stage, started.elapsed()));
    }

    pub fn report(&self) -> String {
        let total: Duration = self.durations.iter().map(|(_, d)| *d).sum();
        let mut report = format!("总执行时间: {:.2}秒\n", total.as_secs_f64());
        for (stage, duration) in &self.durations {
            report.push_str(&format!("- {}: {:.3}秒\n", stage, duration.as_secs_f64()));
        }
        report
    }
}

/// 教学文章生成流程：research → content → save
pub struct EduFlow {
    context: GeneratorContext,
    research_crew: Arc<dyn Crew>,
    writer_crew: Arc<dyn Crew>,
}

impl EduFlow {
    pub fn new(
        context: GeneratorContext,
        research_crew: Arc<dyn Crew>,
        writer_crew: Arc<dyn Crew>,
    ) -> Self {
        Self {
            context,
            research_crew,
            writer_crew,
        }
    }

    /// 依次执行三个阶段，返回保存的文件路径。任一阶段失败即终止，不重试。
    pub async fn kickoff(&self) -> Result<PathBuf, FlowError> {
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let plan = self.report(self.generate_researched_content().await)?;
        timings.record(StageKeys::RESEARCH, started);

        let started = Instant::now();
        let content = self.report(self.generate_educational_content(&plan).await)?;
        timings.record(StageKeys::CONTENT, started);

        let started = Instant::now();
        let output_path = self.report(self.save_to_markdown(&content))?;
        timings.record(StageKeys::SAVE, started);

        tracing::info!("⏱️ 流程耗时\n{}", timings.report());
        Ok(output_path)
    }

    /// 执行流程，无论成功失败都再等待 `linger`，让广播循环推送最后的状态消息
    pub async fn run(&self, linger: Duration) -> Result<PathBuf, FlowError> {
        let result = self.kickoff().await;
        tokio::time::sleep(linger).await;
        result
    }

    fn report<T>(&self, result: Result<T, FlowError>) -> Result<T, FlowError> {
        if let Err(e) = &result {
            tracing::error!(stage = e.stage(), error = ?e, "❌ 阶段执行失败");
            self.context.updates.send_failed(e.stage(), e.to_string());
        }
        result
    }

    /// 研究阶段：调用研究 crew 生成教学计划
    pub async fn generate_researched_content(&self) -> Result<EducationalPlan, FlowError> {
        let updates = &self.context.updates;
        updates.send_update(
            StageKeys::RESEARCH,
            format!("Starting research phase with {}", self.research_crew.name()),
        );

        let output = self
            .research_crew
            .kickoff(&self.context.input_variables())
            .await
            .map_err(FlowError::Research)?;
        let plan: EducationalPlan = output.parse().map_err(FlowError::InvalidPlan)?;

        updates.send_completed(StageKeys::RESEARCH, "Research phase completed");
        Ok(plan)
    }

    /// 内容阶段：按计划顺序为每个章节调用写作 crew
    pub async fn generate_educational_content(
        &self,
        plan: &EducationalPlan,
    ) -> Result<Vec<String>, FlowError> {
        let updates = &self.context.updates;
        updates.send_update(
            StageKeys::CONTENT,
            format!("Starting content generation with {}", self.writer_crew.name()),
        );

        let mut final_content = Vec::with_capacity(plan.sections.len());
        for section in &plan.sections {
            let section_json = serde_json::to_string(section).map_err(|e| FlowError::Content {
                section: section.title.clone(),
                source: e.into(),
            })?;
            let writer_inputs = self.context.input_variables().with("section", section_json);

            updates.send_update(
                StageKeys::CONTENT,
                format!("Generating content for section: {}", section.title),
            );
            let output = self
                .writer_crew
                .kickoff(&writer_inputs)
                .await
                .map_err(|source| FlowError::Content {
                    section: section.title.clone(),
                    source,
                })?;
            final_content.push(output.raw);
        }

        updates.send_completed(StageKeys::CONTENT, "Content generation completed");
        Ok(final_content)
    }

    /// 保存阶段：写入 `<output_dir>/<topic>_<audience_level>.md`
    pub fn save_to_markdown(&self, content: &[String]) -> Result<PathBuf, FlowError> {
        let updates = &self.context.updates;
        updates.send_update(StageKeys::SAVE, "Starting to save content to markdown");

        let config = &self.context.config;
        let file_name = config.output_file_name();
        let outlet = MarkdownOutlet::new(&config.output_dir, file_name.as_str());
        let output_path = outlet.save(content).map_err(|source| FlowError::Persist {
            path: outlet.output_path(),
            source,
        })?;

        updates.send_completed(StageKeys::SAVE, format!("Content saved to {}", file_name));
        Ok(output_path)
    }

    /// 流程图（mermaid）
    pub fn plot() -> String {
        [
            "flowchart TD",
            "    start((start)) --> generate_researched_content",
            "    generate_researched_content[\"generate_researched_content<br/>EduResearchCrew\"] -->|EducationalPlan| generate_educational_content",
            "    generate_educational_content[\"generate_educational_content<br/>EduContentWriterCrew\"] -->|sections| save_to_markdown",
            "    save_to_markdown[\"save_to_markdown<br/>output/&lt;topic&gt;_&lt;audience_level&gt;.md\"]",
        ]
        .join("\n")
    }
}

/// 启动完整流程：WebSocket广播服务、前端、生成流水线。
/// 前端启动之后的任何退出路径（含 Ctrl-C）都会关闭前端进程组。
pub async fn launch(config: &Config) -> Result<PathBuf> {
    if let Ok(key) = std::env::var("LANGTRACE_API_KEY")
        && !key.is_empty()
    {
        tracing::info!("LANGTRACE_API_KEY 已设置");
    }

    let (updates, receiver) = update_queue();
    let server = BroadcastServer::bind(&config.websocket, receiver)
        .await
        .context("Failed to start WebSocket server")?;
    let _server = server.spawn()?;

    let frontend = FrontendProcess::start(&config.frontend)?;

    let result = tokio::select! {
        result = async {
            if frontend.is_some() {
                tokio::time::sleep(config.frontend.startup_wait()).await;
            }
            run_flow(config, updates).await
        } => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("interrupted, shutting down")),
    };

    if let Some(frontend) = frontend {
        frontend.shutdown().await;
    }
    result
}

async fn run_flow(config: &Config, updates: UpdateSender) -> Result<PathBuf> {
    let llm_client = LLMClient::new(config.llm.clone())?;
    let research_crew = Arc::new(EduResearchCrew::new(llm_client.clone(), updates.clone()));
    let writer_crew = Arc::new(EduContentWriterCrew::new(llm_client));
    let context = GeneratorContext::new(config.clone(), updates);
    let flow = EduFlow::new(context, research_crew, writer_crew);

    tracing::info!(
        topic = %config.inputs.topic,
        audience_level = %config.inputs.audience_level,
        "🚀 开始执行EduFlow流程..."
    );

    let output_path = flow.run(config.websocket.poll_interval() * 2).await?;
    tracing::info!(path = %output_path.display(), "✓ EduFlow流程执行完毕");
    Ok(output_path)
}

// Include tests
#[cfg(test)]
mod tests;
