#[cfg(test)]
mod tests {
    use crate::config::{Config, FrontendConfig};
    use crate::generator::context::GeneratorContext;
    use crate::generator::crew::{Crew, CrewInputs, CrewOutput};
    use crate::generator::outlet;
    use crate::generator::research::{EducationalPlan, Section};
    use crate::generator::workflow::{EduFlow, FlowError, launch};
    use crate::notify::{StatusMessage, Status, UpdateReceiver, update_queue};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn section(title: &str) -> Section {
        Section {
            title: title.to_string(),
            high_level_goal: format!("Understand {}", title),
            why_important: "It matters".to_string(),
            sources: vec!["https://example.com".to_string()],
            content_outline: vec!["Definition".to_string(), "Examples".to_string()],
        }
    }

    struct PlanCrew(EducationalPlan);

    #[async_trait]
    impl Crew for PlanCrew {
        fn name(&self) -> &str {
            "EduResearchCrew"
        }

        async fn kickoff(&self, _inputs: &CrewInputs) -> Result<CrewOutput> {
            Ok(CrewOutput::structured(
                "plan",
                serde_json::to_value(&self.0).unwrap(),
            ))
        }
    }

    struct FailingCrew;

    #[async_trait]
    impl Crew for FailingCrew {
        fn name(&self) -> &str {
            "FailingCrew"
        }

        async fn kickoff(&self, _inputs: &CrewInputs) -> Result<CrewOutput> {
            Err(anyhow!("provider unavailable"))
        }
    }

    /// 按章节标题生成固定文本，并记录收到的输入
    #[derive(Default)]
    struct EchoWriterCrew {
        seen: Mutex<Vec<CrewInputs>>,
    }

    #[async_trait]
    impl Crew for EchoWriterCrew {
        fn name(&self) -> &str {
            "EduContentWriterCrew"
        }

        async fn kickoff(&self, inputs: &CrewInputs) -> Result<CrewOutput> {
            self.seen.lock().unwrap().push(inputs.clone());
            let section: Section = serde_json::from_str(inputs.get("section").unwrap())?;
            Ok(CrewOutput::raw(format!("## {}\nBody of {}", section.title, section.title)))
        }
    }

    fn create_test_context(temp_dir: &TempDir) -> (GeneratorContext, UpdateReceiver) {
        let config = Config {
            output_dir: temp_dir.path().join("output"),
            ..Default::default()
        };
        let (updates, receiver) = update_queue();
        (GeneratorContext::new(config, updates), receiver)
    }

    fn stages(messages: &[StatusMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.stage.as_str()).collect()
    }

    #[tokio::test]
    async fn test_flow_writes_sections_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let (context, mut receiver) = create_test_context(&temp_dir);
        let plan = EducationalPlan {
            sections: vec![section("Agents"), section("Coordination"), section("Emergence")],
        };
        let writer = Arc::new(EchoWriterCrew::default());
        let flow = EduFlow::new(context, Arc::new(PlanCrew(plan)), writer.clone());

        let path = flow.kickoff().await.unwrap();

        assert_eq!(
            path,
            temp_dir.path().join("output/Multi-agent_systems_advanced.md")
        );
        let expected = vec![
            "## Agents\nBody of Agents".to_string(),
            "## Coordination\nBody of Coordination".to_string(),
            "## Emergence\nBody of Emergence".to_string(),
        ];
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            outlet::render(&expected)
        );

        let seen = writer.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].get("topic"), Some("Multi-agent systems"));
        assert_eq!(seen[0].get("audience_level"), Some("advanced"));

        let messages = receiver.drain_all();
        assert_eq!(
            messages.iter().map(|m| m.message.as_str()).collect::<Vec<_>>(),
            vec![
                "Starting research phase with EduResearchCrew",
                "Research phase completed",
                "Starting content generation with EduContentWriterCrew",
                "Generating content for section: Agents",
                "Generating content for section: Coordination",
                "Generating content for section: Emergence",
                "Content generation completed",
                "Starting to save content to markdown",
                "Content saved to Multi-agent_systems_advanced.md",
            ]
        );
        assert_eq!(
            stages(&messages),
            vec![
                "research", "research", "content", "content", "content", "content", "content",
                "save", "save"
            ]
        );
        assert!(messages.iter().all(|m| m.status != Status::Failed));
    }

    #[tokio::test]
    async fn test_research_failure_stops_the_flow() {
        let temp_dir = TempDir::new().unwrap();
        let (context, mut receiver) = create_test_context(&temp_dir);
        let output_path = context.config.output_file_path();
        let writer = Arc::new(EchoWriterCrew::default());
        let flow = EduFlow::new(context, Arc::new(FailingCrew), writer.clone());

        let result = flow.kickoff().await;

        assert!(matches!(result, Err(FlowError::Research(_))));
        assert!(!output_path.exists());
        assert!(writer.seen.lock().unwrap().is_empty());

        let messages = receiver.drain_all();
        assert!(messages.iter().all(|m| m.stage == "research"));
        assert_eq!(messages.last().unwrap().status, Status::Failed);
    }

    #[tokio::test]
    async fn test_invalid_plan_is_reported() {
        struct ProseCrew;

        #[async_trait]
        impl Crew for ProseCrew {
            fn name(&self) -> &str {
                "ProseCrew"
            }

            async fn kickoff(&self, _inputs: &CrewInputs) -> Result<CrewOutput> {
                Ok(CrewOutput::raw("Here is a plan: first learn agents."))
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let (context, mut receiver) = create_test_context(&temp_dir);
        let flow = EduFlow::new(context, Arc::new(ProseCrew), Arc::new(EchoWriterCrew::default()));

        let result = flow.kickoff().await;

        assert!(matches!(result, Err(FlowError::InvalidPlan(_))));
        assert!(receiver.drain_all().iter().all(|m| m.stage == "research"));
    }

    #[tokio::test]
    async fn test_content_failure_skips_save() {
        let temp_dir = TempDir::new().unwrap();
        let (context, mut receiver) = create_test_context(&temp_dir);
        let output_path = context.config.output_file_path();
        let plan = EducationalPlan {
            sections: vec![section("Agents")],
        };
        let flow = EduFlow::new(context, Arc::new(PlanCrew(plan)), Arc::new(FailingCrew));

        let result = flow.kickoff().await;

        match result {
            Err(FlowError::Content { section, .. }) => assert_eq!(section, "Agents"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!output_path.exists());
        assert!(receiver.drain_all().iter().all(|m| m.stage != "save"));
    }

    #[tokio::test]
    async fn test_empty_plan_writes_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let (context, _receiver) = create_test_context(&temp_dir);
        let flow = EduFlow::new(
            context,
            Arc::new(PlanCrew(EducationalPlan::default())),
            Arc::new(EchoWriterCrew::default()),
        );

        let path = flow.kickoff().await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_flow_error_stage() {
        assert_eq!(FlowError::Research(anyhow!("x")).stage(), "research");
        assert_eq!(
            FlowError::Content {
                section: "s".to_string(),
                source: anyhow!("x")
            }
            .stage(),
            "content"
        );
    }

    #[test]
    fn test_plot_lists_every_stage() {
        let graph = EduFlow::plot();
        assert!(graph.starts_with("flowchart TD"));
        for stage in [
            "generate_researched_content",
            "generate_educational_content",
            "save_to_markdown",
        ] {
            assert!(graph.contains(stage));
        }
    }

    #[tokio::test]
    async fn test_failed_flow_lingers_before_returning() {
        let temp_dir = TempDir::new().unwrap();
        let (context, mut receiver) = create_test_context(&temp_dir);
        let flow = EduFlow::new(
            context,
            Arc::new(FailingCrew),
            Arc::new(EchoWriterCrew::default()),
        );

        let started = Instant::now();
        let result = flow.run(Duration::from_millis(200)).await;

        assert!(matches!(result, Err(FlowError::Research(_))));
        assert!(started.elapsed() >= Duration::from_millis(200));
        let messages = receiver.drain_all();
        assert_eq!(messages.last().unwrap().status, Status::Failed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_bind_failure_starts_no_frontend() {
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("frontend_started");

        let mut config = Config::default();
        config.websocket.host = "127.0.0.1".to_string();
        config.websocket.port = occupied.local_addr().unwrap().port();
        config.frontend = FrontendConfig {
            enabled: true,
            dir: temp_dir.path().to_path_buf(),
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                "touch frontend_started; sleep 300 & wait".to_string(),
            ],
            startup_wait_secs: 0,
        };

        let err = launch(&config).await.unwrap_err();

        assert!(err.to_string().contains("Failed to start WebSocket server"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!marker.exists());
    }
}
