#[cfg(test)]
mod tests {
    use crate::cli::{Args, Command};
    use crate::config::LLMProvider;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["eduflow"]).unwrap();

        assert!(args.command.is_none());
        assert!(args.config.is_none());
        assert!(args.topic.is_none());
        assert!(!args.no_frontend);
        assert!(!args.verbose);
    }

    #[test]
    fn test_subcommands() {
        let args = Args::try_parse_from(["eduflow", "plot"]).unwrap();
        assert_eq!(args.command, Some(Command::Plot));

        let args = Args::try_parse_from(["eduflow", "run", "--no-frontend"]).unwrap();
        assert_eq!(args.command, Some(Command::Run));
        assert!(args.no_frontend);

        assert_eq!(Command::default(), Command::Run);
    }

    #[test]
    fn test_args_short_options() {
        let args = Args::try_parse_from([
            "eduflow",
            "-t",
            "Quantum computing",
            "-a",
            "beginner",
            "-o",
            "/tmp/articles",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.topic, Some("Quantum computing".to_string()));
        assert_eq!(args.audience_level, Some("beginner".to_string()));
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/articles")));
        assert!(args.verbose);
    }

    #[test]
    fn test_into_config_overrides() {
        let args = Args::try_parse_from([
            "eduflow",
            "--topic",
            "Quantum computing",
            "--audience-level",
            "intermediate",
            "--port",
            "9999",
            "--host",
            "127.0.0.1",
            "--llm-provider",
            "groq",
            "--model",
            "llama3-70b-8192",
            "--max-tokens",
            "2048",
            "--temperature",
            "0.3",
            "--no-frontend",
        ])
        .unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(config.inputs.topic, "Quantum computing");
        assert_eq!(config.inputs.audience_level, "intermediate");
        assert_eq!(config.websocket.address(), "127.0.0.1:9999");
        assert_eq!(config.llm.provider, LLMProvider::Groq);
        assert_eq!(config.llm.model, "llama3-70b-8192");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.llm.temperature, 0.3);
        assert!(!config.frontend.enabled);
        assert_eq!(config.output_file_name(), "Quantum_computing_intermediate.md");
    }

    #[test]
    fn test_into_config_unknown_provider_keeps_default() {
        let args = Args::try_parse_from(["eduflow", "--llm-provider", "nope"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_into_config_from_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &config_path,
            "[inputs]\ntopic = \"Compilers\"\naudience_level = \"expert\"\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "eduflow",
            "--config",
            config_path.to_str().unwrap(),
            "--audience-level",
            "beginner",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.inputs.topic, "Compilers");
        assert_eq!(config.inputs.audience_level, "beginner");
    }

    #[test]
    fn test_into_config_missing_explicit_file_fails() {
        let args = Args::try_parse_from(["eduflow", "--config", "/definitely/missing.toml"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_into_config_rejects_zero_poll_interval() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        std::fs::write(&config_path, "[websocket]\npoll_interval_ms = 0\n").unwrap();

        let args =
            Args::try_parse_from(["eduflow", "--config", config_path.to_str().unwrap()]).unwrap();
        assert!(args.into_config().is_err());
    }
}
