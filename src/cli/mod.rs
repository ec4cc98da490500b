use crate::config::{Config, DEFAULT_CONFIG_FILE, LLMProvider};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// EduFlow - 由多智能体协作生成教学文章，并通过WebSocket实时推送进度
#[derive(Parser, Debug)]
#[command(name = "eduflow")]
#[command(
    about = "Generate educational articles with a researcher/planner crew and a content-writer crew, streaming progress over a local WebSocket."
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 文章主题
    #[arg(short, long, global = true)]
    pub topic: Option<String>,

    /// 读者水平
    #[arg(short, long, global = true)]
    pub audience_level: Option<String>,

    /// 输出目录
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// WebSocket监听地址
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// WebSocket监听端口
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// LLM Provider (openai, groq, anthropic)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long, global = true)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long, global = true)]
    pub llm_api_base_url: Option<String>,

    /// 模型名称
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long, global = true)]
    pub temperature: Option<f64>,

    /// 不启动前端开发服务器
    #[arg(long, global = true)]
    pub no_frontend: bool,

    /// 前端工程目录
    #[arg(long, global = true)]
    pub frontend_dir: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    /// 执行文章生成流程（默认）
    #[default]
    Run,
    /// 输出流程图（mermaid）
    Plot,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        if let Some(topic) = self.topic {
            config.inputs.topic = topic;
        }
        if let Some(audience_level) = self.audience_level {
            config.inputs.audience_level = audience_level;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }

        // 覆盖WebSocket配置
        if let Some(host) = self.host {
            config.websocket.host = host;
        }
        if let Some(port) = self.port {
            config.websocket.port = port;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => tracing::warn!(
                    provider = %provider_str,
                    "⚠️ 未知的provider，使用默认provider {}",
                    config.llm.provider
                ),
            }
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 前端配置
        if self.no_frontend {
            config.frontend.enabled = false;
        }
        if let Some(frontend_dir) = self.frontend_dir {
            config.frontend.dir = frontend_dir;
        }

        config.verbose = config.verbose || self.verbose;

        config.validate()?;
        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
