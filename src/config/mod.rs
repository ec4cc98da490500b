use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "eduflow.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "groq")]
    Groq,
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Groq => write!(f, "groq"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "groq" => Ok(LLMProvider::Groq),
            "anthropic" => Ok(LLMProvider::Anthropic),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 该provider的默认模型
    pub fn default_model(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "gpt-3.5-turbo",
            LLMProvider::Groq => "mixtral-8x7b-32768",
            LLMProvider::Anthropic => "claude-3-5-sonnet-20240620",
        }
    }

    /// 读取API KEY的环境变量名
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OPENAI_API_KEY",
            LLMProvider::Groq => "GROQ_API_KEY",
            LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 流水线输入变量
    pub inputs: FlowInputs,

    /// 输出目录
    pub output_dir: PathBuf,

    /// WebSocket服务配置
    pub websocket: WebSocketConfig,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 前端开发服务器配置
    pub frontend: FrontendConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// 流水线输入变量
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FlowInputs {
    pub topic: String,
    pub audience_level: String,
}

impl FlowInputs {
    /// 转换为crew使用的命名变量表
    pub fn to_variables(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("topic".to_string(), self.topic.clone()),
            ("audience_level".to_string(), self.audience_level.clone()),
        ])
    }
}

impl Default for FlowInputs {
    fn default() -> Self {
        Self {
            topic: "Multi-agent systems".to_string(),
            audience_level: "advanced".to_string(),
        }
    }
}

/// WebSocket服务配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebSocketConfig {
    pub host: String,
    pub port: u16,
    /// 心跳间隔（秒）
    pub ping_interval_secs: u64,
    /// 心跳超时（秒）
    pub ping_timeout_secs: u64,
    /// 队列空闲时的轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl WebSocketConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 心跳间隔、心跳超时与轮询间隔都必须大于0
    pub fn validate(&self) -> Result<()> {
        if self.ping_interval_secs == 0 {
            bail!("websocket.ping_interval_secs must be greater than 0");
        }
        if self.ping_timeout_secs == 0 {
            bail!("websocket.ping_timeout_secs must be greater than 0");
        }
        if self.poll_interval_ms == 0 {
            bail!("websocket.poll_interval_ms must be greater than 0");
        }
        Ok(())
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8765,
            ping_interval_secs: 20,
            ping_timeout_secs: 20,
            poll_interval_ms: 100,
        }
    }
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY，为空时从provider对应的环境变量读取
    pub api_key: String,

    /// LLM API基地址，为空时使用provider默认地址
    pub api_base_url: String,

    /// 模型名称，为空时使用provider默认模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 工具调用的最大轮数
    pub max_turns: usize,
}

impl LLMConfig {
    /// 实际使用的模型
    pub fn effective_model(&self) -> String {
        if self.model.trim().is_empty() {
            self.provider.default_model().to_string()
        } else {
            self.model.clone()
        }
    }

    /// 实际使用的API KEY。显式配置优先，其次 EDUFLOW_LLM_API_KEY，最后是provider对应的环境变量
    pub fn effective_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("EDUFLOW_LLM_API_KEY")
            .or_else(|_| std::env::var(self.provider.api_key_env()))
            .unwrap_or_default()
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: String::new(),
            model: String::new(),
            max_tokens: 4096,
            temperature: 0.7,
            max_turns: 8,
        }
    }
}

/// 前端开发服务器配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FrontendConfig {
    /// 是否启动前端
    pub enabled: bool,

    /// 前端工程目录
    pub dir: PathBuf,

    /// 启动命令
    pub command: Vec<String>,

    /// 启动后等待时间（秒）
    pub startup_wait_secs: u64,
}

impl FrontendConfig {
    pub fn startup_wait(&self) -> Duration {
        Duration::from_secs(self.startup_wait_secs)
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("crewai-visualizer"),
            command: vec!["npm".to_string(), "run".to_string(), "dev".to_string()],
            startup_wait_secs: 3,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<()> {
        self.websocket.validate()
    }

    /// 输出的markdown文件名，空格替换为下划线
    pub fn output_file_name(&self) -> String {
        format!("{}_{}.md", self.inputs.topic, self.inputs.audience_level).replace(' ', "_")
    }

    /// 输出的markdown文件完整路径
    pub fn output_file_path(&self) -> PathBuf {
        self.output_dir.join(self.output_file_name())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: FlowInputs::default(),
            output_dir: PathBuf::from("output"),
            websocket: WebSocketConfig::default(),
            llm: LLMConfig::default(),
            frontend: FrontendConfig::default(),
            verbose: false,
        }
    }
}
