//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::{Prompt, PromptError},
    extractor::Extractor,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    config::{LLMConfig, LLMProvider},
    llm::tools::web_search::AgentToolWebSearch,
};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    Groq(rig::providers::groq::Client),
    Anthropic(rig::providers::anthropic::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let api_key = config.effective_api_key();
        match config.provider {
            LLMProvider::OpenAI => {
                let mut builder = rig::providers::openai::Client::builder(&api_key);
                if !config.api_base_url.is_empty() {
                    builder = builder.base_url(&config.api_base_url);
                }
                Ok(ProviderClient::OpenAI(builder.build()))
            }
            LLMProvider::Groq => {
                let client = rig::providers::groq::Client::builder(&api_key).build();
                Ok(ProviderClient::Groq(client))
            }
            LLMProvider::Anthropic => {
                let client = rig::providers::anthropic::ClientBuilder::new(&api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
        }
    }

    /// 创建Agent
    pub fn create_agent(&self, system_prompt: &str, config: &LLMConfig) -> ProviderAgent {
        let model = config.effective_model();
        match self {
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .completion_model(&model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
                    .build();
                ProviderAgent::OpenAI(agent)
            }
            ProviderClient::Groq(client) => {
                let agent = client
                    .agent(&model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
                    .build();
                ProviderAgent::Groq(agent)
            }
            ProviderClient::Anthropic(client) => {
                let agent = client
                    .agent(&model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
                    .build();
                ProviderAgent::Anthropic(agent)
            }
        }
    }

    /// 创建带网络搜索工具的Agent
    pub fn create_agent_with_search(
        &self,
        system_prompt: &str,
        config: &LLMConfig,
        web_search: &AgentToolWebSearch,
    ) -> ProviderAgent {
        let model = config.effective_model();
        match self {
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .completion_model(&model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
                    .tool(web_search.clone())
                    .build();
                ProviderAgent::OpenAI(agent)
            }
            ProviderClient::Groq(client) => {
                let agent = client
                    .agent(&model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
                    .tool(web_search.clone())
                    .build();
                ProviderAgent::Groq(agent)
            }
            ProviderClient::Anthropic(client) => {
                let agent = client
                    .agent(&model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
                    .tool(web_search.clone())
                    .build();
                ProviderAgent::Anthropic(agent)
            }
        }
    }

    /// 创建Extractor
    pub fn create_extractor<T>(&self, system_prompt: &str, config: &LLMConfig) -> ProviderExtractor<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let model = config.effective_model();
        match self {
            ProviderClient::OpenAI(client) => {
                let extractor = client
                    .extractor_completions_api::<T>(&model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::OpenAI(extractor)
            }
            ProviderClient::Groq(client) => {
                let extractor = client
                    .extractor::<T>(&model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::Groq(extractor)
            }
            ProviderClient::Anthropic(client) => {
                let extractor = client
                    .extractor::<T>(&model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::Anthropic(extractor)
            }
        }
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    Groq(Agent<rig::providers::groq::CompletionModel<reqwest::Client>>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Groq(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
        }
    }

    /// 执行多轮对话，允许模型在轮次之间调用工具
    pub async fn multi_turn(&self, prompt: &str, max_turns: usize) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
            ProviderAgent::Groq(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
        }
    }
}

/// 统一的Extractor枚举
pub enum ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    OpenAI(Extractor<rig::providers::openai::CompletionModel, T>),
    Groq(Extractor<rig::providers::groq::CompletionModel<reqwest::Client>, T>),
    Anthropic(Extractor<rig::providers::anthropic::completion::CompletionModel, T>),
}

impl<T> ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    /// 执行提取
    pub async fn extract(&self, prompt: &str) -> Result<T> {
        match self {
            ProviderExtractor::OpenAI(extractor) => {
                extractor.extract(prompt).await.map_err(|e| e.into())
            }
            ProviderExtractor::Groq(extractor) => {
                extractor.extract(prompt).await.map_err(|e| e.into())
            }
            ProviderExtractor::Anthropic(extractor) => {
                extractor.extract(prompt).await.map_err(|e| e.into())
            }
        }
    }
}
