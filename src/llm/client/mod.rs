//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::LLMConfig;
use crate::llm::tools::web_search::AgentToolWebSearch;

mod providers;

use providers::ProviderClient;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
    web_search: Option<AgentToolWebSearch>,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        let web_search = AgentToolWebSearch::from_env();
        if web_search.is_none() {
            tracing::info!("未设置 SERPER_API_KEY，研究员将不使用网络搜索");
        }

        tracing::debug!(
            provider = %config.provider,
            model = %config.effective_model(),
            "LLM客户端已创建"
        );

        Ok(Self {
            config,
            client,
            web_search,
        })
    }

    /// 单轮对话
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let agent = self.client.create_agent(system_prompt, &self.config);
        agent.prompt(user_prompt).await
    }

    /// 允许调用网络搜索工具的多轮对话；未配置搜索工具时退化为单轮对话
    pub async fn prompt_with_tools(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let Some(web_search) = &self.web_search else {
            return self.prompt(system_prompt, user_prompt).await;
        };

        let agent = self
            .client
            .create_agent_with_search(system_prompt, &self.config, web_search);
        Ok(agent.multi_turn(user_prompt, self.config.max_turns).await?)
    }

    /// 结构化数据提取
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor = self.client.create_extractor::<T>(system_prompt, &self.config);
        extractor.extract(user_prompt).await
    }
}
