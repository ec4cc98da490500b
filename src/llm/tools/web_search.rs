//! 网络搜索工具（Serper）

use rig::tool::Tool;
use serde::{Deserialize, Serialize};

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// 网络搜索工具
#[derive(Debug, Clone)]
pub struct AgentToolWebSearch {
    http: reqwest::Client,
    api_key: String,
    max_results: usize,
}

/// 搜索参数
#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

/// 单条搜索结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// 搜索结果
#[derive(Debug, Serialize)]
pub struct WebSearchResult {
    pub query: String,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// 搜索工具错误
#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    #[error("web search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("web search returned status {0}")]
    Status(reqwest::StatusCode),
}

impl AgentToolWebSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            max_results: 8,
        }
    }

    /// 从 SERPER_API_KEY 环境变量创建，未设置时返回 None
    pub fn from_env() -> Option<Self> {
        std::env::var("SERPER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    async fn search(&self, query: &str) -> Result<WebSearchResult, WebSearchError> {
        let response = self
            .http
            .post(SERPER_ENDPOINT)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WebSearchError::Status(response.status()));
        }

        let body: SerperResponse = response.json().await?;
        let results = body.organic.into_iter().take(self.max_results).collect();

        Ok(WebSearchResult {
            query: query.to_string(),
            results,
        })
    }
}

impl Tool for AgentToolWebSearch {
    const NAME: &'static str = "web_search";

    type Error = WebSearchError;
    type Args = WebSearchArgs;
    type Output = WebSearchResult;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web and return the most relevant pages with title, link and snippet."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        tracing::debug!(query = %args.query, "🔧 tool called...web_search");
        self.search(&args.query).await
    }
}
