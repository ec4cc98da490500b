//! Agent crew 抽象
//!
//! 一个 crew 由若干 agent 与按顺序执行的 task 组成，接收命名输入变量，
//! 返回原始文本以及可选的结构化结果。

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// crew 的命名输入变量
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrewInputs(BTreeMap<String, String>);

impl CrewInputs {
    pub fn new(variables: BTreeMap<String, String>) -> Self {
        Self(variables)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// 将模板中的 `{name}` 占位符替换为同名变量；未知占位符保持原样
    pub fn interpolate(&self, template: &str) -> String {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            output.push_str(&rest[..start]);
            let candidate = &rest[start + 1..];
            match candidate.find('}') {
                Some(end) if self.0.contains_key(&candidate[..end]) => {
                    output.push_str(&self.0[&candidate[..end]]);
                    rest = &candidate[end + 1..];
                }
                _ => {
                    output.push('{');
                    rest = candidate;
                }
            }
        }
        output.push_str(rest);
        output
    }
}

impl From<BTreeMap<String, String>> for CrewInputs {
    fn from(variables: BTreeMap<String, String>) -> Self {
        Self::new(variables)
    }
}

/// crew 执行结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrewOutput {
    /// 最后一个 task 的原始文本输出
    pub raw: String,
    /// 结构化输出（如果最后一个 task 声明了输出结构）
    pub structured: Option<Value>,
}

impl CrewOutput {
    pub fn raw(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            structured: None,
        }
    }

    pub fn structured(raw: impl Into<String>, structured: Value) -> Self {
        Self {
            raw: raw.into(),
            structured: Some(structured),
        }
    }

    /// 解析为指定结构。优先使用结构化输出，否则把原始文本当作 JSON 解析
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        if let Some(value) = &self.structured {
            return serde_json::from_value(value.clone())
                .context("structured crew output does not match the expected schema");
        }

        serde_json::from_str(strip_code_fence(&self.raw))
            .context("raw crew output is not valid JSON for the expected schema")
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// 外部 agent crew 的调用边界
#[async_trait]
pub trait Crew: Send + Sync {
    fn name(&self) -> &str;

    async fn kickoff(&self, inputs: &CrewInputs) -> Result<CrewOutput>;
}

/// agent 定义
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl AgentSpec {
    pub fn system_prompt(&self, inputs: &CrewInputs) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            inputs.interpolate(self.role),
            inputs.interpolate(self.backstory),
            inputs.interpolate(self.goal)
        )
    }
}

/// task 定义
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub description: &'static str,
    pub expected_output: &'static str,
}

impl TaskSpec {
    /// 构造 task 的用户提示词，`context` 为前序 task 的输出
    pub fn user_prompt(&self, inputs: &CrewInputs, context: &[&str]) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\nyou MUST return the actual complete content as the final answer, not a summary.",
            inputs.interpolate(self.description),
            inputs.interpolate(self.expected_output)
        );

        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(&context.join("\n\n----------\n\n"));
        }
        prompt
    }
}
