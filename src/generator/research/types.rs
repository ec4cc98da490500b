use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 教学计划中的一个章节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    /// 章节标题
    pub title: String,
    /// 本章的高层目标
    pub high_level_goal: String,
    /// 本章为什么重要
    pub why_important: String,
    /// 参考资料
    pub sources: Vec<String>,
    /// 内容大纲
    pub content_outline: Vec<String>,
}

/// 研究阶段产出的教学计划
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EducationalPlan {
    pub sections: Vec<Section>,
}
