//! # Declaration 模块
//!
//! 元素上 `data-animations` 属性的声明格式。
//!
//! ```json
//! [
//!   { "id": 1, "effects": [
//!       { "id": "title-in", "tags": ["fade-in"], "details": { "duration": "1s" } },
//!       { "after": "title-in", "tags": ["pulse"] }
//!   ] },
//!   { "id": 0, "effects": [
//!       { "after": "$score", "tags": ["flash"] }
//!   ] }
//! ]
//! ```
//!
//! 兼容旧写法：`animations` 等价于 `effects`，`classes` 等价于 `tags`。

use serde::{Deserialize, Serialize};

use crate::error::SpecificationError;

/// 阶段声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDeclaration {
    /// 阶段 id（必须 >= 0）
    pub id: i64,
    /// 效果列表（声明顺序即默认链顺序）
    #[serde(alias = "animations")]
    pub effects: Vec<EffectDeclaration>,
}

/// 效果声明
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectDeclaration {
    /// 效果 id，缺省时自动生成
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 前置引用：效果 id，或以 `$` 开头的变量 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// 要施加的样式标记
    #[serde(alias = "classes")]
    pub tags: Vec<String>,
    /// 细节覆盖
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<DetailsDeclaration>,
}

/// 细节覆盖声明
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailsDeclaration {
    /// 延迟
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    /// 时长
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// 时间曲线
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    /// 变换原点
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// 解析元素的阶段声明列表
///
/// 语法或结构错误统一转换为 [`SpecificationError::Malformed`]，并带上元素 id。
pub fn parse_stages(element: &str, source: &str) -> Result<Vec<StageDeclaration>, SpecificationError> {
    serde_json::from_str(source).map_err(|e| SpecificationError::Malformed {
        element: element.to_string(),
        message: e.to_string(),
    })
}
