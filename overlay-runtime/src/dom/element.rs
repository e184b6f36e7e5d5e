//! # Element 模块
//!
//! 元素数据与样式目标接口。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单条样式声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDeclaration {
    /// 样式值
    pub value: String,
    /// 是否为最高优先级（important）
    #[serde(default)]
    pub important: bool,
}

/// 效果施加的目标
///
/// 效果只通过这组操作改变元素的视觉状态。
/// 默认实现是 [`ElementData`]；真实渲染后端可以为自己的节点类型实现此 trait。
pub trait StyleTarget {
    /// 是否带有指定样式标记
    fn has_class(&self, class: &str) -> bool;

    /// 添加样式标记（已存在时不重复添加）
    fn add_class(&mut self, class: &str);

    /// 移除样式标记
    fn remove_class(&mut self, class: &str);

    /// 读取属性
    fn attribute(&self, name: &str) -> Option<&str>;

    /// 设置属性
    fn set_attribute(&mut self, name: &str, value: &str);

    /// 移除属性
    fn remove_attribute(&mut self, name: &str);

    /// 设置样式声明
    fn set_style(&mut self, property: &str, value: &str, important: bool);

    /// 移除样式声明
    fn remove_style(&mut self, property: &str);

    /// 强制布局刷新
    ///
    /// 保证随后的样式变化被视为新的过渡，即使前后视觉状态相同。
    fn force_layout(&mut self);
}

/// 元素自身的数据（不含子节点）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementData {
    /// 标签名
    #[serde(default = "default_tag")]
    pub tag: String,
    /// 元素 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 样式标记（有序、无重复）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// 属性
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// 样式声明
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, StyleDeclaration>,
    /// 文本内容
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// 已执行的布局刷新次数
    #[serde(skip)]
    pub layout_passes: u64,
}

fn default_tag() -> String {
    "div".to_string()
}

impl ElementData {
    /// 创建指定标签的空元素
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// 元素 id（未设置时为空字符串）
    pub fn element_id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// 读取样式声明的值
    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(|decl| decl.value.as_str())
    }
}

impl StyleTarget for ElementData {
    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    fn set_style(&mut self, property: &str, value: &str, important: bool) {
        self.style.insert(
            property.to_string(),
            StyleDeclaration {
                value: value.to_string(),
                important,
            },
        );
    }

    fn remove_style(&mut self, property: &str) {
        self.style.remove(property);
    }

    fn force_layout(&mut self) {
        self.layout_passes += 1;
    }
}
