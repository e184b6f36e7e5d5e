//! # 内置变量模块

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use super::VariableModule;
use crate::dom::{ElementData, StyleTarget};

/// 格式占位符
const PLACEHOLDER: &str = "{}";

/// 标量值的文本形式（字符串不带引号）
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 用更新值整体替换元素的文本内容
#[derive(Debug, Default)]
pub struct ReplaceContents;

impl VariableModule for ReplaceContents {
    fn initialize(&mut self, args: &Value) -> Result<(), String> {
        if !args.is_null() {
            warn!("ReplaceContents 模块不接受参数");
        }
        Ok(())
    }

    fn update(&mut self, target: &mut ElementData, value: &Value) {
        target.text = match scalar_text(value) {
            Some(text) => text,
            None => {
                warn!(element = %target.element_id(), "ReplaceContents 模块收到非字符串更新数据");
                value.to_string()
            }
        };
    }
}

/// 用更新值设置元素属性
///
/// 更新值是 `属性名 → 值` 的对象。模块参数可以为属性预定义格式，
/// 格式中的 `{}` 依次被值（或值数组中的各项）替换。
#[derive(Debug, Default)]
pub struct ChangeAttribute {
    formats: BTreeMap<String, String>,
}

impl ChangeAttribute {
    fn format(&self, attribute: &str, value: &Value) -> Option<String> {
        let Some(format) = self.formats.get(attribute) else {
            return match scalar_text(value) {
                Some(text) => Some(text),
                None => {
                    warn!(
                        attribute = %attribute,
                        "ChangeAttribute 收到非平凡属性值，但没有预定义格式"
                    );
                    None
                }
            };
        };

        let text = |v: &Value| scalar_text(v).unwrap_or_else(|| v.to_string());
        let values: Vec<String> = match value {
            Value::Array(items) => items.iter().map(text).collect(),
            other => vec![text(other)],
        };

        // 只在已替换部分之后查找占位符，替换值中的 `{}` 原样保留
        let mut content = format.clone();
        let mut offset = 0;
        for replacement in values {
            match content[offset..].find(PLACEHOLDER) {
                Some(index) => {
                    let start = offset + index;
                    content.replace_range(start..start + PLACEHOLDER.len(), &replacement);
                    offset = start + replacement.len();
                }
                None => {
                    warn!(attribute = %attribute, "ChangeAttribute 更新值数量多于格式占位符");
                    break;
                }
            }
        }
        if content[offset..].contains(PLACEHOLDER) {
            warn!(attribute = %attribute, "ChangeAttribute 更新值数量少于格式占位符");
        }
        Some(content)
    }
}

impl VariableModule for ChangeAttribute {
    fn initialize(&mut self, args: &Value) -> Result<(), String> {
        let Value::Object(args) = args else {
            if !args.is_null() {
                warn!("ChangeAttribute 模块参数不是对象，已忽略");
            }
            return Ok(());
        };

        for (attribute, format) in args {
            match scalar_text(format) {
                Some(format) => {
                    self.formats.insert(attribute.clone(), format);
                }
                None => warn!(attribute = %attribute, "ChangeAttribute 参数包含非平凡的属性格式"),
            }
        }
        Ok(())
    }

    fn update(&mut self, target: &mut ElementData, value: &Value) {
        let Value::Object(attributes) = value else {
            warn!(element = %target.element_id(), "ChangeAttribute 模块收到非对象更新数据");
            return;
        };

        for (attribute, value) in attributes {
            if attribute.is_empty() || attribute.chars().any(char::is_whitespace) {
                warn!(attribute = %attribute, "ChangeAttribute 更新数据包含无效属性名");
                continue;
            }
            if let Some(content) = self.format(attribute, value) {
                target.set_attribute(attribute, &content);
            }
        }
    }
}
