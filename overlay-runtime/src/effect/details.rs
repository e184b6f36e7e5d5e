//! # Details
//!
//! 效果的细节覆盖（延迟、时长、时间曲线、变换原点）及其默认值。
//! 细节以最高优先级（important）写入元素样式。

use crate::declaration::DetailsDeclaration;
use crate::dom::StyleTarget;

/// 各细节的默认值
///
/// 这些常量是细节默认值的**唯一来源**。
pub mod defaults {
    /// 默认时长
    pub const DURATION: &str = "500ms";
}

/// 细节项到样式属性的映射
const DELAY_PROPERTIES: &[&str] = &["-webkit-animation-delay", "animation-delay"];
const DURATION_PROPERTIES: &[&str] = &[
    "-webkit-animation-duration",
    "animation-duration",
    "-webkit-transition-duration",
    "transition-duration",
];
const TIMING_PROPERTIES: &[&str] = &[
    "-webkit-animation-timing-function",
    "animation-timing-function",
];
const ORIGIN_PROPERTIES: &[&str] = &["-webkit-transform-origin", "transform-origin"];

/// 细节覆盖
#[derive(Debug, Clone, PartialEq)]
pub struct Details {
    /// 延迟
    pub delay: Option<String>,
    /// 时长（默认 [`defaults::DURATION`]）
    pub duration: Option<String>,
    /// 时间曲线
    pub timing: Option<String>,
    /// 变换原点
    pub origin: Option<String>,
}

impl Default for Details {
    fn default() -> Self {
        Self {
            delay: None,
            duration: Some(defaults::DURATION.to_string()),
            timing: None,
            origin: None,
        }
    }
}

impl From<Option<DetailsDeclaration>> for Details {
    fn from(declaration: Option<DetailsDeclaration>) -> Self {
        let Some(declaration) = declaration else {
            return Self::default();
        };
        Self {
            delay: declaration.delay,
            duration: declaration
                .duration
                .or_else(|| Some(defaults::DURATION.to_string())),
            timing: declaration.timing,
            origin: declaration.origin,
        }
    }
}

impl Details {
    /// 已设置的 (样式属性列表, 值) 组合
    fn entries(&self) -> impl Iterator<Item = (&'static [&'static str], &str)> {
        [
            (DELAY_PROPERTIES, self.delay.as_deref()),
            (DURATION_PROPERTIES, self.duration.as_deref()),
            (TIMING_PROPERTIES, self.timing.as_deref()),
            (ORIGIN_PROPERTIES, self.origin.as_deref()),
        ]
        .into_iter()
        .filter_map(|(properties, value)| value.map(|v| (properties, v)))
    }

    /// 所有被覆盖的样式属性名
    pub fn properties(&self) -> Vec<&'static str> {
        self.entries()
            .flat_map(|(properties, _)| properties.iter().copied())
            .collect()
    }

    /// 把细节写入目标
    pub fn apply_on<T: StyleTarget + ?Sized>(&self, target: &mut T) {
        for (properties, value) in self.entries() {
            for property in properties {
                target.set_style(property, value, true);
            }
        }
    }

    /// 从目标上撤销细节
    pub fn remove_from<T: StyleTarget + ?Sized>(&self, target: &mut T) {
        for (properties, _) in self.entries() {
            for property in properties {
                target.remove_style(property);
            }
        }
    }
}
