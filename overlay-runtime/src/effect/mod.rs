//! # Effect 模块
//!
//! 单个视觉过渡效果的不可变描述：要切换的样式标记、细节覆盖、可选的前置引用。
//!
//! ## 前置引用
//!
//! | `after` | [`Predecessor`] | 触发来源 |
//! |---------|-----------------|----------|
//! | 缺省 | - | 同阶段上一个效果完成（或立即） |
//! | `"intro"` | `Effect("intro")` | 效果 `intro` 完成 |
//! | `"$score"` | `Variable("score")` | 变量 `score` 被更新 |

mod details;

pub use details::{Details, defaults};

use crate::declaration::EffectDeclaration;
use crate::dom::StyleTarget;
use crate::error::SpecificationError;

/// 初始隐藏标记，首次播放时移除
pub const INITIALLY_HIDDEN_TAG: &str = "initially-invisible";

/// 记录当前正在进行的效果 id 的属性
pub const ACTIVE_EFFECT_ATTRIBUTE: &str = "data-active-animation";

/// 变量前置引用的前缀
pub const VARIABLE_SENTINEL: char = '$';

/// 前置引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predecessor {
    /// 等待另一个效果完成
    Effect(String),
    /// 等待变量更新
    Variable(String),
}

impl Predecessor {
    /// 解析 `after` 字段；空引用返回 `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.strip_prefix(VARIABLE_SENTINEL) {
            Some("") => None,
            Some(variable) => Some(Self::Variable(variable.to_string())),
            None if raw.is_empty() => None,
            None => Some(Self::Effect(raw.to_string())),
        }
    }

    /// 被引用的 id（不含前缀）
    pub fn id(&self) -> &str {
        match self {
            Self::Effect(id) | Self::Variable(id) => id,
        }
    }
}

/// 视觉效果
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    id: String,
    after: Option<Predecessor>,
    tags: Vec<String>,
    details: Details,
}

impl Effect {
    /// 从声明构建效果
    ///
    /// # 参数
    ///
    /// - `element`: 所属元素 id（用于错误信息）
    /// - `declaration`: 效果声明
    /// - `fallback_id`: 声明未给出 id 时使用的自动 id
    pub fn from_declaration(
        element: &str,
        declaration: EffectDeclaration,
        fallback_id: impl FnOnce() -> String,
    ) -> Result<Self, SpecificationError> {
        let id = match declaration.id {
            Some(id) if !id.is_empty() => id,
            _ => fallback_id(),
        };

        if let Some(tag) = declaration
            .tags
            .iter()
            .find(|tag| tag.is_empty() || tag.chars().any(char::is_whitespace))
        {
            return Err(SpecificationError::InvalidTag {
                element: element.to_string(),
                effect: id,
                tag: tag.clone(),
            });
        }

        let after = match declaration.after {
            Some(raw) => Some(Predecessor::parse(&raw).ok_or_else(|| {
                SpecificationError::InvalidPredecessor {
                    element: element.to_string(),
                    effect: id.clone(),
                    after: raw.clone(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            id,
            after,
            tags: declaration.tags,
            details: Details::from(declaration.details),
        })
    }

    /// 效果 id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 前置引用
    pub fn after(&self) -> Option<&Predecessor> {
        self.after.as_ref()
    }

    /// 是否声明了前置引用
    pub fn is_dependent(&self) -> bool {
        self.after.is_some()
    }

    /// 是否依赖另一个效果
    pub fn is_effect_dependent(&self) -> bool {
        matches!(self.after, Some(Predecessor::Effect(_)))
    }

    /// 是否依赖变量更新
    pub fn is_variable_dependent(&self) -> bool {
        matches!(self.after, Some(Predecessor::Variable(_)))
    }

    /// 把效果施加到目标上
    ///
    /// 前后各刷新一次布局，保证即使目标之前的视觉状态相同，过渡也会重新开始。
    pub fn play<T: StyleTarget + ?Sized>(&self, target: &mut T) {
        target.force_layout();

        target.remove_class(INITIALLY_HIDDEN_TAG);
        for tag in &self.tags {
            target.add_class(tag);
        }
        target.set_attribute(ACTIVE_EFFECT_ATTRIBUTE, &self.id);
        self.details.apply_on(target);

        target.force_layout();
    }

    /// 撤销效果，使目标回到可重放的基线
    ///
    /// 只有施加前不带初始隐藏标记、也不带本效果任何标记的目标能精确还原：
    /// `play` 移除的 [`INITIALLY_HIDDEN_TAG`] 不会被恢复，
    /// 施加前已存在的同名标记也会随本效果一起被移除。
    pub fn clear<T: StyleTarget + ?Sized>(&self, target: &mut T) {
        for tag in &self.tags {
            target.remove_class(tag);
        }
        target.remove_attribute(ACTIVE_EFFECT_ATTRIBUTE);
        self.details.remove_from(target);

        target.force_layout();
    }
}
