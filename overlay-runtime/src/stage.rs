//! # Stage 模块
//!
//! 同一元素上共享阶段 id 的有序效果组。
//!
//! ## 播放规则
//!
//! 按声明顺序遍历效果，维护"上一个效果 id"游标：
//!
//! - 无 `after`：有上一个效果时挂接到它的完成信号上（默认链），否则立即启动
//! - `after` 指向效果：挂接到该效果上，**完全取代**默认链
//! - `after` 指向变量：挂接到持久的变量依赖上
//!
//! 阶段 0 保留给变量触发的效果。

use crate::declaration::StageDeclaration;
use crate::diagnostic::DiagnosticResult;
use crate::effect::{Effect, Predecessor};
use crate::error::{ProtocolError, SpecificationError};
use crate::scheduler::{EffectTrigger, Scheduler};

/// 变量专用阶段的 id
pub const VARIABLE_STAGE: u32 = 0;

/// 效果阶段
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    id: u32,
    effects: Vec<Effect>,
}

impl Stage {
    /// 从声明构建阶段
    ///
    /// # 参数
    ///
    /// - `element`: 所属元素 id
    /// - `declaration`: 阶段声明
    /// - `strict_stage_zero`: 阶段 0 中出现非变量效果时是否视为致命错误
    /// - `diagnostics`: 非致命问题的收集处
    ///
    /// 非严格模式下，阶段 0 中的非变量效果被记录为警告并丢弃。
    pub fn from_declaration(
        element: &str,
        declaration: StageDeclaration,
        strict_stage_zero: bool,
        diagnostics: &mut DiagnosticResult,
    ) -> Result<Self, SpecificationError> {
        let id = u32::try_from(declaration.id).map_err(|_| SpecificationError::InvalidStageId {
            element: element.to_string(),
            id: declaration.id,
        })?;

        let mut effects: Vec<Effect> = Vec::with_capacity(declaration.effects.len());
        for (index, effect) in declaration.effects.into_iter().enumerate() {
            let effect = Effect::from_declaration(element, effect, || {
                format!("_{element}.{id}.{index}")
            })?;

            if id == VARIABLE_STAGE && !effect.is_variable_dependent() {
                if strict_stage_zero {
                    return Err(SpecificationError::StageZeroEffect {
                        element: element.to_string(),
                        effect: effect.id().to_string(),
                    });
                }
                diagnostics.warn(
                    element,
                    format!(
                        "阶段 0 只用于变量触发的效果，已忽略非变量效果 '{}'",
                        effect.id()
                    ),
                );
                continue;
            }

            if effects.iter().any(|e| e.id() == effect.id()) {
                return Err(SpecificationError::DuplicateEffect {
                    element: element.to_string(),
                    effect: effect.id().to_string(),
                });
            }
            effects.push(effect);
        }

        Ok(Self { id, effects })
    }

    /// 阶段 id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// 效果（声明顺序）
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// 按 id 查找效果
    pub fn effect(&self, id: &str) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id() == id)
    }

    /// 预取本阶段所有效果 id
    ///
    /// 与效果本轮是否会启动无关：其他元素的效果可能引用这里的 id。
    pub fn prepare_play(&self, scheduler: &mut Scheduler) {
        for effect in &self.effects {
            scheduler.register_animation(effect.id());
        }
    }

    /// 启动或排队本阶段的效果
    pub fn play(&self, element: &str, scheduler: &mut Scheduler) -> Result<(), ProtocolError> {
        self.prepare_play(scheduler);

        let mut previous: Option<&str> = None;
        for effect in &self.effects {
            let trigger = EffectTrigger::new(element, self.id, effect.id());
            match (effect.after(), previous) {
                (Some(Predecessor::Variable(variable)), _) => {
                    scheduler.register_variable_dependency(variable, trigger)?;
                }
                (Some(Predecessor::Effect(target)), _) => {
                    scheduler.register_animation_dependency(target, trigger)?;
                }
                (None, Some(previous)) => {
                    scheduler.register_animation_dependency(previous, trigger)?;
                }
                (None, None) => scheduler.fire(trigger),
            }
            previous = Some(effect.id());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::EffectDeclaration;

    fn decl(id: Option<&str>, after: Option<&str>) -> EffectDeclaration {
        EffectDeclaration {
            id: id.map(str::to_string),
            after: after.map(str::to_string),
            tags: vec!["fx".to_string()],
            details: None,
        }
    }

    fn stage(id: i64, effects: Vec<EffectDeclaration>) -> Stage {
        Stage::from_declaration(
            "box",
            StageDeclaration { id, effects },
            false,
            &mut DiagnosticResult::new(),
        )
        .unwrap()
    }

    fn drain(scheduler: &mut Scheduler) -> Vec<String> {
        std::iter::from_fn(|| scheduler.next_ready())
            .map(|t| t.effect)
            .collect()
    }

    #[test]
    fn test_invalid_stage_id() {
        let err = Stage::from_declaration(
            "box",
            StageDeclaration {
                id: -1,
                effects: vec![],
            },
            false,
            &mut DiagnosticResult::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecificationError::InvalidStageId {
                element: "box".to_string(),
                id: -1
            }
        );
    }

    #[test]
    fn test_auto_ids_are_unique_per_element() {
        let s = stage(2, vec![decl(None, None), decl(None, None)]);
        let ids: Vec<_> = s.effects().iter().map(Effect::id).collect();
        assert_eq!(ids, vec!["_box.2.0", "_box.2.1"]);
    }

    #[test]
    fn test_duplicate_effect_id() {
        let err = Stage::from_declaration(
            "box",
            StageDeclaration {
                id: 1,
                effects: vec![decl(Some("a"), None), decl(Some("a"), None)],
            },
            false,
            &mut DiagnosticResult::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SpecificationError::DuplicateEffect { .. }));
    }

    #[test]
    fn test_stage_zero_policy() {
        let mut diagnostics = DiagnosticResult::new();
        let s = Stage::from_declaration(
            "box",
            StageDeclaration {
                id: 0,
                effects: vec![decl(Some("free"), None), decl(Some("flash"), Some("$score"))],
            },
            false,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(diagnostics.warn_count(), 1);
        assert_eq!(s.effects().len(), 1);
        assert_eq!(s.effects()[0].id(), "flash");

        let err = Stage::from_declaration(
            "box",
            StageDeclaration {
                id: 0,
                effects: vec![decl(Some("free"), None)],
            },
            true,
            &mut DiagnosticResult::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SpecificationError::StageZeroEffect { .. }));
    }

    #[test]
    fn test_default_chain() {
        let s = stage(
            1,
            vec![decl(Some("a"), None), decl(Some("b"), None), decl(Some("c"), None)],
        );
        let mut scheduler = Scheduler::new(false);
        s.play("box", &mut scheduler).unwrap();

        assert_eq!(drain(&mut scheduler), vec!["a"]);
        scheduler.trigger_animation_dependencies("a").unwrap();
        assert_eq!(drain(&mut scheduler), vec!["b"]);
        scheduler.trigger_animation_dependencies("b").unwrap();
        assert_eq!(drain(&mut scheduler), vec!["c"]);
    }

    #[test]
    fn test_explicit_after_overrides_chain() {
        let s = stage(
            1,
            vec![
                decl(Some("a"), None),
                decl(Some("b"), None),
                decl(Some("c"), Some("a")),
            ],
        );
        let mut scheduler = Scheduler::new(false);
        s.play("box", &mut scheduler).unwrap();
        assert_eq!(drain(&mut scheduler), vec!["a"]);

        scheduler.trigger_animation_dependencies("a").unwrap();
        assert_eq!(drain(&mut scheduler), vec!["b", "c"]);
        assert_eq!(scheduler.animation_dependents("b"), Some(0));
    }

    #[test]
    fn test_forward_reference_resolves_through_prefetch() {
        // "a" 等待声明在后面的 "b"
        let s = stage(1, vec![decl(Some("a"), Some("b")), decl(Some("b"), Some("$go"))]);
        let mut scheduler = Scheduler::new(false);
        scheduler.register_variable("go");
        s.play("box", &mut scheduler).unwrap();
        assert_eq!(scheduler.pending(), 0);

        scheduler.trigger_variable_dependencies("go").unwrap();
        assert_eq!(drain(&mut scheduler), vec!["b"]);
        scheduler.trigger_animation_dependencies("b").unwrap();
        assert_eq!(drain(&mut scheduler), vec!["a"]);
    }

    #[test]
    fn test_unknown_predecessor_is_protocol_error() {
        let s = stage(1, vec![decl(Some("a"), Some("nowhere"))]);
        let mut scheduler = Scheduler::new(false);
        assert_eq!(
            s.play("box", &mut scheduler),
            Err(ProtocolError::UnregisteredAnimation {
                id: "nowhere".to_string()
            })
        );
    }
}
