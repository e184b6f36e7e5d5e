//! # Controller 模块
//!
//! 单个受控元素的效果控制器，拥有该元素的全部阶段。

use std::collections::BTreeMap;

use crate::declaration::{self, StageDeclaration};
use crate::diagnostic::DiagnosticResult;
use crate::dom::StyleTarget;
use crate::effect::{ACTIVE_EFFECT_ATTRIBUTE, Effect};
use crate::error::{ProtocolError, SpecificationError};
use crate::scheduler::Scheduler;
use crate::stage::{Stage, VARIABLE_STAGE};

/// 受控元素的样式标记
pub const ANIMATED_CLASS_SELECTOR: &str = "js-animate";

/// 携带阶段声明的属性
pub const ANIMATIONS_ATTRIBUTE: &str = "data-animations";

/// 元素效果控制器
///
/// 在模板初始化时由元素的声明构建一次，此后不再重建。
#[derive(Debug, Clone)]
pub struct ElementController {
    element: String,
    stages: BTreeMap<u32, Stage>,
}

impl ElementController {
    /// 解析元素的 `data-animations` 属性值
    pub fn parse(
        element: &str,
        source: &str,
        strict_stage_zero: bool,
        diagnostics: &mut DiagnosticResult,
    ) -> Result<Self, SpecificationError> {
        let declarations = declaration::parse_stages(element, source)?;
        Self::from_declarations(element, declarations, strict_stage_zero, diagnostics)
    }

    /// 从已解析的阶段声明构建
    ///
    /// 阶段 id 重复时返回 [`SpecificationError::DuplicateStage`]。
    pub fn from_declarations(
        element: &str,
        declarations: Vec<StageDeclaration>,
        strict_stage_zero: bool,
        diagnostics: &mut DiagnosticResult,
    ) -> Result<Self, SpecificationError> {
        let mut stages = BTreeMap::new();
        for declaration in declarations {
            let stage =
                Stage::from_declaration(element, declaration, strict_stage_zero, diagnostics)?;
            if stages.contains_key(&stage.id()) {
                return Err(SpecificationError::DuplicateStage {
                    element: element.to_string(),
                    stage: stage.id(),
                });
            }
            stages.insert(stage.id(), stage);
        }

        Ok(Self {
            element: element.to_string(),
            stages,
        })
    }

    /// 元素 id
    pub fn element(&self) -> &str {
        &self.element
    }

    /// 获取阶段
    pub fn stage(&self, stage_id: u32) -> Option<&Stage> {
        self.stages.get(&stage_id)
    }

    /// 所有阶段 id（升序）
    pub fn stage_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.stages.keys().copied()
    }

    /// 播放指定阶段；元素没有该阶段时什么也不做
    pub fn play(&self, stage_id: u32, scheduler: &mut Scheduler) -> Result<(), ProtocolError> {
        match self.stages.get(&stage_id) {
            Some(stage) => stage.play(&self.element, scheduler),
            None => Ok(()),
        }
    }

    /// 预取指定阶段的效果 id；元素没有该阶段时什么也不做
    pub fn prepare_play(&self, stage_id: u32, scheduler: &mut Scheduler) {
        if let Some(stage) = self.stages.get(&stage_id) {
            stage.prepare_play(scheduler);
        }
    }

    /// 查找效果：先查 `stage_id`，找不到时回退到阶段 0
    ///
    /// 变量触发的效果总在阶段 0 中，因此无论当前处于哪个阶段都能找到。
    pub fn resolve_effect(&self, stage_id: u32, effect_id: &str) -> Option<&Effect> {
        self.stages
            .get(&stage_id)
            .and_then(|stage| stage.effect(effect_id))
            .or_else(|| {
                self.stages
                    .get(&VARIABLE_STAGE)
                    .and_then(|stage| stage.effect(effect_id))
            })
    }

    /// 处理活动元素的过渡完成信号
    ///
    /// 根据元素上记录的活动效果 id 找到刚完成的效果并撤销它，返回该效果 id。
    /// 元素上没有活动效果、或效果无法解析时返回 `None`。
    pub fn complete_transition<T: StyleTarget + ?Sized>(
        &self,
        stage_id: u32,
        target: &mut T,
    ) -> Option<String> {
        let finished = target
            .attribute(ACTIVE_EFFECT_ATTRIBUTE)
            .filter(|id| !id.is_empty())?
            .to_string();

        match self.resolve_effect(stage_id, &finished) {
            Some(effect) => {
                effect.clear(target);
                Some(finished)
            }
            None => {
                tracing::warn!(
                    element = %self.element,
                    effect = %finished,
                    stage = stage_id,
                    "完成信号对应的效果在当前阶段和阶段 0 中都不存在"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementData;

    const SOURCE: &str = r#"[
        {"id": 1, "effects": [
            {"id": "in", "tags": ["fade-in"]},
            {"id": "pulse", "tags": ["pulse"]}
        ]},
        {"id": 0, "effects": [
            {"id": "flash", "after": "$score", "tags": ["flash"]}
        ]}
    ]"#;

    fn controller() -> ElementController {
        ElementController::parse("title", SOURCE, false, &mut DiagnosticResult::new()).unwrap()
    }

    #[test]
    fn test_parse_stages() {
        let c = controller();
        assert_eq!(c.element(), "title");
        assert_eq!(c.stage_ids().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(c.stage(1).unwrap().effects().len(), 2);
    }

    #[test]
    fn test_duplicate_stage() {
        let source = r#"[{"id": 1, "effects": []}, {"id": 1, "effects": []}]"#;
        let err = ElementController::parse("title", source, false, &mut DiagnosticResult::new())
            .unwrap_err();
        assert_eq!(
            err,
            SpecificationError::DuplicateStage {
                element: "title".to_string(),
                stage: 1
            }
        );
    }

    #[test]
    fn test_missing_stage_is_noop() {
        let c = controller();
        let mut scheduler = Scheduler::new(false);
        c.prepare_play(7, &mut scheduler);
        c.play(7, &mut scheduler).unwrap();
        assert_eq!(scheduler.animation_count(), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_resolve_falls_back_to_stage_zero() {
        let c = controller();
        assert_eq!(c.resolve_effect(1, "in").unwrap().id(), "in");
        assert_eq!(c.resolve_effect(3, "flash").unwrap().id(), "flash");
        assert!(c.resolve_effect(3, "in").is_none());
    }

    #[test]
    fn test_complete_transition_clears_effect() {
        let c = controller();
        let mut data = ElementData::new("div");
        let effect = c.resolve_effect(1, "in").unwrap();
        effect.play(&mut data);

        assert_eq!(c.complete_transition(1, &mut data), Some("in".to_string()));
        assert!(!data.has_class("fade-in"));
        assert_eq!(data.attribute(ACTIVE_EFFECT_ATTRIBUTE), None);

        // 没有活动效果
        assert_eq!(c.complete_transition(1, &mut data), None);
    }
}
