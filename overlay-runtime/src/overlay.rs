//! # Overlay 模块
//!
//! 调度上下文（编排器）：宿主的唯一入口。
//!
//! ## 职责
//!
//! - 持有当前阶段计数器与播放状态
//! - 持有两个依赖目录（通过 [`Scheduler`]）
//! - 持有所有元素效果控制器与变量控制器
//! - 通过 [`ReferenceManager`] 以"替换重启"方式启动效果
//!
//! ## 生命周期
//!
//! ```text
//! from_document() ─► initialize()   阶段 0：挂接所有变量触发的效果，stage_id = 1
//!        │
//!        ├─ play()     清空效果目录 → 预取当前阶段 → 启动/排队
//!        ├─ next()     stage_id += 1 → play()
//!        ├─ update()   转发变量值 → 触发变量依赖
//!        ├─ stop()     仅切换状态
//!        └─ transition_finished(element)   撤销完成的效果 → 触发效果依赖
//! ```
//!
//! 推进阶段不会中止进行中的过渡。

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::controller::{ANIMATED_CLASS_SELECTOR, ANIMATIONS_ATTRIBUTE, ElementController};
use crate::diagnostic::DiagnosticResult;
use crate::dom::{Document, ElementData, Fragment, NodeId, StyleTarget};
use crate::error::{OverlayResult, ReferenceError, SpecificationError};
use crate::reference::ReferenceManager;
use crate::scheduler::{EffectTrigger, Scheduler};
use crate::stage::VARIABLE_STAGE;
use crate::variables::{ModuleRegistry, VARIABLE_CLASS_SELECTOR, VariableController};

/// 播放中时根元素带有的标记
pub const PLAY_TAG: &str = "play";
/// 停止后根元素带有的标记
pub const STOP_TAG: &str = "stop";
/// 调试模式下根元素带有的标记
pub const DEBUG_TAG: &str = "debug";

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// 尚未播放
    Idle,
    /// 播放中
    Playing,
    /// 已停止
    Stopped,
}

/// 调度上下文
#[derive(Debug)]
pub struct Overlay {
    config: OverlayConfig,
    document: Document,
    references: ReferenceManager,
    scheduler: Scheduler,
    /// 元素效果控制器（文档顺序）
    controllers: Vec<ElementController>,
    /// 变量控制器（元素 id → 控制器）
    variables: HashMap<String, VariableController>,
    stage_id: u32,
    state: PlaybackState,
    initialized: bool,
    diagnostics: DiagnosticResult,
}

impl Overlay {
    /// 创建空的调度上下文
    ///
    /// 元素需要通过 `register_*` 手动登记，然后调用 [`initialize`](Self::initialize)。
    pub fn new(document: Document, config: OverlayConfig) -> Self {
        let mut overlay = Self {
            scheduler: Scheduler::new(config.replay_signals),
            config,
            document,
            references: ReferenceManager::new(),
            controllers: Vec::new(),
            variables: HashMap::new(),
            stage_id: VARIABLE_STAGE,
            state: PlaybackState::Idle,
            initialized: false,
            diagnostics: DiagnosticResult::new(),
        };
        if overlay.config.debug
            && let Some(root) = overlay.root_data()
        {
            root.add_class(DEBUG_TAG);
        }
        overlay
    }

    /// 从文档发现所有受控元素并完成初始化
    ///
    /// 先登记变量元素（`js-variable`），再登记效果元素（`js-animate`），
    /// 最后调用 [`initialize`](Self::initialize)。
    pub fn from_document(
        document: Document,
        config: OverlayConfig,
        modules: &ModuleRegistry,
    ) -> OverlayResult<Self> {
        let mut overlay = Self::new(document, config);
        for node in overlay.document.elements_with_class(VARIABLE_CLASS_SELECTOR) {
            overlay.register_variable_element(node, modules)?;
        }
        for node in overlay.document.elements_with_class(ANIMATED_CLASS_SELECTOR) {
            overlay.register_animated_element(node)?;
        }
        overlay.initialize()?;

        info!(
            elements = overlay.controllers.len(),
            variables = overlay.variables.len(),
            warnings = overlay.diagnostics.warn_count(),
            "overlay 初始化完成"
        );
        Ok(overlay)
    }

    /// 挂接阶段 0 的变量触发效果，并把阶段推进到 1
    ///
    /// 只执行一次；重复调用会被忽略。
    pub fn initialize(&mut self) -> OverlayResult<()> {
        if self.initialized {
            warn!("overlay 已经初始化过，忽略重复调用");
            return Ok(());
        }
        self.initialized = true;

        self.scheduler.clear_animation_dependencies();
        for controller in &self.controllers {
            controller.prepare_play(VARIABLE_STAGE, &mut self.scheduler);
        }
        let armed = self
            .controllers
            .iter()
            .try_for_each(|c| c.play(VARIABLE_STAGE, &mut self.scheduler));
        let started = self.run_ready();
        armed?;
        started?;

        self.stage_id = VARIABLE_STAGE + 1;
        Ok(())
    }

    // ========== 元素登记 ==========

    fn element_id_of(&self, node: NodeId, selector: &str) -> OverlayResult<String> {
        self.document
            .try_node(node)?
            .data
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                SpecificationError::MissingElementId {
                    selector: selector.to_string(),
                }
                .into()
            })
    }

    /// 登记一个效果元素
    pub fn register_animated_element(&mut self, node: NodeId) -> OverlayResult<()> {
        let element = self.element_id_of(node, ANIMATED_CLASS_SELECTOR)?;
        if self.controllers.iter().any(|c| c.element() == element) {
            return Err(ReferenceError::DuplicateElement { element }.into());
        }

        let source = self
            .document
            .try_node(node)?
            .data
            .attribute(ANIMATIONS_ATTRIBUTE)
            .ok_or_else(|| SpecificationError::MissingAttribute {
                element: element.clone(),
                attribute: ANIMATIONS_ATTRIBUTE.to_string(),
            })?
            .to_string();
        let controller = ElementController::parse(
            &element,
            &source,
            self.config.strict_stage_zero,
            &mut self.diagnostics,
        )?;

        if !self.references.contains(&element) {
            self.references.register_element(&self.document, node)?;
        }
        debug!(element = %element, stages = controller.stage_ids().count(), "登记效果元素");

        // 初始化之后登记的元素需要单独挂接阶段 0
        if self.initialized {
            controller.play(VARIABLE_STAGE, &mut self.scheduler)?;
        }
        self.controllers.push(controller);
        self.run_ready()
    }

    /// 登记一个变量元素
    pub fn register_variable_element(
        &mut self,
        node: NodeId,
        modules: &ModuleRegistry,
    ) -> OverlayResult<()> {
        let element = self.element_id_of(node, VARIABLE_CLASS_SELECTOR)?;
        if self.variables.contains_key(&element) {
            return Err(ReferenceError::DuplicateElement { element }.into());
        }

        let controller = VariableController::from_element(&self.document.try_node(node)?.data, modules)?;

        if !self.references.contains(&element) {
            self.references.register_element(&self.document, node)?;
        }
        self.scheduler.register_variable(&element);
        debug!(element = %element, module = %controller.module_name(), "登记变量元素");
        self.variables.insert(element, controller);
        Ok(())
    }

    /// 向 `parent` 追加片段，并登记其中的受控元素
    ///
    /// 插入点位于已登记元素内部时，片段同时写入这些元素的规范快照，
    /// 它们重启后片段依然存在。新的效果元素从下一次 [`play`](Self::play) 开始参与调度。
    pub fn insert_fragment(
        &mut self,
        parent: NodeId,
        fragment: &Fragment,
        modules: &ModuleRegistry,
    ) -> OverlayResult<NodeId> {
        let inserted = self.document.append(parent, fragment)?;
        self.references
            .fragment_inserted(&self.document, inserted, fragment)?;
        let subtree: Vec<NodeId> = std::iter::once(inserted)
            .chain(self.document.descendants(inserted))
            .collect();

        let has_class = |doc: &Document, id: NodeId, class: &str| {
            doc.node(id).is_some_and(|node| node.data.has_class(class))
        };
        for &node in &subtree {
            if has_class(&self.document, node, VARIABLE_CLASS_SELECTOR) {
                self.register_variable_element(node, modules)?;
            }
        }
        for &node in &subtree {
            if has_class(&self.document, node, ANIMATED_CLASS_SELECTOR) {
                self.register_animated_element(node)?;
            }
        }
        Ok(inserted)
    }

    // ========== 宿主控制 ==========

    /// 播放当前阶段
    pub fn play(&mut self) -> OverlayResult<()> {
        self.prepare_play();

        let stage = self.stage_id;
        let played = self
            .controllers
            .iter()
            .try_for_each(|c| c.play(stage, &mut self.scheduler));
        let started = self.run_ready();
        played?;
        started
    }

    /// 清空效果目录，预取当前阶段的所有效果 id，并标记为播放中
    fn prepare_play(&mut self) {
        self.clear_animation_dependencies();
        for controller in &self.controllers {
            controller.prepare_play(self.stage_id, &mut self.scheduler);
        }
        self.set_state(PlaybackState::Playing);
    }

    /// 推进到下一阶段并播放
    pub fn next(&mut self) -> OverlayResult<()> {
        self.stage_id += 1;
        info!(stage = self.stage_id, "进入下一阶段");
        self.play()
    }

    /// 更新变量值
    ///
    /// 未知键只记录警告；已知键转发给变量模块后触发该变量的依赖一次。
    pub fn update(&mut self, data: &Map<String, Value>) -> OverlayResult<()> {
        for (key, value) in data {
            let Some(controller) = self.variables.get_mut(key) else {
                self.diagnostics
                    .warn(key, "更新数据中的键不对应任何已登记的变量元素");
                continue;
            };

            let live = self.references.live(key)?;
            controller.update(&mut self.document.try_node_mut(live)?.data, value);
            self.references.refresh_variable_content(&self.document, key)?;

            let fired = self.scheduler.trigger_variable_dependencies(key)?;
            debug!(variable = %key, fired, "变量已更新");
            self.run_ready()?;
        }
        Ok(())
    }

    /// 以未解析的载荷更新变量；非对象载荷只记录警告
    pub fn update_payload(&mut self, payload: &Value) -> OverlayResult<()> {
        match payload {
            Value::Object(data) => self.update(data),
            Value::Null => Ok(()),
            _ => {
                self.diagnostics.warn("update", "更新载荷不是对象，已忽略");
                Ok(())
            }
        }
    }

    /// 停止：仅切换状态，不影响依赖
    pub fn stop(&mut self) {
        self.set_state(PlaybackState::Stopped);
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        let Some(root) = self.root_data() else {
            return;
        };
        match state {
            PlaybackState::Playing => {
                root.add_class(PLAY_TAG);
                root.remove_class(STOP_TAG);
            }
            PlaybackState::Stopped => {
                root.remove_class(PLAY_TAG);
                root.add_class(STOP_TAG);
            }
            PlaybackState::Idle => {}
        }
    }

    fn root_data(&mut self) -> Option<&mut ElementData> {
        let root = self.document.root();
        self.document.node_mut(root).map(|node| &mut node.data)
    }

    // ========== 完成信号 ==========

    /// 元素的过渡完成信号
    ///
    /// 撤销刚完成的效果，并触发以它为前置的依赖者。返回完成的效果 id。
    /// 效果 id 已不在效果目录中（阶段已推进，或是阶段 0 的变量效果）时只撤销，不触发。
    pub fn transition_finished(&mut self, element: &str) -> OverlayResult<Option<String>> {
        let controller = self
            .controllers
            .iter()
            .find(|c| c.element() == element)
            .ok_or_else(|| ReferenceError::UnregisteredElement {
                element: element.to_string(),
            })?;

        let live = self.references.live(element)?;
        let node = self.document.try_node_mut(live)?;
        let Some(finished) = controller.complete_transition(self.stage_id, &mut node.data) else {
            return Ok(None);
        };

        if self.scheduler.is_animation_registered(&finished) {
            self.scheduler.trigger_animation_dependencies(&finished)?;
            self.run_ready()?;
        } else {
            debug!(
                element = %element,
                effect = %finished,
                stage = self.stage_id,
                "完成的效果不在当前效果目录中，不触发依赖"
            );
        }
        Ok(Some(finished))
    }

    // ========== 依赖目录 ==========

    /// 预取效果 id（幂等）
    pub fn register_animation(&mut self, id: &str) {
        self.scheduler.register_animation(id);
    }

    /// 在效果 `id` 完成后启动 `trigger`
    ///
    /// 保留信号模式下，已触发的节点会立即启动 `trigger`。
    pub fn register_animation_dependency(
        &mut self,
        id: &str,
        trigger: EffectTrigger,
    ) -> OverlayResult<()> {
        self.scheduler.register_animation_dependency(id, trigger)?;
        self.run_ready()
    }

    /// 在变量 `id` 更新后启动 `trigger`
    pub fn register_variable_dependency(
        &mut self,
        id: &str,
        trigger: EffectTrigger,
    ) -> OverlayResult<()> {
        self.scheduler.register_variable_dependency(id, trigger)?;
        self.run_ready()
    }

    /// 触发效果 `id` 的依赖者并启动它们
    pub fn trigger_animation_dependencies(&mut self, id: &str) -> OverlayResult<()> {
        self.scheduler.trigger_animation_dependencies(id)?;
        self.run_ready()
    }

    /// 清空效果目录
    pub fn clear_animation_dependencies(&mut self) {
        self.scheduler.clear_animation_dependencies();
    }

    // ========== 效果启动 ==========

    fn run_ready(&mut self) -> OverlayResult<()> {
        while let Some(trigger) = self.scheduler.next_ready() {
            self.start_effect(&trigger)?;
        }
        Ok(())
    }

    /// 以规范快照的新副本施加效果，并替换活动元素
    fn start_effect(&mut self, trigger: &EffectTrigger) -> OverlayResult<()> {
        let controller = self
            .controllers
            .iter()
            .find(|c| c.element() == trigger.element)
            .ok_or_else(|| ReferenceError::UnregisteredElement {
                element: trigger.element.clone(),
            })?;
        let Some(effect) = controller.resolve_effect(trigger.stage, &trigger.effect) else {
            warn!(trigger = %trigger, "触发的效果不存在");
            return Ok(());
        };

        let mut fresh = self.references.duplicate(&trigger.element)?;
        effect.play(&mut fresh.data);
        self.references
            .replace_element(&mut self.document, &trigger.element, fresh)?;

        debug!(trigger = %trigger, "效果已启动");
        Ok(())
    }

    // ========== 查询 ==========

    /// 当前阶段 id
    pub fn stage_id(&self) -> u32 {
        self.stage_id
    }

    /// 播放状态
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// 配置
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// 文档
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// 元素当前的活动节点数据
    pub fn live_element(&self, element: &str) -> Option<&ElementData> {
        let live = self.references.live(element).ok()?;
        self.document.node(live).map(|node| &node.data)
    }

    /// 依赖调度器
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// 元素身份管理器
    pub fn references(&self) -> &ReferenceManager {
        &self.references
    }

    /// 元素效果控制器
    pub fn controller(&self, element: &str) -> Option<&ElementController> {
        self.controllers.iter().find(|c| c.element() == element)
    }

    /// 所有元素效果控制器（文档顺序）
    pub fn controllers(&self) -> &[ElementController] {
        &self.controllers
    }

    /// 变量控制器
    pub fn variable(&self, element: &str) -> Option<&VariableController> {
        self.variables.get(element)
    }

    /// 诊断
    pub fn diagnostics(&self) -> &DiagnosticResult {
        &self.diagnostics
    }
}
