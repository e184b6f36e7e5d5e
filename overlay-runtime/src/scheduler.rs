//! # Scheduler 模块
//!
//! 依赖目录与就绪队列。
//!
//! ## 两个目录
//!
//! - 效果目录：以效果 id 为键，生命周期为当前阶段，每次播放前清空
//! - 变量目录：以变量 id 为键，生命周期为整个进程，跨阶段保留
//!
//! ## 执行模型
//!
//! 回调以 [`EffectTrigger`] 表示，触发时进入就绪队列，
//! 由 [`Overlay`](crate::overlay::Overlay) 按顺序取出并启动对应效果。
//! 这样触发方不需要持有文档或元素的可变引用。

use std::collections::{HashMap, VecDeque};

use crate::dependency::Dependency;
use crate::error::ProtocolError;

/// 启动某个效果的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectTrigger {
    /// 目标元素 id
    pub element: String,
    /// 效果所在阶段
    pub stage: u32,
    /// 效果 id
    pub effect: String,
}

impl EffectTrigger {
    /// 创建触发请求
    pub fn new(element: impl Into<String>, stage: u32, effect: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            stage,
            effect: effect.into(),
        }
    }
}

impl std::fmt::Display for EffectTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}[{}]:{}", self.element, self.stage, self.effect)
    }
}

/// 依赖调度器
#[derive(Debug, Default)]
pub struct Scheduler {
    /// 效果目录（每阶段清空）
    animation_dependencies: HashMap<String, Dependency<EffectTrigger>>,
    /// 变量目录（持久）
    variable_dependencies: HashMap<String, Dependency<EffectTrigger>>,
    /// 待启动的效果
    ready: VecDeque<EffectTrigger>,
    /// 新建节点是否保留信号
    replay_signals: bool,
}

impl Scheduler {
    /// 创建调度器
    pub fn new(replay_signals: bool) -> Self {
        Self {
            replay_signals,
            ..Self::default()
        }
    }

    fn new_dependency(&self) -> Dependency<EffectTrigger> {
        if self.replay_signals {
            Dependency::replaying()
        } else {
            Dependency::new()
        }
    }

    // ========== 效果目录 ==========

    /// 预取效果 id（幂等）
    pub fn register_animation(&mut self, id: &str) {
        if !self.animation_dependencies.contains_key(id) {
            let dependency = self.new_dependency();
            self.animation_dependencies.insert(id.to_string(), dependency);
        }
    }

    /// 效果 id 是否已预取
    pub fn is_animation_registered(&self, id: &str) -> bool {
        self.animation_dependencies.contains_key(id)
    }

    /// 在效果 `id` 完成后启动 `trigger`
    ///
    /// `id` 未预取时返回 [`ProtocolError::UnregisteredAnimation`]，`trigger` 不会被保存。
    pub fn register_animation_dependency(
        &mut self,
        id: &str,
        trigger: EffectTrigger,
    ) -> Result<(), ProtocolError> {
        let dependency = self
            .animation_dependencies
            .get_mut(id)
            .ok_or_else(|| ProtocolError::UnregisteredAnimation { id: id.to_string() })?;
        if dependency.add(trigger.clone()) {
            self.ready.push_back(trigger);
        }
        Ok(())
    }

    /// 触发效果 `id` 的依赖者，返回入队数量
    pub fn trigger_animation_dependencies(&mut self, id: &str) -> Result<usize, ProtocolError> {
        let dependency = self
            .animation_dependencies
            .get_mut(id)
            .ok_or_else(|| ProtocolError::UnregisteredAnimation { id: id.to_string() })?;
        if dependency.is_empty() {
            tracing::debug!(animation = %id, "效果完成，没有依赖者");
        }
        let fired = dependency.trigger();
        self.ready.extend(fired.iter().cloned());
        Ok(fired.len())
    }

    /// 清空效果目录（变量目录不受影响）
    pub fn clear_animation_dependencies(&mut self) {
        self.animation_dependencies.clear();
    }

    /// 效果目录中的条目数
    pub fn animation_count(&self) -> usize {
        self.animation_dependencies.len()
    }

    /// 效果 `id` 上挂接的依赖者数量
    pub fn animation_dependents(&self, id: &str) -> Option<usize> {
        self.animation_dependencies.get(id).map(Dependency::len)
    }

    // ========== 变量目录 ==========

    /// 注册变量 id（幂等）
    pub fn register_variable(&mut self, id: &str) {
        if !self.variable_dependencies.contains_key(id) {
            let dependency = self.new_dependency();
            self.variable_dependencies.insert(id.to_string(), dependency);
        }
    }

    /// 在变量 `id` 更新后启动 `trigger`
    pub fn register_variable_dependency(
        &mut self,
        id: &str,
        trigger: EffectTrigger,
    ) -> Result<(), ProtocolError> {
        let dependency = self
            .variable_dependencies
            .get_mut(id)
            .ok_or_else(|| ProtocolError::UnregisteredVariable { id: id.to_string() })?;
        tracing::debug!(variable = %id, trigger = %trigger, "注册变量依赖");
        if dependency.add(trigger.clone()) {
            self.ready.push_back(trigger);
        }
        Ok(())
    }

    /// 触发变量 `id` 的依赖者，返回入队数量
    pub fn trigger_variable_dependencies(&mut self, id: &str) -> Result<usize, ProtocolError> {
        let dependency = self
            .variable_dependencies
            .get_mut(id)
            .ok_or_else(|| ProtocolError::UnregisteredVariable { id: id.to_string() })?;
        let fired = dependency.trigger();
        self.ready.extend(fired.iter().cloned());
        Ok(fired.len())
    }

    /// 变量 `id` 上挂接的依赖者数量
    pub fn variable_dependents(&self, id: &str) -> Option<usize> {
        self.variable_dependencies.get(id).map(Dependency::len)
    }

    // ========== 就绪队列 ==========

    /// 立即启动（进入就绪队列）
    pub fn fire(&mut self, trigger: EffectTrigger) {
        self.ready.push_back(trigger);
    }

    /// 取出下一个待启动的效果
    pub fn next_ready(&mut self) -> Option<EffectTrigger> {
        self.ready.pop_front()
    }

    /// 待启动数量
    pub fn pending(&self) -> usize {
        self.ready.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler) -> Vec<String> {
        std::iter::from_fn(|| scheduler.next_ready())
            .map(|t| t.effect)
            .collect()
    }

    #[test]
    fn test_unregistered_dependency_is_rejected() {
        let mut scheduler = Scheduler::new(false);
        let result =
            scheduler.register_animation_dependency("unknown-id", EffectTrigger::new("box", 1, "b"));
        assert_eq!(
            result,
            Err(ProtocolError::UnregisteredAnimation {
                id: "unknown-id".to_string()
            })
        );
        assert_eq!(scheduler.animation_count(), 0);
        assert_eq!(scheduler.pending(), 0);

        assert!(scheduler.trigger_animation_dependencies("unknown-id").is_err());
        assert!(matches!(
            scheduler.register_variable_dependency("score", EffectTrigger::new("box", 0, "c")),
            Err(ProtocolError::UnregisteredVariable { .. })
        ));
    }

    #[test]
    fn test_register_animation_is_idempotent() {
        let mut scheduler = Scheduler::new(false);
        scheduler.register_animation("a");
        scheduler
            .register_animation_dependency("a", EffectTrigger::new("box", 1, "b"))
            .unwrap();
        scheduler.register_animation("a");
        assert_eq!(scheduler.animation_dependents("a"), Some(1));
    }

    #[test]
    fn test_trigger_queues_in_order() {
        let mut scheduler = Scheduler::new(false);
        scheduler.register_animation("a");
        for effect in ["b", "c"] {
            scheduler
                .register_animation_dependency("a", EffectTrigger::new("box", 1, effect))
                .unwrap();
        }

        assert_eq!(scheduler.trigger_animation_dependencies("a"), Ok(2));
        assert_eq!(drain(&mut scheduler), vec!["b", "c"]);
    }

    #[test]
    fn test_clear_keeps_variable_directory() {
        let mut scheduler = Scheduler::new(false);
        scheduler.register_animation("a");
        scheduler
            .register_animation_dependency("a", EffectTrigger::new("box", 1, "b"))
            .unwrap();
        scheduler.register_variable("score");
        scheduler
            .register_variable_dependency("score", EffectTrigger::new("box", 0, "flash"))
            .unwrap();

        scheduler.clear_animation_dependencies();
        assert!(!scheduler.is_animation_registered("a"));
        assert_eq!(scheduler.variable_dependents("score"), Some(1));

        // 重新预取得到的是全新节点，清空前挂接的回调不会再被触发
        scheduler.register_animation("a");
        assert_eq!(scheduler.trigger_animation_dependencies("a"), Ok(0));
        assert_eq!(scheduler.pending(), 0);

        assert_eq!(scheduler.trigger_variable_dependencies("score"), Ok(1));
        assert_eq!(drain(&mut scheduler), vec!["flash"]);
    }

    #[test]
    fn test_replay_signals() {
        let mut scheduler = Scheduler::new(true);
        scheduler.register_variable("score");
        scheduler.trigger_variable_dependencies("score").unwrap();

        scheduler
            .register_variable_dependency("score", EffectTrigger::new("box", 0, "flash"))
            .unwrap();
        assert_eq!(drain(&mut scheduler), vec!["flash"]);
    }
}
