//! # Dependency 模块
//!
//! 单次广播节点：一组在同一个信号上一起触发的回调。
//!
//! ## 状态
//!
//! ```text
//! Unsignaled --trigger()--> Signaled
//! ```
//!
//! - 默认模式下信号不保留：触发后注册的回调要等下一次触发。
//! - 重放模式（[`Dependency::replaying`]）下，已触发的节点在注册新回调时
//!   要求调用方立即执行它。
//!
//! `trigger()` 不去重：同一节点被触发两次时，仍在列表中的回调会被执行两次。
//! 对效果完成信号而言每次完成只有一次信号，这是预期行为；
//! 但如果在目录清空前对同一 id 触发两次，就会重复启动依赖者。

/// 广播节点
///
/// `C` 是回调的表示方式。调度器使用 [`EffectTrigger`](crate::scheduler::EffectTrigger)，
/// 由调用方按注册顺序执行 [`trigger`](Dependency::trigger) 返回的回调。
#[derive(Debug, Clone)]
pub struct Dependency<C> {
    callbacks: Vec<C>,
    replay: bool,
    trigger_count: usize,
}

impl<C> Default for Dependency<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Dependency<C> {
    /// 创建不保留信号的节点
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            replay: false,
            trigger_count: 0,
        }
    }

    /// 创建保留信号的节点
    pub fn replaying() -> Self {
        Self {
            replay: true,
            ..Self::new()
        }
    }

    /// 注册回调
    ///
    /// 返回 `true` 表示节点处于重放模式且已触发过，调用方应立即执行该回调。
    /// 无论返回值如何，回调都会保留，参与后续的触发。
    pub fn add(&mut self, callback: C) -> bool {
        self.callbacks.push(callback);
        self.replay && self.is_signaled()
    }

    /// 触发节点，按注册顺序返回所有当前回调
    pub fn trigger(&mut self) -> &[C] {
        self.trigger_count += 1;
        &self.callbacks
    }

    /// 是否已被触发过
    pub fn is_signaled(&self) -> bool {
        self.trigger_count > 0
    }

    /// 已触发次数
    pub fn trigger_count(&self) -> usize {
        self.trigger_count
    }

    /// 已注册回调数量
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// 是否没有回调
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fires_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dep: Dependency<Box<dyn Fn()>> = Dependency::new();

        for name in ["a", "b", "c"] {
            let log = log.clone();
            assert!(!dep.add(Box::new(move || log.borrow_mut().push(name))));
        }

        for callback in dep.trigger() {
            callback();
        }
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert!(dep.is_signaled());
    }

    #[test]
    fn test_double_trigger_double_fires() {
        let mut dep = Dependency::new();
        dep.add("x");

        let mut fired = Vec::new();
        fired.extend_from_slice(dep.trigger());
        fired.extend_from_slice(dep.trigger());

        assert_eq!(fired, vec!["x", "x"]);
        assert_eq!(dep.trigger_count(), 2);
    }

    #[test]
    fn test_late_registration_without_replay_waits() {
        let mut dep = Dependency::new();
        assert!(dep.trigger().is_empty());

        assert!(!dep.add("late"));
        assert_eq!(dep.trigger(), ["late"]);
    }

    #[test]
    fn test_replay_fires_late_registration() {
        let mut dep = Dependency::replaying();
        assert!(!dep.add("early"));
        dep.trigger();

        assert!(dep.add("late"));
        assert_eq!(dep.len(), 2);
    }
}
