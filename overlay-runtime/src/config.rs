//! # Config 模块
//!
//! 调度引擎的行为开关。所有字段都有默认值，可以直接嵌入宿主的配置文件。

use serde::{Deserialize, Serialize};

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// 调试模式：根元素带上 `debug` 标记
    #[serde(default)]
    pub debug: bool,

    /// 阶段 0 中出现非变量效果时视为致命错误（默认只记录警告并忽略该效果）
    #[serde(default)]
    pub strict_stage_zero: bool,

    /// 依赖节点保留信号：已触发的节点上新注册的回调立即执行
    #[serde(default)]
    pub replay_signals: bool,
}
