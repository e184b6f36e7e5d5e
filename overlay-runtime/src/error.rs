//! # Error 模块
//!
//! 定义 overlay-runtime 中使用的错误类型。
//!
//! 所有错误都是同步、局部的：由触发它的调用直接返回，没有后台错误通道，也没有重试。

use thiserror::Error;

/// 声明式规格错误
///
/// 元素上的效果/阶段/变量声明无效。每个变体都带有出错元素的 id。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecificationError {
    /// 受控元素缺少 id
    #[error("带有 '{selector}' 标记的元素必须有唯一 id")]
    MissingElementId { selector: String },

    /// 规格属性缺失
    #[error("元素 #{element}：缺少属性 '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// 规格 JSON 无法解析
    #[error("元素 #{element}：规格格式错误 - {message}")]
    Malformed { element: String, message: String },

    /// 阶段 id 无效
    #[error("元素 #{element}：阶段 id '{id}' 无效，只接受 >= 0 的整数")]
    InvalidStageId { element: String, id: i64 },

    /// 阶段 id 重复
    #[error("元素 #{element}：阶段 {stage} 被定义了多次")]
    DuplicateStage { element: String, stage: u32 },

    /// 同一元素内效果 id 重复
    #[error("元素 #{element}：效果 id '{effect}' 重复")]
    DuplicateEffect { element: String, effect: String },

    /// 样式标记无效
    #[error("元素 #{element}：效果 '{effect}' 的样式标记 '{tag}' 无效")]
    InvalidTag {
        element: String,
        effect: String,
        tag: String,
    },

    /// 前置引用无效
    #[error("元素 #{element}：效果 '{effect}' 的前置引用 '{after}' 无效")]
    InvalidPredecessor {
        element: String,
        effect: String,
        after: String,
    },

    /// 阶段 0 中出现了不依赖变量的效果（严格模式）
    #[error("元素 #{element}：阶段 0 只允许变量触发的效果，'{effect}' 不是")]
    StageZeroEffect { element: String, effect: String },

    /// 未注册的变量模块
    #[error("元素 #{element}：未知的变量模块 '{module}'")]
    UnknownModule { element: String, module: String },

    /// 变量模块初始化失败
    #[error("元素 #{element}：变量模块 '{module}' 初始化失败 - {message}")]
    ModuleInitialization {
        element: String,
        module: String,
        message: String,
    },
}

/// 依赖协议错误
///
/// 对未预取（prefetch）的 id 注册或触发依赖。
/// 这强制了"先预取、后挂接"的两阶段约定，避免静默的空操作。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 效果 id 未注册
    #[error("试图操作未注册/不存在的效果 '{id}' 的依赖")]
    UnregisteredAnimation { id: String },

    /// 变量 id 未注册
    #[error("试图操作未注册/不存在的变量 '{id}' 的依赖")]
    UnregisteredVariable { id: String },
}

/// 元素引用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// 重复注册
    #[error("元素 #{element} 已经注册过")]
    DuplicateElement { element: String },

    /// 元素未注册
    #[error("元素 #{element} 未注册")]
    UnregisteredElement { element: String },

    /// 节点句柄无效（已被移除或从未存在）
    #[error("节点 {node} 不存在")]
    UnknownNode { node: u64 },

    /// 根节点不能被替换
    #[error("根节点不能被替换")]
    RootReplacement,
}

/// overlay-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// 规格错误
    #[error("规格错误: {0}")]
    Specification(#[from] SpecificationError),

    /// 协议错误
    #[error("协议错误: {0}")]
    Protocol(#[from] ProtocolError),

    /// 引用错误
    #[error("引用错误: {0}")]
    Reference(#[from] ReferenceError),
}

/// Result 类型别名
pub type OverlayResult<T> = Result<T, OverlayError>;
