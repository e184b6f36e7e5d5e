//! # Overlay Runtime
//!
//! 直播图文模板的效果/阶段依赖调度核心库。
//!
//! ## 架构概述
//!
//! `overlay-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 文档以内存中的元素树表示，宿主通过 [`Overlay`] 驱动：
//!
//! ```text
//! Host                              Runtime
//!   │                                  │
//!   │──── play / next / stop ────────►│ 阶段推进、效果排队
//!   │──── update(data) ──────────────►│ 变量模块 → 变量依赖
//!   │──── transition_finished(el) ───►│ 撤销效果 → 效果依赖
//!   │                                  │
//!   │◄─── Document（类名/属性/样式）───│
//! ```
//!
//! ## 核心概念
//!
//! - **效果**：一组标记类名 + 时间细节，施加到元素上以启动过渡
//! - **阶段**：元素的有序效果组；阶段 0 保留给变量触发的效果
//! - **依赖**：效果在前置效果完成后、或变量更新后启动
//!
//! ## 使用示例
//!
//! ```ignore
//! use overlay_runtime::{Document, ModuleRegistry, Overlay, OverlayConfig};
//!
//! let document = Document::from_fragment(template);
//! let mut overlay = Overlay::from_document(document, OverlayConfig::default(), &ModuleRegistry::default())?;
//!
//! overlay.play()?;
//! overlay.update_payload(&serde_json::json!({"score": "3 : 1"}))?;
//! overlay.transition_finished("title")?;
//! overlay.next()?;
//! ```
//!
//! ## 模块结构
//!
//! - [`dom`]：元素树与渲染接缝 [`StyleTarget`]
//! - [`declaration`]：阶段声明（`data-animations`）的解析
//! - [`effect`]：效果与时间细节
//! - [`stage`]：阶段与阶段内的启动顺序
//! - [`controller`]：单个元素的效果控制器
//! - [`dependency`] / [`scheduler`]：依赖节点与两个依赖目录
//! - [`reference`]：元素身份与"替换重启"
//! - [`variables`]：变量显示模块
//! - [`overlay`]：调度上下文（编排器）

pub mod config;
pub mod controller;
pub mod declaration;
pub mod dependency;
pub mod diagnostic;
pub mod dom;
pub mod effect;
pub mod error;
pub mod overlay;
pub mod reference;
pub mod scheduler;
pub mod stage;
pub mod variables;

// 重导出核心类型
pub use config::OverlayConfig;
pub use controller::{ANIMATED_CLASS_SELECTOR, ANIMATIONS_ATTRIBUTE, ElementController};
pub use declaration::{DetailsDeclaration, EffectDeclaration, StageDeclaration, parse_stages};
pub use dependency::Dependency;
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult};
pub use dom::{Document, ElementData, Fragment, Node, NodeId, StyleDeclaration, StyleTarget};
pub use effect::{Details, Effect, Predecessor};
pub use error::{OverlayError, OverlayResult, ProtocolError, ReferenceError, SpecificationError};
pub use overlay::{Overlay, PlaybackState};
pub use reference::{ReferenceEntry, ReferenceManager};
pub use scheduler::{EffectTrigger, Scheduler};
pub use stage::{Stage, VARIABLE_STAGE};
pub use variables::{
    ChangeAttribute, ModuleFactory, ModuleRegistry, ReplaceContents, VariableController,
    VariableModule,
};
