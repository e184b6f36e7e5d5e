//! # Overlay Host
//!
//! overlay 调度引擎的宿主层：配置、日志、控制指令。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 加载配置与模板文档
//! - 把播出控制端的指令（play / next / update / stop）转发给 [`Overlay`]
//! - 把渲染端的过渡完成信号转发给 [`Overlay`]
//!
//! Host 层不包含调度逻辑，只负责驱动 `overlay-runtime`。
//!
//! [`Overlay`]: overlay_runtime::Overlay

pub mod command;
pub mod config;
pub mod session;

pub use command::{CommandError, HostCommand};
pub use config::{ConfigError, HostConfig};
pub use session::{ExecuteResult, Session, SessionError, SessionSummary};
