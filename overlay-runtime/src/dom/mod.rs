//! # Dom 模块
//!
//! overlay 元素树的最小模型。
//!
//! ## 核心概念
//!
//! - [`ElementData`]：单个元素自身的数据（样式标记、属性、样式声明、文本）
//! - [`Fragment`]：脱离文档的子树，用于快照、复制和输入文件
//! - [`Document`]：活动节点的 arena，节点通过 [`NodeId`] 引用
//! - [`StyleTarget`]：效果施加的目标接口，渲染后端可以自行实现
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let mut doc = Document::from_fragment(
//!     Fragment::new("body").with_child(Fragment::new("div").with_id("title")),
//! );
//! let title = doc.find_by_element_id("title").unwrap();
//! let fresh = doc.snapshot(title).unwrap();
//! let title = doc.replace(title, &fresh)?;
//! ```

mod document;
mod element;
mod fragment;

pub use document::{Document, Node, NodeId};
pub use element::{ElementData, StyleDeclaration, StyleTarget};
pub use fragment::Fragment;
