//! # Reference 模块
//!
//! 元素身份登记：稳定的元素 id → 当前活动节点句柄。
//!
//! 重启过渡的方式是用规范快照的新副本**替换**活动元素，而不是原地修改。
//! 替换之后，元素自身以及嵌套在它内部的受控元素的 [`NodeId`] 全部失效，
//! 由 [`ReferenceManager`] 负责在替换时同步更新。
//!
//! ```text
//! entry.duplicate() ──► effect.play(&mut fresh) ──► manager.replace_element(fresh)
//!                                                       │
//!                                                       ├─ document.replace(live, fresh)
//!                                                       ├─ entry.live = new node
//!                                                       └─ element_replaced(): 重新解析嵌套依赖者
//! ```
//!
//! 规范快照始终是基线：不含任何效果状态。只有两种变化会写入快照：
//! 变量模块写入的内容（[`ReferenceManager::refresh_variable_content`]），
//! 以及插入到活动结构中的片段（[`ReferenceManager::fragment_inserted`]）。

use std::collections::HashMap;

use crate::controller::ANIMATED_CLASS_SELECTOR;
use crate::dom::{Document, ElementData, Fragment, NodeId, StyleTarget};
use crate::effect::ACTIVE_EFFECT_ATTRIBUTE;
use crate::error::ReferenceError;
use crate::variables::VARIABLE_CLASS_SELECTOR;

/// 单个元素的身份条目
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    /// 当前活动节点
    live: NodeId,
    /// 规范快照（与活动节点相互独立）
    base: Fragment,
}

impl ReferenceEntry {
    /// 当前活动节点
    pub fn live(&self) -> NodeId {
        self.live
    }

    /// 规范快照
    pub fn base(&self) -> &Fragment {
        &self.base
    }

    /// 由规范快照复制出一个新的实例
    pub fn duplicate(&self) -> Fragment {
        self.base.clone()
    }

    /// 只更新活动句柄，不触发任何通知
    fn update_reference_quietly(&mut self, node: NodeId) {
        self.live = node;
    }
}

/// 子树中受控元素（变量元素与动画元素）的 id，文档顺序
fn controlled_ids(document: &Document, nodes: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    nodes
        .into_iter()
        .filter_map(|id| document.node(id))
        .filter(|node| {
            node.data.has_class(VARIABLE_CLASS_SELECTOR)
                || node.data.has_class(ANIMATED_CLASS_SELECTOR)
        })
        .filter_map(|node| node.data.id.clone())
        .collect()
}

/// 把变量模块写入的内容（文本与属性）复制到快照节点
///
/// 活动效果属性属于效果状态，保持快照中的值。
fn sync_variable_content(base: &mut ElementData, live: &ElementData) {
    base.text.clone_from(&live.text);

    let active = base.attributes.remove(ACTIVE_EFFECT_ATTRIBUTE);
    base.attributes = live
        .attributes
        .iter()
        .filter(|(name, _)| name.as_str() != ACTIVE_EFFECT_ATTRIBUTE)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    if let Some(active) = active {
        base.attributes
            .insert(ACTIVE_EFFECT_ATTRIBUTE.to_string(), active);
    }
}

/// 元素身份管理器
#[derive(Debug, Default)]
pub struct ReferenceManager {
    entries: HashMap<String, ReferenceEntry>,
    /// 元素 id → 嵌套在其中的受控元素 id
    dependents: HashMap<String, Vec<String>>,
}

impl ReferenceManager {
    /// 创建空管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记元素
    ///
    /// 创建条目并记录其内部嵌套的受控元素（变量元素与动画元素）作为依赖者。
    /// 同一 id 登记两次返回 [`ReferenceError::DuplicateElement`]。
    pub fn register_element(
        &mut self,
        document: &Document,
        node: NodeId,
    ) -> Result<&ReferenceEntry, ReferenceError> {
        let data = &document.try_node(node)?.data;
        let element = data.element_id().to_string();
        if self.entries.contains_key(&element) {
            return Err(ReferenceError::DuplicateElement { element });
        }

        let base = document
            .snapshot(node)
            .ok_or(ReferenceError::UnknownNode { node: node.value() })?;

        let nested = controlled_ids(document, document.descendants(node));

        self.dependents.insert(element.clone(), nested);
        Ok(self
            .entries
            .entry(element)
            .or_insert(ReferenceEntry { live: node, base }))
    }

    /// 元素是否已登记
    pub fn contains(&self, element: &str) -> bool {
        self.entries.contains_key(element)
    }

    /// 获取条目
    pub fn entry(&self, element: &str) -> Option<&ReferenceEntry> {
        self.entries.get(element)
    }

    /// 元素当前的活动节点
    pub fn live(&self, element: &str) -> Result<NodeId, ReferenceError> {
        self.entries
            .get(element)
            .map(ReferenceEntry::live)
            .ok_or_else(|| ReferenceError::UnregisteredElement {
                element: element.to_string(),
            })
    }

    /// 元素的新实例（规范快照的副本）
    pub fn duplicate(&self, element: &str) -> Result<Fragment, ReferenceError> {
        self.entries
            .get(element)
            .map(ReferenceEntry::duplicate)
            .ok_or_else(|| ReferenceError::UnregisteredElement {
                element: element.to_string(),
            })
    }

    /// 嵌套在元素内部的依赖者 id
    pub fn dependents(&self, element: &str) -> &[String] {
        self.dependents
            .get(element)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 用 `fragment` 替换元素的活动节点
    ///
    /// 替换后修复依赖者的引用，返回新的活动节点。规范快照不受影响。
    pub fn replace_element(
        &mut self,
        document: &mut Document,
        element: &str,
        fragment: Fragment,
    ) -> Result<NodeId, ReferenceError> {
        let entry = self
            .entries
            .get_mut(element)
            .ok_or_else(|| ReferenceError::UnregisteredElement {
                element: element.to_string(),
            })?;

        let node = document.replace(entry.live, &fragment)?;
        entry.update_reference_quietly(node);

        self.element_replaced(document, element)?;
        Ok(node)
    }

    /// 元素被替换后，从当前结构中重新解析其依赖者的活动节点
    pub fn element_replaced(
        &mut self,
        document: &Document,
        element: &str,
    ) -> Result<(), ReferenceError> {
        let live = self.live(element)?;
        let Some(dependents) = self.dependents.get(element) else {
            return Err(ReferenceError::UnregisteredElement {
                element: element.to_string(),
            });
        };

        for dependent in dependents {
            let Some(entry) = self.entries.get_mut(dependent) else {
                continue;
            };
            match document.find_in_subtree(live, dependent) {
                Some(node) => entry.update_reference_quietly(node),
                None => tracing::warn!(
                    element = %element,
                    dependent = %dependent,
                    "替换后的元素中找不到依赖元素"
                ),
            }
        }
        Ok(())
    }

    /// 用变量元素的活动内容刷新所有包含它的规范快照
    ///
    /// 变量元素更新后调用，保证之后复制出的新实例带有最新内容。
    /// 只同步文本与属性；样式标记、样式声明等效果状态保持基线值。
    pub fn refresh_variable_content(
        &mut self,
        document: &Document,
        variable: &str,
    ) -> Result<(), ReferenceError> {
        let live = &document.try_node(self.live(variable)?)?.data;
        for entry in self.entries.values_mut() {
            if let Some(base) = entry.base.find_mut(variable) {
                sync_variable_content(&mut base.data, live);
            }
        }
        Ok(())
    }

    /// 片段 `inserted` 已追加到活动结构后，同步包含插入点的已登记元素
    ///
    /// 每个祖先条目的规范快照在对应位置追加 `fragment`，
    /// 片段中的受控元素成为这些条目的依赖者，替换后能被重新解析。
    pub fn fragment_inserted(
        &mut self,
        document: &Document,
        inserted: NodeId,
        fragment: &Fragment,
    ) -> Result<(), ReferenceError> {
        let nested = controlled_ids(
            document,
            std::iter::once(inserted).chain(document.descendants(inserted)),
        );

        // 由内向外记录的子元素下标
        let mut path = Vec::new();
        let mut current = document.try_node(inserted)?.parent();
        while let Some(ancestor) = current {
            let node = document.try_node(ancestor)?;
            if let Some(element) = node.data.id.as_deref()
                && let Some(entry) = self.entries.get_mut(element)
                && entry.live == ancestor
            {
                match entry.base.descendant_mut(path.iter().rev().copied()) {
                    Some(target) => target.children.push(fragment.clone()),
                    None => tracing::warn!(
                        element = %element,
                        "规范快照与活动结构不一致，插入的片段未写入快照"
                    ),
                }
                self.dependents
                    .entry(element.to_string())
                    .or_default()
                    .extend(nested.iter().cloned());
            }

            current = node.parent();
            if let Some(parent) = current {
                let index = document
                    .try_node(parent)?
                    .children()
                    .iter()
                    .position(|&child| child == ancestor)
                    .ok_or(ReferenceError::UnknownNode {
                        node: ancestor.value(),
                    })?;
                path.push(index);
            }
        }
        Ok(())
    }
}
