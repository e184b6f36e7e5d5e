//! # Document 模块
//!
//! 活动元素树。节点存放在 arena 中，由单调递增的 [`NodeId`] 引用。
//! 节点被替换后旧 id 失效，持有旧 id 的一方需要通过引用管理器重新解析。

use std::collections::HashMap;

use super::element::{ElementData, StyleTarget};
use super::fragment::Fragment;
use crate::error::ReferenceError;

/// 节点句柄
///
/// 由 `Document` 在节点插入时分配，保证不会复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// 活动节点
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// 元素数据
    pub data: ElementData,
}

impl Node {
    /// 节点句柄
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 父节点
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// 子节点（文档顺序）
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// 活动文档
#[derive(Debug, Clone)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_node_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// 创建只有 `body` 根节点的空文档
    pub fn new() -> Self {
        Self::from_fragment(Fragment::new("body"))
    }

    /// 从片段构建文档，片段根成为文档根
    pub fn from_fragment(root: Fragment) -> Self {
        let mut doc = Self {
            nodes: HashMap::new(),
            root: NodeId(0),
            next_node_id: 1,
        };
        doc.root = doc.materialize(None, &root);
        doc
    }

    /// 根节点
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// 活动节点数量
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 文档是否只剩根节点
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// 节点是否仍然存在
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// 获取节点
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// 获取节点（可变）
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// 获取节点，不存在时返回错误
    pub fn try_node(&self, id: NodeId) -> Result<&Node, ReferenceError> {
        self.node(id)
            .ok_or(ReferenceError::UnknownNode { node: id.value() })
    }

    /// 获取节点（可变），不存在时返回错误
    pub fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node, ReferenceError> {
        self.node_mut(id)
            .ok_or(ReferenceError::UnknownNode { node: id.value() })
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// 把片段实例化为活动节点
    fn materialize(&mut self, parent: Option<NodeId>, fragment: &Fragment) -> NodeId {
        let id = self.next_id();
        self.nodes.insert(
            id,
            Node {
                id,
                parent,
                children: Vec::new(),
                data: fragment.data.clone(),
            },
        );

        let children: Vec<NodeId> = fragment
            .children
            .iter()
            .map(|child| self.materialize(Some(id), child))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        id
    }

    /// 在 `parent` 末尾追加片段
    pub fn append(&mut self, parent: NodeId, fragment: &Fragment) -> Result<NodeId, ReferenceError> {
        self.try_node(parent)?;
        let id = self.materialize(Some(parent), fragment);
        self.try_node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// 用片段替换活动节点
    ///
    /// 新节点占据旧节点在父节点中的位置，旧子树整体移除（其所有 `NodeId` 失效）。
    /// 新节点会执行一次布局刷新。
    pub fn replace(&mut self, old: NodeId, fragment: &Fragment) -> Result<NodeId, ReferenceError> {
        if old == self.root {
            return Err(ReferenceError::RootReplacement);
        }
        let parent = self
            .try_node(old)?
            .parent
            .ok_or(ReferenceError::UnknownNode { node: old.value() })?;

        let new = self.materialize(Some(parent), fragment);
        let siblings = &mut self.try_node_mut(parent)?.children;
        match siblings.iter().position(|&child| child == old) {
            Some(index) => siblings[index] = new,
            None => siblings.push(new),
        }

        self.remove_subtree(old);
        if let Some(node) = self.nodes.get_mut(&new) {
            node.data.force_layout();
        }
        Ok(new)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    /// 生成节点子树的快照
    pub fn snapshot(&self, id: NodeId) -> Option<Fragment> {
        let node = self.node(id)?;
        let children = node
            .children
            .iter()
            .filter_map(|&child| self.snapshot(child))
            .collect();
        Some(Fragment {
            data: node.data.clone(),
            children,
        })
    }

    /// 在整个文档中按元素 id 查找（文档顺序的第一个）
    pub fn find_by_element_id(&self, element_id: &str) -> Option<NodeId> {
        self.find_in_subtree(self.root, element_id)
    }

    /// 在指定子树中按元素 id 查找（包括子树根）
    pub fn find_in_subtree(&self, start: NodeId, element_id: &str) -> Option<NodeId> {
        let node = self.node(start)?;
        if node.data.id.as_deref() == Some(element_id) {
            return Some(start);
        }
        node.children
            .iter()
            .find_map(|&child| self.find_in_subtree(child, element_id))
    }

    /// 子树中的所有后代（文档顺序，不包括 `start` 自身）
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(start, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.node(id) {
            for &child in &node.children {
                out.push(child);
                self.collect_descendants(child, out);
            }
        }
    }

    /// 文档中带有指定样式标记的所有元素（文档顺序，包括根）
    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|node| node.data.has_class(class))
            })
            .collect()
    }
}
