//! # Fragment 模块
//!
//! 脱离文档的元素子树。

use serde::{Deserialize, Serialize};

use super::element::{ElementData, StyleTarget};

/// 脱离文档的子树
///
/// 用作规范快照（canonical snapshot）、替换用的新实例，以及文档输入文件的格式。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fragment {
    /// 根元素数据
    #[serde(flatten)]
    pub data: ElementData,
    /// 子元素
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Fragment>,
}

impl Fragment {
    /// 创建指定标签的空片段
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            data: ElementData::new(tag),
            children: Vec::new(),
        }
    }

    /// 设置元素 id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.data.id = Some(id.into());
        self
    }

    /// 添加样式标记
    pub fn with_class(mut self, class: &str) -> Self {
        self.data.add_class(class);
        self
    }

    /// 设置属性
    pub fn with_attribute(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.data.set_attribute(name, value.as_ref());
        self
    }

    /// 设置文本内容
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.data.text = text.into();
        self
    }

    /// 追加子元素
    pub fn with_child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }

    /// 按元素 id 深度优先查找（包括自身）
    pub fn find(&self, element_id: &str) -> Option<&Fragment> {
        if self.data.id.as_deref() == Some(element_id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(element_id))
    }

    /// 按元素 id 深度优先查找可变引用（包括自身）
    pub fn find_mut(&mut self, element_id: &str) -> Option<&mut Fragment> {
        if self.data.id.as_deref() == Some(element_id) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(element_id))
    }

    /// 按子元素下标路径（由外向内）定位后代；空路径返回自身
    pub fn descendant_mut(
        &mut self,
        path: impl IntoIterator<Item = usize>,
    ) -> Option<&mut Fragment> {
        path.into_iter()
            .try_fold(self, |fragment, index| fragment.children.get_mut(index))
    }
}
