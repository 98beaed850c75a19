//! 数据集的基础数据结构: 通道数组、数据集与来源表.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::Array2;

mod channel;
mod preview;

pub use channel::{ChannelData, ElemKind};
pub use preview::ImgWriteVis;

/// 二维布尔掩码, 形状为 `(height, width)`.
pub type Mask = Array2<bool>;

/// 来源表. 通道名 -> 原始文件路径.
///
/// 从 npz 文件加载后会额外包含 [`crate::consts::channel::FILENAME`] 键.
pub type SourceMap = BTreeMap<String, PathBuf>;

/// 一个样本: 数据集及其来源表.
pub type Sample = (Dataset, SourceMap);

/// 通道名 -> 数组的有序映射. 插入顺序即通道顺序, 持久化时按该顺序记录通道名.
///
/// 通道数量通常只有个位数, 因此直接线性查找.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    channels: Vec<(String, ChannelData)>,
}

impl Dataset {
    /// 创建空数据集.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入通道. 若同名通道已存在, 则原地替换并返回旧数据.
    pub fn insert<S: Into<String>, D: Into<ChannelData>>(
        &mut self,
        name: S,
        data: D,
    ) -> Option<ChannelData> {
        let name = name.into();
        let data = data.into();
        match self.channels.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, data)),
            None => {
                self.channels.push((name, data));
                None
            }
        }
    }

    /// 按名称获取通道.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ChannelData> {
        self.channels
            .iter()
            .find_map(|(n, d)| (n == name).then_some(d))
    }

    /// 是否包含给定通道.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 通道个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// 按插入顺序迭代通道名.
    #[inline]
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.channels.iter().map(|(n, _)| n.as_str())
    }

    /// 按插入顺序迭代 `(通道名, 数组)`.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &ChannelData)> {
        self.channels.iter().map(|(n, d)| (n.as_str(), d))
    }
}

impl<S: Into<String>> FromIterator<(S, ChannelData)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (S, ChannelData)>>(iter: I) -> Self {
        let mut ans = Self::new();
        for (name, data) in iter {
            ans.insert(name, data);
        }
        ans
    }
}

impl IntoIterator for Dataset {
    type Item = (String, ChannelData);
    type IntoIter = std::vec::IntoIter<(String, ChannelData)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.channels.into_iter()
    }
}
