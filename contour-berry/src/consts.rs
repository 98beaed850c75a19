//! 通用常量.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Idx2d;

/// 数据集通道名称.
pub mod channel {
    /// 影像通道.
    pub const IMAGE: &str = "image";

    /// 内轮廓 (心内膜) 通道.
    pub const I_CONTOURS: &str = "i-contours";

    /// 外轮廓 (心外膜) 通道.
    pub const O_CONTOURS: &str = "o-contours";

    /// 从 npz 文件加载后, 来源表中记录文件自身路径的保留键.
    pub const FILENAME: &str = "filename";
}

/// 轮廓文件名中表示轮廓类型的片段.
pub mod token {
    /// 内轮廓.
    pub const ICONTOUR: &str = "icontour";

    /// 外轮廓.
    pub const OCONTOUR: &str = "ocontour";
}

/// 轮廓类型目录名 (如 `i-contours`) 对应的文件名片段 (如 `icontour`).
///
/// 未知类型返回 `None`.
#[inline]
pub fn contour_token(contour_type: &str) -> Option<&'static str> {
    match contour_type {
        channel::I_CONTOURS => Some(token::ICONTOUR),
        channel::O_CONTOURS => Some(token::OCONTOUR),
        _ => None,
    }
}

/// 默认掩码大小 `(height, width)`.
pub const DEFAULT_TARGET_SIZE: Idx2d = (256, 256);

/// 默认影像文件扩展名.
pub const DEFAULT_IMAGE_EXT: &str = "png";

/// 轮廓文件扩展名.
pub const CONTOUR_EXT: &str = "txt";

/// 持久化文件扩展名.
pub const ARCHIVE_EXT: &str = "npz";

/// 元数据列表分隔符.
pub const METADATA_SEP: char = ',';

/// 通道级错误的处理方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorAction {
    /// 遇到第一个错误即终止整个流程.
    #[default]
    Raise,

    /// 记录日志, 跳过出错的通道或样本.
    Skip,
}

impl ErrorAction {
    /// 是否在第一个错误处终止.
    #[inline]
    pub fn is_raise(&self) -> bool {
        matches!(self, Self::Raise)
    }
}

/// 有界持久化时, 上限 `N` 的解释方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CountBound {
    /// 处理索引 `0..=N` 的文件, 即至多 `N + 1` 个. 与早期行为保持一致.
    #[default]
    Inclusive,

    /// 处理索引 `0..N` 的文件, 即至多 `N` 个.
    Exclusive,
}

impl CountBound {
    /// 第 `index` 个 (从 0 开始) 文件在上限 `max` 下是否仍应被处理.
    #[inline]
    pub fn admits(&self, index: usize, max: Option<usize>) -> bool {
        match (self, max) {
            (_, None) => true,
            (Self::Inclusive, Some(n)) => index <= n,
            (Self::Exclusive, Some(n)) => index < n,
        }
    }
}
