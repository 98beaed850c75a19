//! 数据集校验.

use ndarray::Zip;

use crate::consts::channel;
use crate::{Dataset, Idx2d};

/// 校验失败原因. 校验失败只会导致样本被拒绝, 不会作为错误向上传递.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    /// 数据集没有任何通道.
    #[error("dataset has no channel")]
    Empty,

    /// 通道形状与第一个通道不一致.
    #[error("channel `{channel}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// 不一致的通道.
        channel: String,
        /// 第一个通道的形状.
        expected: Idx2d,
        /// 该通道的形状.
        found: Idx2d,
    },

    /// 内轮廓有像素落在外轮廓之外.
    #[error("{pixels} pixel(s) of `{inner}` lie outside `{outer}`")]
    NotContained {
        /// 内轮廓通道.
        inner: String,
        /// 外轮廓通道.
        outer: String,
        /// 落在外部的像素个数.
        pixels: usize,
    },
}

/// 数据集校验器.
pub trait DatasetValidator: Send + Sync {
    /// 校验数据集.
    fn validate(&self, dataset: &Dataset) -> Result<(), ValidationFailure>;
}

/// 默认校验器: 非空, 所有通道同形, 且每对 `(inner, outer)` 满足包含关系.
///
/// 只有当一对通道都存在时才检查包含关系.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainmentValidator {
    pairs: Vec<(String, String)>,
}

impl Default for ContainmentValidator {
    fn default() -> Self {
        Self::new([(channel::I_CONTOURS, channel::O_CONTOURS)])
    }
}

impl ContainmentValidator {
    /// 以给定的 `(inner, outer)` 通道对创建.
    pub fn new<S, I>(pairs: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, S)>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(i, o)| (i.into(), o.into()))
                .collect(),
        }
    }

    /// 只检查非空与形状.
    #[inline]
    pub fn without_containment() -> Self {
        Self { pairs: Vec::new() }
    }

    /// 需要检查包含关系的通道对.
    #[inline]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl DatasetValidator for ContainmentValidator {
    fn validate(&self, dataset: &Dataset) -> Result<(), ValidationFailure> {
        let mut iter = dataset.iter();
        let (_, first) = iter.next().ok_or(ValidationFailure::Empty)?;
        let expected = first.shape();
        for (name, data) in iter {
            let found = data.shape();
            if found != expected {
                return Err(ValidationFailure::ShapeMismatch {
                    channel: name.to_owned(),
                    expected,
                    found,
                });
            }
        }

        for (inner_name, outer_name) in &self.pairs {
            let (Some(inner), Some(outer)) = (dataset.get(inner_name), dataset.get(outer_name))
            else {
                continue;
            };
            let inner = inner.nonzero();
            let outer = outer.nonzero();
            let pixels = Zip::from(&inner)
                .and(&outer)
                .fold(0usize, |acc, &i, &o| acc + usize::from(i && !o));
            if pixels > 0 {
                return Err(ValidationFailure::NotContained {
                    inner: inner_name.clone(),
                    outer: outer_name.clone(),
                    pixels,
                });
            }
        }
        Ok(())
    }
}
