//! 提取与批次生成的错误类型.

use std::io;
use std::path::PathBuf;

use crate::contour::ParseError;
use crate::dataset::archive::PersistError;
use crate::decode::DecodeError;
use crate::Idx2d;

/// 提取错误.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// 无法由主轮廓文件推导出 `target` (影像或输出文件).
    #[error("cannot correlate {} with a {target}", .contour.display())]
    CorrelationMiss {
        /// 主轮廓文件.
        contour: PathBuf,
        /// 推导目标.
        target: &'static str,
    },

    /// 轮廓文件格式错误.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// 影像解码错误.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// 轮廓无法光栅化 (点数不足, 未闭合或坐标非法).
    #[error("contour {} cannot be rasterized ({points} point(s))", .path.display())]
    InvalidContour {
        /// 轮廓文件.
        path: PathBuf,
        /// 点数.
        points: usize,
    },

    /// 写入 npz 文件错误. 总是致命的.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// 掩码大小的某一维为 0 或超出 `u32` 范围.
    #[error("invalid target size {0:?}")]
    InvalidTargetSize(Idx2d),

    /// 列出轮廓目录错误.
    #[error("cannot list {}: {source}", .path.display())]
    Listing {
        /// 目录.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: io::Error,
    },
}

/// 提取结果.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// 批次生成错误.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// 数据来源配置错误: 必须且只能指定实时数据流或 npz 目录之一.
    #[error("invalid batch source: {0}")]
    InvalidSource(&'static str),

    /// 批次大小为 0.
    #[error("batch size must be positive")]
    InvalidBatchSize,

    /// 样本缺少所需通道.
    #[error("sample {} lacks channel `{channel}`", .sample.display())]
    MissingChannel {
        /// 样本来源.
        sample: PathBuf,
        /// 缺失的通道.
        channel: String,
    },

    /// 读取 npz 文件错误. 总是致命的.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// 上游提取错误.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}
