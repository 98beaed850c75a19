//! 跳过 / 拒绝事件的观察者.
//!
//! 提取器和批次生成器在构造时接收一个 [`Reporter`], 默认是什么都不做的 [`NoopReporter`].
//! 无论使用哪种 `Reporter`, 库本身都会通过 `log` 门面输出同样的信息.

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::sync::Arc;

/// 流水线中值得上报的事件.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// 样本的某个通道未能提取, 该通道缺失.
    ChannelMissing {
        /// 主轮廓文件.
        source: &'a Path,
        /// 通道名.
        channel: &'a str,
        /// 原因.
        reason: &'a str,
    },

    /// 样本未通过校验, 被丢弃.
    SampleRejected {
        /// 主轮廓文件.
        source: &'a Path,
        /// 原因.
        reason: &'a str,
    },

    /// 批次生成时, 样本缺少所需通道而被丢弃.
    SampleDropped {
        /// 样本来源 (npz 文件或主轮廓文件).
        source: &'a Path,
        /// 缺失的通道名.
        channel: &'a str,
    },

    /// 样本已写入 npz 文件.
    Persisted {
        /// 主轮廓文件.
        source: &'a Path,
        /// 输出文件.
        output: &'a Path,
    },
}

impl Event<'_> {
    /// 事件类别的简短名称.
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChannelMissing { .. } => "channel-missing",
            Self::SampleRejected { .. } => "sample-rejected",
            Self::SampleDropped { .. } => "sample-dropped",
            Self::Persisted { .. } => "persisted",
        }
    }
}

impl Display for Event<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelMissing {
                source,
                channel,
                reason,
            } => write!(
                f,
                "channel `{channel}` missing for {}: {reason}",
                source.display()
            ),
            Self::SampleRejected { source, reason } => {
                write!(f, "sample {} rejected: {reason}", source.display())
            }
            Self::SampleDropped { source, channel } => write!(
                f,
                "sample {} dropped: missing channel `{channel}`",
                source.display()
            ),
            Self::Persisted { source, output } => {
                write!(f, "{} -> {}", source.display(), output.display())
            }
        }
    }
}

/// 事件观察者.
pub trait Reporter: Send + Sync {
    /// 接收一个事件.
    fn report(&self, event: &Event<'_>);
}

/// 忽略所有事件.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    #[inline]
    fn report(&self, _event: &Event<'_>) {}
}

/// 将事件转发到 `log`: 写入成功为 `info`, 其余为 `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &Event<'_>) {
        match event {
            Event::Persisted { .. } => log::info!("{event}"),
            _ => log::warn!("{event}"),
        }
    }
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    #[inline]
    fn report(&self, event: &Event<'_>) {
        (**self).report(event)
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    #[inline]
    fn report(&self, event: &Event<'_>) {
        (**self).report(event)
    }
}
