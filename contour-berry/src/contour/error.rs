//! 轮廓文件解析错误.

use std::io;
use std::path::PathBuf;

/// 轮廓文件解析错误.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 底层 I/O 错误.
    #[error("cannot read contour file {}: {source}", .path.display())]
    Io {
        /// 轮廓文件.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: io::Error,
    },

    /// 某一行不是恰好两个浮点数.
    ///
    /// `line` 从 1 开始计数.
    #[error("malformed coordinate line {line} in {}: `{content}`", .path.display())]
    MalformedLine {
        /// 轮廓文件.
        path: PathBuf,
        /// 行号.
        line: usize,
        /// 原始内容.
        content: String,
    },
}
