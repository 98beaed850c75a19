//! 数据准备脚本依赖的通用组件.

use contour_berry::PersistSummary;
use std::io::{self, Write};

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 将一次持久化的统计结果写进 `w` 中.
pub fn describe_into<W: Write>(name: &str, s: &PersistSummary, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn ratio_to_display(part: usize, total: usize) -> String {
        if total == 0 {
            "/".to_string()
        } else {
            format!("{:.2}%", part as f64 * 100.0 / total as f64)
        }
    }

    writeln!(w, "Run `{name}`:")?;
    writeln!(w, "{S4}Processed contour files: {}", s.processed)?;
    writeln!(
        w,
        "{S4}Written archives: {} ({})",
        s.written,
        ratio_to_display(s.written, s.processed)
    )?;
    write!(
        w,
        "{S4}Rejected samples: {} ({})",
        s.rejected,
        ratio_to_display(s.rejected, s.processed)
    )?;
    Ok(())
}
