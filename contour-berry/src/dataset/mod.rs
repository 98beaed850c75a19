//! 数据集持久化与批次生成.

use std::path::{Path, PathBuf};

pub mod archive;
pub mod batch;

pub use archive::{list_archives, load, save, PersistError};
pub use batch::{Batch, BatchConfig, BatchGenerator, ChannelSpec};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::{home_dataset_dir, home_dataset_dir_with};

    #[test]
    fn test_home_dataset_dir_with() {
        let Some(base) = home_dataset_dir() else {
            return;
        };
        assert!(base.ends_with("dataset"));
        let full = home_dataset_dir_with(["sunnybrook", "contours"]).unwrap();
        assert_eq!(full, base.join("sunnybrook").join("contours"));
    }
}
