//! 对 `contour-berry::extract` 的更一层封装. 从环境变量或默认目录构造提取器.

use contour_berry::consts::ErrorAction;
use contour_berry::correlate::{load_folder_map, FolderMapError, FrameIndexResolver};
use contour_berry::report::LogReporter;
use contour_berry::{ContourExtractor, ExtractorConfig};
use std::env;
use std::path::{Path, PathBuf};

/// 数据集在 `$HOME/dataset` 下的子目录.
const DATASET_SUBDIR: &str = "sunnybrook";

/// Sunnybrook 原始影像为 DICOM.
const IMAGE_EXT: &str = "dcm";

/// 构造提取器错误.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// 环境变量未设置, 并且无法确定用户主目录.
    #[error("`${0}` is unset and the home directory is unknown")]
    NoDirectory(&'static str),

    /// 读取目录映射文件错误.
    #[error("cannot load folder map: {0}")]
    FolderMap(#[from] FolderMapError),
}

/// 非空的环境变量值优先, 否则为 `$HOME/dataset/sunnybrook/{fallback}`.
fn resolve_dir(value: Option<String>, fallback: &str) -> Option<PathBuf> {
    match value {
        Some(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => contour_berry::dataset::home_dataset_dir_with([DATASET_SUBDIR, fallback]),
    }
}

/// 读取环境变量 `var`; 为空或未设置时返回 `$HOME/dataset/sunnybrook/{fallback}`.
pub fn dir_from_env_or_home(var: &'static str, fallback: &str) -> Result<PathBuf, LoaderError> {
    resolve_dir(env::var(var).ok(), fallback).ok_or(LoaderError::NoDirectory(var))
}

/// 获取轮廓根目录.
///
/// 1. 若环境变量 `$CONTOUR_ROOT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/sunnybrook/contourfiles`.
#[inline]
pub fn contour_dir_from_env_or_home() -> Result<PathBuf, LoaderError> {
    dir_from_env_or_home("CONTOUR_ROOT_DIR", "contourfiles")
}

/// 获取影像根目录.
///
/// 1. 若环境变量 `$IMAGE_ROOT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/sunnybrook/images`.
#[inline]
pub fn image_dir_from_env_or_home() -> Result<PathBuf, LoaderError> {
    dir_from_env_or_home("IMAGE_ROOT_DIR", "images")
}

/// 获取 npz 输出目录.
///
/// 1. 若环境变量 `$DATASET_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/sunnybrook/npz`.
#[inline]
pub fn output_dir_from_env_or_home() -> Result<PathBuf, LoaderError> {
    dir_from_env_or_home("DATASET_OUTPUT_DIR", "npz")
}

/// 获取目录映射文件.
///
/// 1. 若环境变量 `$FOLDER_MAP_FILE` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/sunnybrook/link.csv`.
#[inline]
pub fn folder_map_file_from_env_or_home() -> Result<PathBuf, LoaderError> {
    dir_from_env_or_home("FOLDER_MAP_FILE", "link.csv")
}

/// 使用给定目录与映射文件构造提取器. 影像为 `<index>.dcm`, 事件转发到 `log`.
pub fn extractor<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    contour_root: P,
    image_root: Q,
    folder_map_file: R,
    on_error: ErrorAction,
) -> Result<ContourExtractor, LoaderError> {
    let folder_map = load_folder_map(folder_map_file.as_ref())?;
    log::info!(
        "{} subject folder(s) mapped by {}",
        folder_map.len(),
        folder_map_file.as_ref().display()
    );
    let mut config = ExtractorConfig::new(
        contour_root.as_ref(),
        image_root.as_ref(),
        folder_map,
    );
    config.on_error = on_error;
    Ok(ContourExtractor::new(config)
        .with_image_resolver(FrameIndexResolver::new(IMAGE_EXT))
        .with_reporter(LogReporter))
}

/// 从环境变量或 `$HOME/dataset/sunnybrook` 下的默认位置构造提取器.
pub fn extractor_from_env_or_home(on_error: ErrorAction) -> Result<ContourExtractor, LoaderError> {
    extractor(
        contour_dir_from_env_or_home()?,
        image_dir_from_env_or_home()?,
        folder_map_file_from_env_or_home()?,
        on_error,
    )
}
