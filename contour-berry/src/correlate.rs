//! 路径关联: 从主轮廓文件路径推导影像路径、次级轮廓路径以及输出路径.
//!
//! 轮廓文件路径的约定形如 `<root>/<subject>/<contour-type>/<filename>`, 例如
//! `contourfiles/SC-HF-I-1/i-contours/IM-0001-0048-icontour-manual.txt`.
//! 三种推导各自是一个 trait, 库提供按 Sunnybrook 命名习惯实现的默认策略;
//! 调用者可以换成自己的实现, 不需要改动提取器.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::consts::{contour_token, ARCHIVE_EXT, DEFAULT_IMAGE_EXT};
use crate::SourceMap;

/// 轮廓受试者目录名 -> 影像受试者目录名.
pub type FolderMap = BTreeMap<String, String>;

/// `IM-0001-0048-icontour-manual.txt` 中的帧序号.
static FRAME_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IM-0001-(\d{4})-[io]contour.*?\.txt").expect("valid regex"));

/// `IM-0001-0048-icontour-manual.txt` 中的 `IM-0001-0048` 前缀.
static FRAME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(IM-\d{4}-\d{4})-.*\.txt").expect("valid regex"));

/// 轮廓文件路径的各个组成部分.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourPathParts<'a> {
    /// 轮廓根目录 (可能为空路径).
    pub root: &'a Path,
    /// 受试者目录名.
    pub folder: &'a str,
    /// 轮廓类型目录名.
    pub contour_type: &'a str,
    /// 文件名.
    pub filename: &'a str,
}

/// 拆分轮廓文件路径. 路径层级不足或包含非 UTF-8 片段时返回 `None`.
pub fn split_contour_path(path: &Path) -> Option<ContourPathParts<'_>> {
    let filename = path.file_name()?.to_str()?;
    let type_dir = path.parent()?;
    let contour_type = type_dir.file_name()?.to_str()?;
    let folder_dir = type_dir.parent()?;
    let folder = folder_dir.file_name()?.to_str()?;
    let root = folder_dir.parent()?;
    Some(ContourPathParts {
        root,
        folder,
        contour_type,
        filename,
    })
}

/// 由主轮廓文件推导影像文件路径.
pub trait ImagePathResolver: Send + Sync {
    /// 推导不出时返回 `None`.
    fn resolve(&self, image_root: &Path, contour: &Path, folder_map: &FolderMap)
        -> Option<PathBuf>;
}

/// 由主轮廓文件推导另一种类型的轮廓文件路径.
pub trait SecondaryPathResolver: Send + Sync {
    /// 推导不出, 或推导出的文件不存在时返回 `None`.
    fn resolve(&self, secondary_type: &str, primary: &Path) -> Option<PathBuf>;
}

/// 推导样本的 npz 输出路径.
pub trait OutputPathResolver: Send + Sync {
    /// 推导不出时返回 `None`.
    fn resolve(&self, output_dir: &Path, contour: &Path, sources: &SourceMap) -> Option<PathBuf>;
}

/// 默认影像路径策略.
///
/// 文件名中 `IM-0001-` 之后的 4 位帧序号去掉前导零后作为影像文件名:
/// `<image_root>/<folder_map[subject]>/<index>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIndexResolver {
    extension: String,
}

impl FrameIndexResolver {
    /// 指定影像扩展名 (不含 `.`).
    #[inline]
    pub fn new<S: Into<String>>(extension: S) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// 影像扩展名.
    #[inline]
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Default for FrameIndexResolver {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_EXT)
    }
}

impl ImagePathResolver for FrameIndexResolver {
    fn resolve(
        &self,
        image_root: &Path,
        contour: &Path,
        folder_map: &FolderMap,
    ) -> Option<PathBuf> {
        let parts = split_contour_path(contour)?;
        let image_folder = folder_map.get(parts.folder)?;
        let caps = FRAME_INDEX.captures(parts.filename)?;
        let index: u32 = caps[1].parse().ok()?;

        let mut ans = image_root.join(image_folder);
        ans.push(format!("{index}.{}", self.extension));
        Some(ans)
    }
}

/// 默认次级轮廓策略: 同时替换轮廓类型目录和文件名中的类型片段
/// (`i-contours` <-> `icontour`, `o-contours` <-> `ocontour`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ContourTypeSwap;

impl SecondaryPathResolver for ContourTypeSwap {
    fn resolve(&self, secondary_type: &str, primary: &Path) -> Option<PathBuf> {
        let parts = split_contour_path(primary)?;
        let filename = match (contour_token(parts.contour_type), contour_token(secondary_type)) {
            (Some(from), Some(to)) => parts.filename.replace(from, to),
            _ => parts.filename.to_owned(),
        };

        let mut ans = parts.root.join(parts.folder);
        ans.push(secondary_type);
        ans.push(filename);
        ans.is_file().then_some(ans)
    }
}

/// 默认输出路径策略: `<output_dir>/<subject>-IM-0001-0048-image-contours.npz`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FramePrefixNamer;

impl OutputPathResolver for FramePrefixNamer {
    fn resolve(&self, output_dir: &Path, contour: &Path, _sources: &SourceMap) -> Option<PathBuf> {
        let parts = split_contour_path(contour)?;
        let caps = FRAME_PREFIX.captures(parts.filename)?;
        Some(output_dir.join(format!(
            "{}-{}-image-contours.{ARCHIVE_EXT}",
            parts.folder, &caps[1]
        )))
    }
}

/// 读取目录映射文件错误.
#[derive(Debug, thiserror::Error)]
pub enum FolderMapError {
    /// csv 读取错误.
    #[error("cannot read folder map: {0}")]
    Csv(#[from] csv::Error),

    /// 缺少必需的列.
    #[error("folder map lacks column `{0}`")]
    MissingColumn(&'static str),
}

/// 影像目录列名.
const IMAGE_FOLDER_COLUMN: &str = "patient_id";

/// 轮廓目录列名.
const CONTOUR_FOLDER_COLUMN: &str = "original_id";

/// 从 `link.csv` 形式的文件读取目录映射.
///
/// 文件必须包含 `patient_id` (影像目录) 和 `original_id` (轮廓目录) 两列, 列顺序任意.
/// 两列任一为空的行被忽略.
pub fn load_folder_map<P: AsRef<Path>>(path: P) -> Result<FolderMap, FolderMapError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(FolderMapError::MissingColumn(name))
    };
    let image_col = column(IMAGE_FOLDER_COLUMN)?;
    let contour_col = column(CONTOUR_FOLDER_COLUMN)?;

    let mut ans = FolderMap::new();
    for record in reader.records() {
        let record = record?;
        let image = record.get(image_col).map(str::trim).unwrap_or_default();
        let contour = record.get(contour_col).map(str::trim).unwrap_or_default();
        if !image.is_empty() && !contour.is_empty() {
            ans.insert(contour.to_owned(), image.to_owned());
        }
    }
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;

    fn folder_map() -> FolderMap {
        [("SC-HF-I-1".to_string(), "SCD0000101".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_split_contour_path() {
        let p =
            Path::new("data/contourfiles/SC-HF-I-1/i-contours/IM-0001-0048-icontour-manual.txt");
        let parts = split_contour_path(p).unwrap();
        assert_eq!(parts.root, Path::new("data/contourfiles"));
        assert_eq!(parts.folder, "SC-HF-I-1");
        assert_eq!(parts.contour_type, "i-contours");
        assert_eq!(parts.filename, "IM-0001-0048-icontour-manual.txt");

        assert!(split_contour_path(Path::new("file.txt")).is_none());
    }

    #[test]
    fn test_frame_index_resolver() {
        let r = FrameIndexResolver::default();
        let root = Path::new("/data/images");
        let map = folder_map();

        let p = Path::new("/c/SC-HF-I-1/i-contours/IM-0001-0048-icontour-manual.txt");
        assert_eq!(
            r.resolve(root, p, &map),
            Some(PathBuf::from("/data/images/SCD0000101/48.png"))
        );

        let p = Path::new("/c/SC-HF-I-1/o-contours/IM-0001-0220-ocontour-manual.txt");
        let r = FrameIndexResolver::new("nii");
        assert_eq!(
            r.resolve(root, p, &map),
            Some(PathBuf::from("/data/images/SCD0000101/220.nii"))
        );
        assert_eq!(r.extension(), "nii");

        // 未映射的受试者.
        let p = Path::new("/c/SC-HF-I-2/i-contours/IM-0001-0048-icontour-manual.txt");
        assert_eq!(r.resolve(root, p, &map), None);

        // 文件名不符合约定.
        let p = Path::new("/c/SC-HF-I-1/i-contours/IM-0001-48-icontour-manual.txt");
        assert_eq!(r.resolve(root, p, &map), None);
        let p = Path::new("/c/SC-HF-I-1/i-contours/IM-0001-0048-pcontour-manual.txt");
        assert_eq!(r.resolve(root, p, &map), None);
    }

    #[test]
    fn test_contour_type_swap() {
        let fx = Fixture::new();
        let square = crate::fixture::square(1.0, 4.0);
        let primary = fx.write_contour("o-contours", 48, &square);
        let secondary = fx.write_contour("i-contours", 48, &square);

        assert_eq!(ContourTypeSwap.resolve("i-contours", &primary), Some(secondary.clone()));
        assert_eq!(ContourTypeSwap.resolve("o-contours", &secondary), Some(primary.clone()));

        // 文件不存在.
        let lonely = fx.write_contour("o-contours", 59, &square);
        assert_eq!(ContourTypeSwap.resolve("i-contours", &lonely), None);
    }

    #[test]
    fn test_frame_prefix_namer() {
        let p = Path::new("/c/SC-HF-I-1/i-contours/IM-0001-0048-icontour-manual.txt");
        assert_eq!(
            FramePrefixNamer.resolve(Path::new("/out"), p, &SourceMap::new()),
            Some(PathBuf::from("/out/SC-HF-I-1-IM-0001-0048-image-contours.npz"))
        );
        let p = Path::new("/c/SC-HF-I-1/i-contours/readme.txt");
        assert_eq!(FramePrefixNamer.resolve(Path::new("/out"), p, &SourceMap::new()), None);
    }

    #[test]
    fn test_load_folder_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("link.csv");
        std::fs::write(
            &path,
            "patient_id,original_id\nSCD0000101,SC-HF-I-1\nSCD0000201,SC-HF-I-2\n,SC-HF-I-3\n",
        )
        .unwrap();
        let map = load_folder_map(&path).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["SC-HF-I-1"], "SCD0000101");
        assert_eq!(map["SC-HF-I-2"], "SCD0000201");

        std::fs::write(&path, "patient,original_id\nSCD0000101,SC-HF-I-1\n").unwrap();
        assert!(matches!(
            load_folder_map(&path),
            Err(FolderMapError::MissingColumn("patient_id"))
        ));
    }
}
