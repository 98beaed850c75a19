//! npz 格式的样本持久化.
//!
//! 每个通道保存为一个与通道同名的数组. 另有以下元数据, 均为 UTF-8 字节组成的 `u8` 一维数组:
//!
//! + `metadata/_data_keys`: 逗号分隔的通道名, 顺序即通道顺序.
//! + `metadata/_data_types`: 逗号分隔的元素类型标签, 与通道名一一对应.
//! + `metadata/sources/<通道名>`: 该通道的来源文件路径.
//!
//! `ndarray-npy` 写入时会为每个条目追加 `.npy` 后缀; 读取时两种写法都接受.

use itertools::Itertools;
use ndarray::{Array1, Ix1, Ix2, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError, WriteNpzError};
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::consts::{channel, ARCHIVE_EXT, METADATA_SEP};
use crate::{ChannelData, Dataset, ElemKind, Sample, SourceMap};

/// 通道名列表条目.
const KEYS_ENTRY: &str = "metadata/_data_keys";

/// 元素类型列表条目.
const TYPES_ENTRY: &str = "metadata/_data_types";

/// 来源表条目前缀.
const SOURCES_PREFIX: &str = "metadata/sources/";

/// 元数据条目前缀. 通道名不能以此开头.
const METADATA_PREFIX: &str = "metadata/";

/// npy 后缀.
const NPY_SUFFIX: &str = ".npy";

/// 持久化错误.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// 底层 I/O 错误.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// 文件或目录.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: io::Error,
    },

    /// 写入 npz 错误.
    #[error("cannot write {}: {source}", .path.display())]
    WriteNpz {
        /// npz 文件.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: WriteNpzError,
    },

    /// 读取 npz 错误.
    #[error("cannot read {}: {source}", .path.display())]
    ReadNpz {
        /// npz 文件.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: ReadNpzError,
    },

    /// 缺少元数据条目.
    #[error("{} lacks metadata entry `{entry}`", .path.display())]
    MissingMetadata {
        /// npz 文件.
        path: PathBuf,
        /// 条目名.
        entry: String,
    },

    /// 通道名与类型标签个数不一致.
    #[error("{} declares {keys} channel(s) but {types} type tag(s)", .path.display())]
    MetadataMismatch {
        /// npz 文件.
        path: PathBuf,
        /// 通道名个数.
        keys: usize,
        /// 类型标签个数.
        types: usize,
    },

    /// 元数据声明的通道不存在.
    #[error("{} lacks declared channel `{channel}`", .path.display())]
    MissingChannel {
        /// npz 文件.
        path: PathBuf,
        /// 通道名.
        channel: String,
    },

    /// 未知的元素类型标签.
    #[error("{} declares unknown element type `{tag}`", .path.display())]
    UnknownElemType {
        /// npz 文件.
        path: PathBuf,
        /// 类型标签.
        tag: String,
    },

    /// 元数据不是合法的 UTF-8.
    #[error("metadata entry `{entry}` of {} is not valid UTF-8", .path.display())]
    InvalidUtf8 {
        /// npz 文件.
        path: PathBuf,
        /// 条目名.
        entry: String,
    },

    /// 通道名不能持久化 (为空, 含分隔符, 以元数据前缀开头或为保留名).
    #[error("channel name `{0}` cannot be persisted")]
    InvalidChannelName(String),

    /// 来源路径不是合法的 UTF-8.
    #[error("source path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),
}

/// 通道名是否可以写入元数据.
fn is_valid_channel_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(METADATA_SEP)
        && !name.starts_with(METADATA_PREFIX)
        && name != channel::FILENAME
}

/// 将样本写入 `path` 处的 npz 文件 (压缩). 文件已存在时覆盖.
///
/// 数据先写入同目录下的临时文件, 全部成功后才重命名为 `path`;
/// 失败时 `path` 保持原样. 目录不存在时返回 [`PersistError::Io`].
///
/// 来源表中的 `"filename"` 键不写入, 读取时会重新生成.
pub fn save<P: AsRef<Path>>(
    path: P,
    dataset: &Dataset,
    sources: &SourceMap,
) -> Result<(), PersistError> {
    let path = path.as_ref();
    if let Some(bad) = dataset.names().find(|n| !is_valid_channel_name(n)) {
        return Err(PersistError::InvalidChannelName(bad.to_owned()));
    }
    if let Some(bad) = sources
        .keys()
        .find(|n| *n != channel::FILENAME && n.contains(METADATA_SEP))
    {
        return Err(PersistError::InvalidChannelName(bad.clone()));
    }

    let io_err = |source| PersistError::Io {
        path: path.to_owned(),
        source,
    };
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    let write_err = |source| PersistError::WriteNpz {
        path: path.to_owned(),
        source,
    };
    let mut npz = NpzWriter::new_compressed(tmp);

    for (name, data) in dataset.iter() {
        match data {
            ChannelData::Bool(a) => npz.add_array(name, a),
            ChannelData::U8(a) => npz.add_array(name, a),
            ChannelData::U16(a) => npz.add_array(name, a),
            ChannelData::I16(a) => npz.add_array(name, a),
            ChannelData::F32(a) => npz.add_array(name, a),
            ChannelData::F64(a) => npz.add_array(name, a),
        }
        .map_err(write_err)?;
    }

    let keys = dataset.names().join(&METADATA_SEP.to_string());
    let types = dataset
        .iter()
        .map(|(_, d)| d.elem_kind().tag())
        .join(&METADATA_SEP.to_string());
    npz.add_array(KEYS_ENTRY, &utf8_array(&keys)).map_err(write_err)?;
    npz.add_array(TYPES_ENTRY, &utf8_array(&types)).map_err(write_err)?;

    for (name, source) in sources.iter().filter(|(n, _)| *n != channel::FILENAME) {
        let text = source
            .to_str()
            .ok_or_else(|| PersistError::NonUtf8Path(source.clone()))?;
        npz.add_array(format!("{SOURCES_PREFIX}{name}"), &utf8_array(text))
            .map_err(write_err)?;
    }

    let tmp = npz.finish().map_err(write_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    log::debug!("saved {} channel(s) to {}", dataset.len(), path.display());
    Ok(())
}

/// 读取 `path` 处的 npz 文件. 来源表额外包含 `"filename"` 键, 值为 `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Sample, PersistError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PersistError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut archive = Archive::open(path, file)?;

    let keys = archive.read_text(KEYS_ENTRY)?;
    let types = archive.read_text(TYPES_ENTRY)?;
    let keys = split_list(&keys);
    let types = split_list(&types);
    if keys.len() != types.len() {
        return Err(PersistError::MetadataMismatch {
            path: path.to_owned(),
            keys: keys.len(),
            types: types.len(),
        });
    }

    let mut dataset = Dataset::new();
    for (name, tag) in keys.into_iter().zip(types) {
        let kind = ElemKind::from_tag(tag).ok_or_else(|| PersistError::UnknownElemType {
            path: path.to_owned(),
            tag: tag.to_owned(),
        })?;
        let data = archive.read_channel(name, kind)?;
        dataset.insert(name, data);
    }

    let mut sources = SourceMap::new();
    let source_names: Vec<String> = archive
        .names
        .iter()
        .filter_map(|n| n.strip_prefix(SOURCES_PREFIX))
        .map(|n| n.strip_suffix(NPY_SUFFIX).unwrap_or(n).to_owned())
        .collect();
    for name in source_names {
        let text = archive.read_text(&format!("{SOURCES_PREFIX}{name}"))?;
        sources.insert(name, PathBuf::from(text));
    }
    sources.insert(channel::FILENAME.to_owned(), path.to_owned());

    Ok((dataset, sources))
}

/// 列出目录下所有 npz 文件, 按路径排序.
pub fn list_archives<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, PersistError> {
    let dir = dir.as_ref();
    let io_err = |source| PersistError::Io {
        path: dir.to_owned(),
        source,
    };
    let mut ans = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ARCHIVE_EXT) {
            ans.push(path);
        }
    }
    ans.sort_unstable();
    Ok(ans)
}

/// 逗号分隔列表. 空串表示空列表.
fn split_list(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(METADATA_SEP).collect()
    }
}

#[inline]
fn utf8_array(text: &str) -> Array1<u8> {
    Array1::from(text.as_bytes().to_vec())
}

/// 打开的 npz 文件及其条目名.
struct Archive<'p, R: Read + Seek> {
    path: &'p Path,
    npz: NpzReader<R>,
    names: Vec<String>,
}

impl<'p, R: Read + Seek> Archive<'p, R> {
    fn open(path: &'p Path, reader: R) -> Result<Self, PersistError> {
        let read_err = |source| PersistError::ReadNpz {
            path: path.to_owned(),
            source,
        };
        let mut npz = NpzReader::new(reader).map_err(read_err)?;
        let names = npz.names().map_err(read_err)?;
        Ok(Self { path, npz, names })
    }

    /// 实际条目名: 优先 `<name>.npy`, 其次 `<name>`.
    fn entry(&self, name: &str) -> Option<String> {
        let with_suffix = format!("{name}{NPY_SUFFIX}");
        if self.names.contains(&with_suffix) {
            Some(with_suffix)
        } else if self.names.iter().any(|n| n == name) {
            Some(name.to_owned())
        } else {
            None
        }
    }

    #[inline]
    fn read_err(&self, source: ReadNpzError) -> PersistError {
        PersistError::ReadNpz {
            path: self.path.to_owned(),
            source,
        }
    }

    fn read_text(&mut self, name: &str) -> Result<String, PersistError> {
        let entry = self.entry(name).ok_or_else(|| PersistError::MissingMetadata {
            path: self.path.to_owned(),
            entry: name.to_owned(),
        })?;
        let bytes = self
            .npz
            .by_name::<OwnedRepr<u8>, Ix1>(&entry)
            .map_err(|e| self.read_err(e))?;
        String::from_utf8(bytes.to_vec()).map_err(|_| PersistError::InvalidUtf8 {
            path: self.path.to_owned(),
            entry: name.to_owned(),
        })
    }

    fn read_channel(&mut self, name: &str, kind: ElemKind) -> Result<ChannelData, PersistError> {
        let entry = self.entry(name).ok_or_else(|| PersistError::MissingChannel {
            path: self.path.to_owned(),
            channel: name.to_owned(),
        })?;
        let npz = &mut self.npz;
        let ans = match kind {
            ElemKind::Bool => npz.by_name::<OwnedRepr<bool>, Ix2>(&entry).map(ChannelData::from),
            ElemKind::U8 => npz.by_name::<OwnedRepr<u8>, Ix2>(&entry).map(ChannelData::from),
            ElemKind::U16 => npz.by_name::<OwnedRepr<u16>, Ix2>(&entry).map(ChannelData::from),
            ElemKind::I16 => npz.by_name::<OwnedRepr<i16>, Ix2>(&entry).map(ChannelData::from),
            ElemKind::F32 => npz.by_name::<OwnedRepr<f32>, Ix2>(&entry).map(ChannelData::from),
            ElemKind::F64 => npz.by_name::<OwnedRepr<f64>, Ix2>(&entry).map(ChannelData::from),
        };
        ans.map_err(|e| self.read_err(e))
    }
}
