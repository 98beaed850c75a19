//! 影像解码.
//!
//! 支持 png 等常见位图、nii 以及 DICOM (`dicom` feature).
//!
//! 解码器返回原始像素和可选的线性重标定参数. 只有当 slope 和 intercept
//! 都存在且都非零时才应用 `value * slope + intercept`, 结果为 `f64`.

mod nii;
mod raster;

cfg_if::cfg_if! {
    if #[cfg(feature = "dicom")] {
        mod dicom;
        pub use dicom::DicomDecoder;
    }
}

use std::io;
use std::path::{Path, PathBuf};

use crate::ChannelData;

pub use nii::NiftiDecoder;
pub use raster::RasterDecoder;

/// 影像解码错误. "不是合法影像" 与 "I/O 失败" 被明确区分.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// 底层 I/O 错误 (包括文件不存在).
    #[error("cannot read image {}: {source}", .path.display())]
    Io {
        /// 影像文件.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: io::Error,
    },

    /// 文件可读, 但不是可解码的影像.
    #[error("{} is not a valid image: {reason}", .path.display())]
    NotAnImage {
        /// 影像文件.
        path: PathBuf,
        /// 解码器给出的原因.
        reason: String,
    },

    /// 影像不是二维的.
    #[error("{} has unsupported shape {shape:?}", .path.display())]
    UnsupportedShape {
        /// 影像文件.
        path: PathBuf,
        /// 实际形状.
        shape: Vec<usize>,
    },
}

/// 解码结果.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// 原始像素, 形状为 `(height, width)`.
    pub pixels: ChannelData,

    /// 重标定斜率.
    pub slope: Option<f64>,

    /// 重标定截距.
    pub intercept: Option<f64>,
}

impl DecodedImage {
    /// 不带重标定参数的解码结果.
    #[inline]
    pub fn new<D: Into<ChannelData>>(pixels: D) -> Self {
        Self {
            pixels: pixels.into(),
            slope: None,
            intercept: None,
        }
    }

    /// 附加重标定参数.
    #[inline]
    pub fn with_rescale(mut self, slope: f64, intercept: f64) -> Self {
        self.slope = Some(slope);
        self.intercept = Some(intercept);
        self
    }

    /// 得到最终的通道数据. 仅当 slope 和 intercept 都存在且非零时重标定.
    pub fn into_channel(self) -> ChannelData {
        match (self.slope, self.intercept) {
            (Some(slope), Some(intercept)) if slope != 0.0 && intercept != 0.0 => {
                ChannelData::F64(self.pixels.rescale(slope, intercept))
            }
            _ => self.pixels,
        }
    }
}

/// 影像解码器.
pub trait ImageDecoder: Send + Sync {
    /// 解码 `path` 处的影像.
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

/// 按扩展名分派: `.nii` / `.nii.gz` 交给 [`NiftiDecoder`], `.dcm` 交给 `DicomDecoder`
/// (需要 `dicom` feature), 其余交给 [`RasterDecoder`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDecoder;

impl ImageDecoder for AutoDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        if is_nifti(path) {
            NiftiDecoder.decode(path)
        } else if is_dicom(path) {
            decode_dicom(path)
        } else {
            RasterDecoder.decode(path)
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "dicom")] {
        #[inline]
        fn decode_dicom(path: &Path) -> Result<DecodedImage, DecodeError> {
            DicomDecoder.decode(path)
        }
    } else {
        fn decode_dicom(path: &Path) -> Result<DecodedImage, DecodeError> {
            Err(DecodeError::NotAnImage {
                path: path.to_owned(),
                reason: "DICOM support requires the `dicom` feature".to_string(),
            })
        }
    }
}

/// 文件名是否以 `.nii` 或 `.nii.gz` 结尾 (不区分大小写).
fn is_nifti(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_ascii_lowercase())
        .is_some_and(|n| n.ends_with(".nii") || n.ends_with(".nii.gz"))
}

/// 扩展名是否为 `dcm` (不区分大小写).
fn is_dicom(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("dcm"))
}

#[cfg(test)]
mod tests {
    use super::{is_dicom, is_nifti, AutoDecoder, DecodeError, DecodedImage, ImageDecoder};
    use crate::ChannelData;
    use ndarray::array;
    use std::path::Path;

    #[test]
    fn test_rescale_needs_both_nonzero() {
        let raw = array![[1u16, 2]];

        let img = DecodedImage::new(raw.clone()).with_rescale(2.0, 10.0);
        assert_eq!(img.into_channel(), ChannelData::F64(array![[12.0, 14.0]]));

        // 任一为零都不重标定.
        let img = DecodedImage::new(raw.clone()).with_rescale(2.0, 0.0);
        assert_eq!(img.into_channel(), ChannelData::U16(raw.clone()));
        let img = DecodedImage::new(raw.clone()).with_rescale(0.0, 10.0);
        assert_eq!(img.into_channel(), ChannelData::U16(raw.clone()));

        let img = DecodedImage::new(raw.clone());
        assert_eq!(img.into_channel(), ChannelData::U16(raw));
    }

    #[test]
    fn test_is_nifti() {
        assert!(is_nifti(Path::new("a/b/48.nii")));
        assert!(is_nifti(Path::new("a/b/48.NII.GZ")));
        assert!(!is_nifti(Path::new("a/b/48.png")));
        assert!(!is_nifti(Path::new("a/b/nii")));

        assert!(is_dicom(Path::new("a/b/48.dcm")));
        assert!(is_dicom(Path::new("a/b/48.DCM")));
        assert!(!is_dicom(Path::new("a/b/dcm")));
        assert!(!is_dicom(Path::new("a/b/48.nii")));
    }

    #[test]
    fn test_auto_decoder_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("1.png");
        image::GrayImage::from_pixel(4, 3, image::Luma([9])).save(&png).unwrap();
        let img = AutoDecoder.decode(&png).unwrap();
        assert_eq!(img.pixels, ChannelData::U8(ndarray::Array2::from_elem((3, 4), 9)));

        // nifti 解码器处理不存在的文件, 返回 I/O 错误.
        let err = AutoDecoder.decode(&dir.path().join("1.nii")).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }), "{err}");
    }
}
