use ndarray::{Axis, Ix2};
use nifti::{InMemNiftiVolume, IntoNdArray, NiftiError, NiftiObject, ReaderOptions};
use std::path::Path;

use super::{DecodeError, DecodedImage, ImageDecoder};

/// nii 格式二维切片解码器. 像素以 `f32` 保存.
///
/// 体数据按原始值读出, header 中的 `scl_slope` / `scl_inter` 作为重标定参数返回.
///
/// 允许形如 `[W, H]` 或 `[W, H, 1, ...]` 的体数据; 结果转换为 `(H, W)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NiftiDecoder;

impl ImageDecoder for NiftiDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        // 先单独检查可读性, 以便区分 I/O 错误与格式错误.
        std::fs::metadata(path).map_err(|source| DecodeError::Io {
            path: path.to_owned(),
            source,
        })?;

        let classify = |e: NiftiError| match e {
            NiftiError::Io(source) => DecodeError::Io {
                path: path.to_owned(),
                source,
            },
            other => DecodeError::NotAnImage {
                path: path.to_owned(),
                reason: other.to_string(),
            },
        };

        let obj = ReaderOptions::new().read_file(path).map_err(classify)?;
        let header = obj.header();
        let (slope, intercept) = (f64::from(header.scl_slope), f64::from(header.scl_inter));

        // `scl_slope == 0` 时 nifti 不做重标定.
        let mut raw_header = header.clone();
        raw_header.scl_slope = 0.0;
        let raw = obj.into_volume().into_raw_data();
        let mut volume = InMemNiftiVolume::from_raw_data(&raw_header, raw)
            .map_err(classify)?
            .into_ndarray::<f32>()
            .map_err(classify)?;

        // 去掉尾部长度为 1 的维度.
        while volume.ndim() > 2 && volume.shape()[volume.ndim() - 1] == 1 {
            let last = Axis(volume.ndim() - 1);
            volume = volume.index_axis_move(last, 0);
        }
        let shape = volume.shape().to_vec();
        let unsupported = || DecodeError::UnsupportedShape {
            path: path.to_owned(),
            shape: shape.clone(),
        };

        // [W, H] -> [H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = volume
            .into_dimensionality::<Ix2>()
            .map_err(|_| unsupported())?
            .reversed_axes();
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };

        let img = DecodedImage::new(data);
        Ok(if slope.is_finite() && intercept.is_finite() {
            img.with_rescale(slope, intercept)
        } else {
            img
        })
    }
}
