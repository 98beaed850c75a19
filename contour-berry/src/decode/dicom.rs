use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::{open_file, DefaultDicomObject};
use dicom_pixeldata::PixelDecoder;
use ndarray::Array2;
use std::path::Path;

use super::{DecodeError, DecodedImage, ImageDecoder};
use crate::ChannelData;

/// DICOM 解码器. 只取第一帧的单通道灰度像素.
///
/// 8 位像素保存为 `u8`; 16 位像素按 `PixelRepresentation` 保存为 `u16` 或 `i16`.
/// 若存在 `RescaleSlope` / `RescaleIntercept`, 则作为重标定参数返回.
#[derive(Debug, Default, Clone, Copy)]
pub struct DicomDecoder;

/// 读取一个整数属性.
fn attribute(obj: &DefaultDicomObject, tag: Tag) -> Result<usize, String> {
    obj.element(tag)
        .map_err(|e| e.to_string())?
        .to_int::<u32>()
        .map(|v| v as usize)
        .map_err(|e| format!("bad attribute {tag}: {e}"))
}

/// 读取一个可选的浮点属性. 不存在或无法解析时返回 `None`.
fn optional_float(obj: &DefaultDicomObject, tag: Tag) -> Option<f64> {
    obj.element(tag).ok()?.to_float64().ok()
}

impl ImageDecoder for DicomDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        std::fs::metadata(path).map_err(|source| DecodeError::Io {
            path: path.to_owned(),
            source,
        })?;
        let not_an_image = |reason: String| DecodeError::NotAnImage {
            path: path.to_owned(),
            reason,
        };

        let obj = open_file(path).map_err(|e| not_an_image(e.to_string()))?;
        let rows = attribute(&obj, tags::ROWS).map_err(not_an_image)?;
        let cols = attribute(&obj, tags::COLUMNS).map_err(not_an_image)?;
        let samples = attribute(&obj, tags::SAMPLES_PER_PIXEL).map_err(not_an_image)?;
        let bits = attribute(&obj, tags::BITS_ALLOCATED).map_err(not_an_image)?;
        let signed = attribute(&obj, tags::PIXEL_REPRESENTATION).map_err(not_an_image)? == 1;
        if samples != 1 {
            return Err(DecodeError::UnsupportedShape {
                path: path.to_owned(),
                shape: vec![rows, cols, samples],
            });
        }

        let decoded = obj
            .decode_pixel_data()
            .map_err(|e| not_an_image(e.to_string()))?;
        let n = rows * cols;
        let truncated = || not_an_image(format!("pixel data shorter than {rows}x{cols}"));
        let shaped = |e: ndarray::ShapeError| not_an_image(e.to_string());

        let pixels = match bits {
            8 => {
                let frame = decoded.data().get(..n).ok_or_else(truncated)?;
                let v = frame.to_vec();
                ChannelData::U8(Array2::from_shape_vec((rows, cols), v).map_err(shaped)?)
            }
            16 => {
                let frame = decoded.data().get(..n * 2).ok_or_else(truncated)?;
                let words = frame.chunks_exact(2).map(|b| [b[0], b[1]]);
                if signed {
                    let v = words.map(i16::from_le_bytes).collect();
                    ChannelData::I16(Array2::from_shape_vec((rows, cols), v).map_err(shaped)?)
                } else {
                    let v = words.map(u16::from_le_bytes).collect();
                    ChannelData::U16(Array2::from_shape_vec((rows, cols), v).map_err(shaped)?)
                }
            }
            other => return Err(not_an_image(format!("unsupported BitsAllocated {other}"))),
        };

        let img = DecodedImage::new(pixels);
        let slope = optional_float(&obj, tags::RESCALE_SLOPE);
        let intercept = optional_float(&obj, tags::RESCALE_INTERCEPT);
        Ok(match (slope, intercept) {
            (Some(slope), Some(intercept)) => img.with_rescale(slope, intercept),
            _ => img,
        })
    }
}
