use image::{DynamicImage, GenericImageView, ImageError};
use ndarray::Array2;
use std::path::Path;

use super::{DecodeError, DecodedImage, ImageDecoder};
use crate::ChannelData;

/// 常见栅格图像 (png, tiff, bmp 等) 解码器.
///
/// 8-bit 灰度图保持 `u8`, 其余格式统一转换为 16-bit 灰度. 不携带重标定参数.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let img = image::open(path).map_err(|e| match e {
            ImageError::IoError(source) => DecodeError::Io {
                path: path.to_owned(),
                source,
            },
            other => DecodeError::NotAnImage {
                path: path.to_owned(),
                reason: other.to_string(),
            },
        })?;

        let (width, height) = img.dimensions();
        let shape = (height as usize, width as usize);
        let unsupported = || DecodeError::UnsupportedShape {
            path: path.to_owned(),
            shape: vec![shape.0, shape.1],
        };

        let pixels = match img {
            DynamicImage::ImageLuma8(buf) => ChannelData::U8(
                Array2::from_shape_vec(shape, buf.into_raw()).map_err(|_| unsupported())?,
            ),
            DynamicImage::ImageLuma16(buf) => ChannelData::U16(
                Array2::from_shape_vec(shape, buf.into_raw()).map_err(|_| unsupported())?,
            ),
            other => ChannelData::U16(
                Array2::from_shape_vec(shape, other.to_luma16().into_raw())
                    .map_err(|_| unsupported())?,
            ),
        };
        Ok(DecodedImage::new(pixels))
    }
}
