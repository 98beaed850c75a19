//! 通道的可视化预览.

use image::{GrayImage, ImageResult, Luma};
use std::path::Path;

use super::ChannelData;

/// 单通道黑色.
const BLACK: u8 = 0b_0000_0000;

/// 单通道白色.
const WHITE: u8 = 0b_1111_1111;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 图像将以 "可视化友好" 的方式保存, 而不是 "as is" 的方式:
/// 掩码中的前景为白色, 背景为黑色; 影像按自身的最小/最大值线性拉伸到 8-bit 灰度.
/// 如需按原样保存, 应使用 [`crate::dataset::archive`].
pub trait ImgWriteVis {
    /// 按照可视化规则将图片保存到 `path` 路径. 格式由扩展名决定.
    fn save_vis<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

impl ImgWriteVis for ChannelData {
    fn save_vis<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = GrayImage::new(width as u32, height as u32);
        match self {
            ChannelData::Bool(m) => {
                for ((h, w), &pix) in m.indexed_iter() {
                    let gray = if pix { WHITE } else { BLACK };
                    buf.put_pixel(w as u32, h as u32, Luma([gray]));
                }
            }
            _ => {
                let values = self.to_f32();
                let (lo, hi) = values
                    .iter()
                    .filter(|v| v.is_finite())
                    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                let span = hi - lo;
                for ((h, w), &v) in values.indexed_iter() {
                    buf.put_pixel(w as u32, h as u32, Luma([stretch(v, lo, span)]));
                }
            }
        }
        buf.save(path)
    }
}

/// 将 `v` 从 `[lo, lo + span]` 线性映射到 `[0, 255]`. 常量图像映射为黑色.
#[inline]
fn stretch(v: f32, lo: f32, span: f32) -> u8 {
    if !v.is_finite() || !span.is_finite() || span <= 0.0 {
        return BLACK;
    }
    // 255, not 256.
    (((v - lo) / span).clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::{stretch, ImgWriteVis};
    use crate::ChannelData;
    use ndarray::array;

    #[test]
    fn test_stretch() {
        assert_eq!(stretch(0.0, 0.0, 100.0), 0);
        assert_eq!(stretch(100.0, 0.0, 100.0), 255);
        assert_eq!(stretch(50.0, 0.0, 100.0), 128);
        assert_eq!(stretch(f32::NAN, 0.0, 100.0), 0);
        assert_eq!(stretch(3.0, 3.0, 0.0), 0);
    }

    #[test]
    fn test_save_mask_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let mask = ChannelData::from(array![[true, false, false], [false, true, true]]);
        mask.save_vis(&path).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [0]);
        assert_eq!(img.get_pixel(2, 1).0, [255]);
    }

    #[test]
    fn test_save_image_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        let scan = ChannelData::from(array![[100u16, 300], [200, 300]]);
        scan.save_vis(&path).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(img.get_pixel(0, 1).0, [128]);
    }
}
