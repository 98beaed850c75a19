//! 轮廓文件解析与掩码光栅化.
//!
//! 轮廓文件每行是一个 `x y` 坐标对, 其中 `x` 对应图像列, `y` 对应图像行.
//! 光栅化得到的掩码形状为 `(height, width)`, 多边形内部和边界均为 `true`.

mod error;
mod parse;

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use ndarray::Array2;
use num::ToPrimitive;
use std::path::Path;

use crate::{Idx2d, Idx2dF, Mask};

pub use error::ParseError;
pub use parse::{parse_coordinates, read_coordinates};

/// 从轮廓文件读出的有序坐标序列. 不要求闭合.
pub type CoordinateList = Vec<Idx2dF>;

/// 超出该范围的坐标被视为无法光栅化.
const COORD_LIMIT: f64 = (1 << 20) as f64;

/// 轮廓光栅化器. 将坐标序列填充为固定大小的布尔掩码.
#[derive(Debug, Clone, Copy)]
pub struct ContourRasterizer {
    /// `(height, width)`
    target_size: Idx2d,

    /// 是否要求首点等于末点.
    require_closed: bool,
}

impl ContourRasterizer {
    /// 以 `target_size` (`(height, width)`) 为掩码大小创建光栅化器. 默认不要求轮廓闭合.
    ///
    /// 如果 `target_size` 的任一维为 0 或超出 `u32` 范围, 则程序 panic.
    pub fn new(target_size: Idx2d) -> Self {
        assert!(
            Self::is_valid_size(target_size),
            "invalid target size {target_size:?}"
        );
        Self {
            target_size,
            require_closed: false,
        }
    }

    /// `target_size` 能否用于创建光栅化器: 两维都非零且不超出 `u32` 范围.
    #[inline]
    pub fn is_valid_size((h, w): Idx2d) -> bool {
        h > 0 && w > 0 && h <= u32::MAX as usize && w <= u32::MAX as usize
    }

    /// 设置是否要求轮廓闭合 (首点等于末点).
    #[inline]
    pub fn require_closed(mut self, yes: bool) -> Self {
        self.require_closed = yes;
        self
    }

    /// 掩码大小 `(height, width)`.
    #[inline]
    pub fn target_size(&self) -> Idx2d {
        self.target_size
    }

    /// 坐标序列是否可以光栅化: 至少两个点, 均为有限值;
    /// 要求闭合时首点必须等于末点.
    pub fn is_valid(&self, coords: &[Idx2dF]) -> bool {
        coords.len() >= 2
            && coords.iter().all(|(x, y)| x.is_finite() && y.is_finite())
            && (!self.require_closed || coords.first() == coords.last())
    }

    /// 将多边形内部 (含边界) 填充为掩码. 画布外的部分被裁掉.
    ///
    /// 坐标序列不合法时返回 `None`, 这不是错误, 调用者应将其视为通道缺失.
    pub fn rasterize(&self, coords: &[Idx2dF]) -> Option<Mask> {
        if !self.is_valid(coords) {
            return None;
        }
        let poly = pixel_polygon(coords)?;
        let (h, w) = self.target_size;
        let mut canvas = GrayImage::new(w as u32, h as u32);
        match poly.as_slice() {
            [] => return None,
            // 所有点都落在同一像素上.
            [p] => {
                if (0..w as i32).contains(&p.x) && (0..h as i32).contains(&p.y) {
                    canvas.put_pixel(p.x as u32, p.y as u32, Luma([1]));
                }
            }
            _ => draw_polygon_mut(&mut canvas, &poly, Luma([1])),
        }
        let mask = Array2::from_shape_vec((h, w), canvas.into_raw())
            .ok()?
            .mapv(|v| v != 0);
        Some(mask)
    }

    /// 读取 `path` 处的轮廓文件并光栅化.
    ///
    /// 文件格式错误时返回 `Err`; 文件格式正确但轮廓不合法时返回 `Ok(None)`.
    pub fn load_mask<P: AsRef<Path>>(&self, path: P) -> Result<Option<Mask>, ParseError> {
        let coords = read_coordinates(path)?;
        Ok(self.rasterize(&coords))
    }
}

/// 将坐标四舍五入到像素, 合并相邻重复点, 并去掉与首点重合的闭合点.
///
/// `imageproc` 要求多边形首末点不同.
fn pixel_polygon(coords: &[Idx2dF]) -> Option<Vec<Point<i32>>> {
    let to_pixel = |v: f64| -> Option<i32> {
        if v.abs() > COORD_LIMIT {
            return None;
        }
        v.round().to_i32()
    };

    let mut poly: Vec<Point<i32>> = Vec::with_capacity(coords.len());
    for &(x, y) in coords {
        let p = Point::new(to_pixel(x)?, to_pixel(y)?);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    Some(poly)
}
