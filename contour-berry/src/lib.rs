#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 将心脏 MRI 影像与手绘轮廓文件配对, 生成经过校验、通道对齐的训练数据集.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 目前主要按照 Sunnybrook 心脏数据集的目录与命名习惯组织
//!   (`IM-0001-0048-icontour-manual.txt` 一类的轮廓文件名). 其他命名习惯可以通过替换
//!   [`correlate`] 中的策略对象来适配, 不需要改动提取器本身.
//! 2. 库本身只通过 `log` 门面输出诊断信息, 不负责初始化任何 logger.
//!
//! # 开发计划
//!
//! ### 路径关联 ✅
//!
//! 从主轮廓文件路径推导影像路径、次级轮廓路径和输出路径. 每种推导都是可替换的策略.
//!
//! 实现位于 `contour-berry/src/correlate.rs`.
//!
//! ### 轮廓解析与光栅化 ✅
//!
//! 解析坐标文本, 将多边形填充为固定大小的布尔掩码.
//! 是否要求轮廓闭合 (首点等于末点) 是一个可配置选项, 默认不要求.
//!
//! 实现位于 `contour-berry/src/contour`.
//!
//! ### 影像解码 ✅
//!
//! nifti 与常见栅格图像 (png, tiff 等). 线性重标定 (slope/intercept)
//! 只在二者均非零时应用.
//!
//! 实现位于 `contour-berry/src/decode`.
//!
//! ### 数据集校验 ✅
//!
//! 通道形状一致性, 以及内轮廓必须完全落在外轮廓内部.
//!
//! 实现位于 `contour-berry/src/validate.rs`.
//!
//! ### 提取器 ✅
//!
//! 惰性数据流 + 有界持久化. 打开 `rayon` feature 后提供并行持久化.
//!
//! 实现位于 `contour-berry/src/extract`.
//!
//! ### npz 持久化与批次生成 ✅
//!
//! 实现位于 `contour-berry/src/dataset`.
//!
//! ### 缩放 / 填充 / 裁剪 ⌛️
//!
//! [`dataset::batch::BatchConfig`] 中保留了目标尺寸, 但目前不做任何几何变换.

/// 二维索引 `(height, width)`, 同时也用作二维形状.
pub type Idx2d = (usize, usize);

/// 高精度二维坐标 `(x, y)`. `x` 对应列, `y` 对应行.
pub type Idx2dF = (f64, f64);

pub mod consts;
pub mod contour;
pub mod correlate;
pub mod data;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod extract;
pub mod prelude;
pub mod report;
pub mod validate;

pub use data::{ChannelData, Dataset, ElemKind, ImgWriteVis, Mask, Sample, SourceMap};
pub use extract::{ContourExtractor, ExtractorConfig, PersistSummary};

#[cfg(test)]
mod fixture;
