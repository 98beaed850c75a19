//! 训练批次生成.
//!
//! 样本来源是实时提取器 ([`SampleSource`]) 或 npz 目录, 二者必须且只能指定一个.

use either::Either;
use ndarray::{stack, Array2, ArrayD, ArrayView2, ArrayViewD, Axis, ShapeError};
use rand::seq::SliceRandom;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::archive;
use crate::consts::{channel, ErrorAction};
use crate::error::BatchError;
use crate::extract::SampleSource;
use crate::report::{Event, NoopReporter, Reporter};
use crate::{ChannelData, Dataset, Idx2d, Sample, SourceMap};

/// 请求的通道. 单个通道与通道列表是两种不同的请求形状.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelSpec {
    /// 单个通道, 张量形状为 `(n, h, w)`.
    Single(String),

    /// 多个通道, 张量形状为 `(n, c, h, w)`.
    Many(Vec<String>),
}

impl ChannelSpec {
    /// 单个通道.
    #[inline]
    pub fn single<S: Into<String>>(name: S) -> Self {
        Self::Single(name.into())
    }

    /// 多个通道.
    pub fn many<S: Into<String>, I: IntoIterator<Item = S>>(names: I) -> Self {
        Self::Many(names.into_iter().map(Into::into).collect())
    }

    /// 从数据集中取出请求的通道. 缺失时返回第一个缺失的通道名.
    pub fn select(&self, dataset: &Dataset) -> Result<Selection, String> {
        let get = |name: &String| dataset.get(name).cloned().ok_or_else(|| name.clone());
        match self {
            Self::Single(name) => get(name).map(Selection::Single),
            Self::Many(names) => names
                .iter()
                .map(get)
                .collect::<Result<Vec<_>, _>>()
                .map(Selection::Many),
        }
    }
}

impl From<&str> for ChannelSpec {
    #[inline]
    fn from(value: &str) -> Self {
        Self::single(value)
    }
}

/// 按 [`ChannelSpec`] 取出的数据.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// 单个通道.
    Single(ChannelData),

    /// 多个通道, 顺序与请求一致.
    Many(Vec<ChannelData>),
}

impl Selection {
    /// 转换为 `f32` 数组: 单通道为 `(h, w)`, 多通道为 `(c, h, w)`.
    pub fn to_f32(&self) -> Result<ArrayD<f32>, ShapeError> {
        match self {
            Self::Single(d) => Ok(d.to_f32().into_dyn()),
            Self::Many(ds) => {
                let arrays: Vec<Array2<f32>> = ds.iter().map(ChannelData::to_f32).collect();
                let views: Vec<ArrayView2<f32>> = arrays.iter().map(|a| a.view()).collect();
                Ok(stack(Axis(0), &views)?.into_dyn())
            }
        }
    }
}

/// 批次中的一项.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    /// 输入.
    pub x: Selection,

    /// 输出. 未配置 Y 通道时为 `None`.
    pub y: Option<Selection>,
}

/// 一个训练批次.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// 批次项, 顺序与样本流一致.
    pub items: Vec<BatchItem>,

    /// 与 `items` 一一对应的来源表. 仅在 [`BatchConfig::include_sources`] 为真时存在.
    pub sources: Option<Vec<SourceMap>>,
}

impl Batch {
    /// 批次项个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空. 只有样本流为空时, 最后一个批次才可能为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 将所有 X 堆叠为 `f32` 张量, 第 0 维为批次维. 空批次返回错误.
    pub fn x_tensor(&self) -> Result<ArrayD<f32>, ShapeError> {
        stack_selections(self.items.iter().map(|it| &it.x))
    }

    /// 将所有 Y 堆叠为 `f32` 张量. 未配置 Y 通道时返回 `None`.
    pub fn y_tensor(&self) -> Option<Result<ArrayD<f32>, ShapeError>> {
        let ys: Option<Vec<&Selection>> = self.items.iter().map(|it| it.y.as_ref()).collect();
        match ys {
            Some(ys) if !ys.is_empty() => Some(stack_selections(ys.into_iter())),
            _ => None,
        }
    }
}

fn stack_selections<'a, I: Iterator<Item = &'a Selection>>(
    it: I,
) -> Result<ArrayD<f32>, ShapeError> {
    let arrays = it.map(Selection::to_f32).collect::<Result<Vec<_>, _>>()?;
    let views: Vec<ArrayViewD<f32>> = arrays.iter().map(|a| a.view()).collect();
    stack(Axis(0), &views)
}

/// 批次生成配置.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchConfig {
    /// 输入通道.
    pub x: ChannelSpec,

    /// 输出通道.
    pub y: Option<ChannelSpec>,

    /// 批次中是否附带来源表.
    pub include_sources: bool,

    /// 样本缺少通道时的处理方式.
    pub on_error: ErrorAction,

    /// 目标尺寸 `(height, width)`. 目前不做任何缩放 / 填充 / 裁剪.
    pub target_size: Option<Idx2d>,
}

impl BatchConfig {
    /// 只有输入通道, 不附带来源表, 遇错即终止.
    pub fn new<S: Into<ChannelSpec>>(x: S) -> Self {
        Self {
            x: x.into(),
            y: None,
            include_sources: false,
            on_error: ErrorAction::default(),
            target_size: None,
        }
    }

    /// 设置输出通道.
    #[inline]
    pub fn with_y<S: Into<ChannelSpec>>(mut self, y: S) -> Self {
        self.y = Some(y.into());
        self
    }
}

/// 批次生成器.
pub struct BatchGenerator<'a> {
    config: BatchConfig,
    source: Either<&'a dyn SampleSource, PathBuf>,
    reporter: Box<dyn Reporter + 'a>,
}

impl<'a> BatchGenerator<'a> {
    /// 创建批次生成器. `live` 与 `folder` 必须且只能指定一个.
    pub fn new(
        config: BatchConfig,
        live: Option<&'a dyn SampleSource>,
        folder: Option<&Path>,
    ) -> Result<Self, BatchError> {
        let source = match (live, folder) {
            (Some(live), None) => Either::Left(live),
            (None, Some(folder)) => Either::Right(folder.to_owned()),
            (Some(_), Some(_)) => {
                return Err(BatchError::InvalidSource(
                    "both a live source and a folder are given",
                ))
            }
            (None, None) => {
                return Err(BatchError::InvalidSource(
                    "neither a live source nor a folder is given",
                ))
            }
        };
        Ok(Self {
            config,
            source,
            reporter: Box::new(NoopReporter),
        })
    }

    /// 设置事件观察者.
    pub fn with_reporter<R: Reporter + 'a>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// 生成批次.
    ///
    /// 满 `batch_size` 项即产出一个批次; 样本流结束时产出剩余的不完整批次.
    /// 如果此前没有产出过任何批次, 则即使剩余为空也会产出一个空批次.
    /// 产出错误后迭代器结束.
    pub fn generate_batches(
        &self,
        batch_size: usize,
        shuffle: bool,
    ) -> Result<BatchIter<'_>, BatchError> {
        if batch_size == 0 {
            return Err(BatchError::InvalidBatchSize);
        }
        let samples: Box<dyn Iterator<Item = Result<Sample, BatchError>> + '_> = match &self.source
        {
            Either::Left(live) => {
                Box::new(live.samples(shuffle).map(|s| s.map_err(BatchError::from)))
            }
            Either::Right(folder) => {
                let mut files = archive::list_archives(folder)?;
                if shuffle {
                    files.shuffle(&mut rand::thread_rng());
                }
                log::debug!("batching {} archive(s) from {}", files.len(), folder.display());
                Box::new(files.into_iter().map(|p| archive::load(p).map_err(BatchError::from)))
            }
        };
        Ok(BatchIter {
            samples,
            config: &self.config,
            reporter: self.reporter.as_ref(),
            batch_size,
            emitted: false,
            done: false,
        })
    }
}

/// 样本的来源路径, 用于日志: 优先 npz 文件, 其次任一来源文件.
fn sample_origin(sources: &SourceMap) -> PathBuf {
    sources
        .get(channel::FILENAME)
        .or_else(|| sources.values().next())
        .cloned()
        .unwrap_or_default()
}

/// [`BatchGenerator::generate_batches`] 返回的批次迭代器.
pub struct BatchIter<'a> {
    samples: Box<dyn Iterator<Item = Result<Sample, BatchError>> + 'a>,
    config: &'a BatchConfig,
    reporter: &'a dyn Reporter,
    batch_size: usize,
    emitted: bool,
    done: bool,
}

impl BatchIter<'_> {
    fn new_batch(&self) -> Batch {
        Batch {
            items: Vec::with_capacity(self.batch_size),
            sources: self.config.include_sources.then(Vec::new),
        }
    }

    /// 取出样本的 X / Y. 缺少通道时返回缺失的通道名.
    fn select(&self, dataset: &Dataset) -> Result<BatchItem, String> {
        let x = self.config.x.select(dataset)?;
        let y = self
            .config
            .y
            .as_ref()
            .map(|spec| spec.select(dataset))
            .transpose()?;
        Ok(BatchItem { x, y })
    }
}

impl Iterator for BatchIter<'_> {
    type Item = Result<Batch, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut batch = self.new_batch();
        while let Some(sample) = self.samples.next() {
            let (dataset, sources) = match sample {
                Ok(v) => v,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            match self.select(&dataset) {
                Ok(item) => {
                    batch.items.push(item);
                    if let Some(v) = batch.sources.as_mut() {
                        v.push(sources);
                    }
                    if batch.len() == self.batch_size {
                        self.emitted = true;
                        return Some(Ok(batch));
                    }
                }
                Err(missing) => {
                    let origin = sample_origin(&sources);
                    if self.config.on_error.is_raise() {
                        log::error!("sample {} lacks channel `{missing}`", origin.display());
                        self.done = true;
                        return Some(Err(BatchError::MissingChannel {
                            sample: origin,
                            channel: missing,
                        }));
                    }
                    log::warn!("dropping sample {}: lacks channel `{missing}`", origin.display());
                    self.reporter.report(&Event::SampleDropped {
                        source: &origin,
                        channel: &missing,
                    });
                }
            }
        }

        self.done = true;
        if batch.is_empty() && self.emitted {
            None
        } else {
            self.emitted = true;
            Some(Ok(batch))
        }
    }
}

impl FusedIterator for BatchIter<'_> {}
