//! 影像 + 轮廓 -> 数据集的提取器.
//!
//! 对每个主轮廓文件依次执行: 解码影像, 解析主轮廓, 解析各个次级轮廓, 校验, 产出或拒绝.
//! 通道级的错误 (影像找不到或无法解码, 轮廓格式错误或无法光栅化) 按
//! [`ErrorAction`] 处理; 校验失败只会拒绝该样本.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::io;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::{channel, CountBound, ErrorAction, CONTOUR_EXT, DEFAULT_TARGET_SIZE};
use crate::contour::{read_coordinates, ContourRasterizer};
use crate::correlate::{
    ContourTypeSwap, FolderMap, FrameIndexResolver, FramePrefixNamer, ImagePathResolver,
    OutputPathResolver, SecondaryPathResolver,
};
use crate::dataset::archive::{self, PersistError};
use crate::decode::{AutoDecoder, ImageDecoder};
use crate::error::{ExtractError, ExtractResult};
use crate::report::{Event, NoopReporter, Reporter};
use crate::validate::{ContainmentValidator, DatasetValidator};
use crate::{ChannelData, Dataset, Idx2d, Mask, Sample, SourceMap};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        mod par;
    }
}

/// 提取器配置.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractorConfig {
    /// 轮廓根目录, 其下为 `<subject>/<contour-type>/*.txt`.
    pub contour_root: PathBuf,

    /// 影像根目录, 其下为 `<subject>/<index>.<ext>`.
    pub image_root: PathBuf,

    /// 主轮廓类型. 每个主轮廓文件对应一个样本.
    pub primary: String,

    /// 次级轮廓类型.
    pub secondaries: Vec<String>,

    /// 掩码大小 `(height, width)`. 两维都必须非零且不超出 `u32` 范围,
    /// 否则 [`ContourExtractor::new`] panic; 反序列化得到的配置应使用
    /// [`ContourExtractor::try_new`].
    pub target_size: Idx2d,

    /// 通道级错误的处理方式.
    pub on_error: ErrorAction,

    /// 轮廓受试者目录 -> 影像受试者目录. 只扫描其中列出的目录.
    pub folder_map: FolderMap,

    /// 是否要求轮廓闭合.
    pub require_closed: bool,

    /// [`ContourExtractor::persist_all`] 上限的解释方式.
    pub count_bound: CountBound,

    /// 打乱文件顺序时使用的随机种子. `None` 表示每次不同.
    pub seed: Option<u64>,
}

impl ExtractorConfig {
    /// 使用默认选项: 主轮廓为 `i-contours`, 次级轮廓为 `o-contours`,
    /// 掩码大小 256x256, 遇错即终止.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        contour_root: P,
        image_root: Q,
        folder_map: FolderMap,
    ) -> Self {
        Self {
            contour_root: contour_root.into(),
            image_root: image_root.into(),
            primary: channel::I_CONTOURS.to_owned(),
            secondaries: vec![channel::O_CONTOURS.to_owned()],
            target_size: DEFAULT_TARGET_SIZE,
            on_error: ErrorAction::default(),
            folder_map,
            require_closed: false,
            count_bound: CountBound::default(),
            seed: None,
        }
    }
}

/// [`ContourExtractor::persist_all`] 的统计结果.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistSummary {
    /// 处理过的主轮廓文件个数.
    pub processed: usize,

    /// 写入的 npz 文件个数.
    pub written: usize,

    /// 被拒绝的样本个数 (校验失败, 或在 `Skip` 模式下无法推导输出路径).
    pub rejected: usize,
}

/// 影像 + 轮廓数据集提取器.
///
/// 路径推导、校验、解码和事件上报都是可替换的策略对象, 通过 `with_*` 方法设置.
pub struct ContourExtractor {
    config: ExtractorConfig,
    rasterizer: ContourRasterizer,
    image_resolver: Box<dyn ImagePathResolver>,
    secondary_resolver: Box<dyn SecondaryPathResolver>,
    output_resolver: Box<dyn OutputPathResolver>,
    validator: Box<dyn DatasetValidator>,
    decoder: Box<dyn ImageDecoder>,
    reporter: Box<dyn Reporter>,
}

impl std::fmt::Debug for ContourExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContourExtractor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContourExtractor {
    /// 以默认策略创建提取器. `config.target_size` 不合法时返回
    /// [`ExtractError::InvalidTargetSize`].
    pub fn try_new(config: ExtractorConfig) -> ExtractResult<Self> {
        if ContourRasterizer::is_valid_size(config.target_size) {
            Ok(Self::new(config))
        } else {
            Err(ExtractError::InvalidTargetSize(config.target_size))
        }
    }

    /// 以默认策略创建提取器.
    ///
    /// # 注意
    ///
    /// `config.target_size` 的任一维为 0 时程序 panic.
    pub fn new(config: ExtractorConfig) -> Self {
        let rasterizer =
            ContourRasterizer::new(config.target_size).require_closed(config.require_closed);
        Self {
            config,
            rasterizer,
            image_resolver: Box::<FrameIndexResolver>::default(),
            secondary_resolver: Box::new(ContourTypeSwap),
            output_resolver: Box::new(FramePrefixNamer),
            validator: Box::<ContainmentValidator>::default(),
            decoder: Box::new(AutoDecoder),
            reporter: Box::new(NoopReporter),
        }
    }

    /// 替换影像路径策略.
    pub fn with_image_resolver<T: ImagePathResolver + 'static>(mut self, resolver: T) -> Self {
        self.image_resolver = Box::new(resolver);
        self
    }

    /// 替换次级轮廓路径策略.
    pub fn with_secondary_resolver<T: SecondaryPathResolver + 'static>(
        mut self,
        resolver: T,
    ) -> Self {
        self.secondary_resolver = Box::new(resolver);
        self
    }

    /// 替换输出路径策略.
    pub fn with_output_resolver<T: OutputPathResolver + 'static>(mut self, resolver: T) -> Self {
        self.output_resolver = Box::new(resolver);
        self
    }

    /// 替换校验器.
    pub fn with_validator<T: DatasetValidator + 'static>(mut self, validator: T) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// 替换影像解码器.
    pub fn with_decoder<T: ImageDecoder + 'static>(mut self, decoder: T) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// 设置事件观察者.
    pub fn with_reporter<T: Reporter + 'static>(mut self, reporter: T) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// 列出所有主轮廓文件.
    ///
    /// 按目录映射中的受试者目录名排序, 同一目录内按文件名排序; `shuffle` 为真时整体打乱.
    /// 目录映射中列出但不存在的目录被忽略.
    pub fn contour_files(&self, shuffle: bool) -> ExtractResult<Vec<PathBuf>> {
        let mut ans = Vec::new();
        for folder in self.config.folder_map.keys() {
            let mut dir = self.config.contour_root.join(folder);
            dir.push(&self.config.primary);
            let listing_err = |source| ExtractError::Listing {
                path: dir.clone(),
                source,
            };

            let entries = match fs::read_dir(&dir) {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("skipping absent contour folder {}", dir.display());
                    continue;
                }
                Err(e) => return Err(listing_err(e)),
            };
            let mut files = Vec::new();
            for entry in entries {
                let path = entry.map_err(listing_err)?.path();
                if path.is_file() && path.extension().is_some_and(|e| e == CONTOUR_EXT) {
                    files.push(path);
                }
            }
            files.sort_unstable();
            ans.append(&mut files);
        }

        if shuffle {
            let mut rng = match self.config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            ans.shuffle(&mut rng);
        }
        Ok(ans)
    }

    /// 惰性数据流. 每次调用都会重新扫描目录.
    ///
    /// 校验失败的样本不会出现在流中. `Raise` 模式下, 流在产出第一个错误后结束.
    pub fn stream_datasets(&self, shuffle: bool) -> DatasetStream<'_> {
        let (paths_rev, pending) = match self.contour_files(shuffle) {
            Ok(mut v) => {
                v.reverse();
                (v, None)
            }
            Err(e) => (Vec::new(), Some(e)),
        };
        DatasetStream {
            extractor: self,
            paths_rev,
            pending,
            done: false,
        }
    }

    /// 提取样本并写入 `output_dir` (不存在时创建).
    ///
    /// `max_count` 为 `Some(n)` 时, 按 [`ExtractorConfig::count_bound`] 限制处理的文件个数.
    /// 写入错误总是致命的.
    pub fn persist_all<P: AsRef<Path>>(
        &self,
        output_dir: P,
        max_count: Option<usize>,
        shuffle: bool,
    ) -> ExtractResult<PersistSummary> {
        let output_dir = output_dir.as_ref();
        let paths = self.prepare_persist(output_dir, max_count, shuffle)?;

        let mut summary = PersistSummary::default();
        for contour in paths.iter() {
            summary.processed += 1;
            if self.persist_one(output_dir, contour)? {
                summary.written += 1;
            } else {
                summary.rejected += 1;
            }
        }
        log::info!(
            "persisted {} of {} sample(s) to {}",
            summary.written,
            summary.processed,
            output_dir.display()
        );
        Ok(summary)
    }

    /// 创建输出目录并列出受上限约束的文件.
    fn prepare_persist(
        &self,
        output_dir: &Path,
        max_count: Option<usize>,
        shuffle: bool,
    ) -> ExtractResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir).map_err(|source| PersistError::Io {
            path: output_dir.to_owned(),
            source,
        })?;
        let bound = self.config.count_bound;
        Ok(self
            .contour_files(shuffle)?
            .into_iter()
            .enumerate()
            .take_while(|(index, _)| bound.admits(*index, max_count))
            .map(|(_, p)| p)
            .collect())
    }

    /// 提取并写入一个样本. 返回是否写入.
    fn persist_one(&self, output_dir: &Path, contour: &Path) -> ExtractResult<bool> {
        let Some((dataset, sources)) = self.extract_one(contour)? else {
            return Ok(false);
        };
        let Some(output) = self.output_resolver.resolve(output_dir, contour, &sources) else {
            let reason = self.tolerate(ExtractError::CorrelationMiss {
                contour: contour.to_owned(),
                target: "output file",
            })?;
            self.reporter.report(&Event::SampleRejected {
                source: contour,
                reason: &reason,
            });
            return Ok(false);
        };

        archive::save(&output, &dataset, &sources)?;
        self.reporter.report(&Event::Persisted {
            source: contour,
            output: &output,
        });
        Ok(true)
    }

    /// 提取一个样本. 校验失败时返回 `Ok(None)`.
    fn extract_one(&self, contour: &Path) -> ExtractResult<Option<Sample>> {
        log::debug!("extracting {}", contour.display());
        let mut dataset = Dataset::new();
        let mut sources = SourceMap::new();

        match self.load_image(contour) {
            Ok((path, data)) => {
                dataset.insert(channel::IMAGE, data);
                sources.insert(channel::IMAGE.to_owned(), path);
            }
            Err(e) => self.channel_fault(contour, channel::IMAGE, e)?,
        }

        let primary = self.config.primary.as_str();
        match self.load_mask(contour) {
            Ok(mask) => {
                dataset.insert(primary, mask);
                sources.insert(primary.to_owned(), contour.to_owned());
            }
            Err(e) => self.channel_fault(contour, primary, e)?,
        }

        for secondary in self.config.secondaries.iter().map(String::as_str) {
            let Some(path) = self.secondary_resolver.resolve(secondary, contour) else {
                log::debug!("no `{secondary}` contour for {}", contour.display());
                self.reporter.report(&Event::ChannelMissing {
                    source: contour,
                    channel: secondary,
                    reason: "no matching contour file",
                });
                continue;
            };
            match self.load_mask(&path) {
                Ok(mask) => {
                    dataset.insert(secondary, mask);
                    sources.insert(secondary.to_owned(), path);
                }
                Err(e) => self.channel_fault(contour, secondary, e)?,
            }
        }

        if let Err(failure) = self.validator.validate(&dataset) {
            let reason = failure.to_string();
            log::warn!("rejecting {}: {reason}", contour.display());
            self.reporter.report(&Event::SampleRejected {
                source: contour,
                reason: &reason,
            });
            return Ok(None);
        }
        Ok(Some((dataset, sources)))
    }

    fn load_image(&self, contour: &Path) -> ExtractResult<(PathBuf, ChannelData)> {
        let path = self
            .image_resolver
            .resolve(&self.config.image_root, contour, &self.config.folder_map)
            .ok_or_else(|| ExtractError::CorrelationMiss {
                contour: contour.to_owned(),
                target: "image",
            })?;
        let data = self.decoder.decode(&path)?.into_channel();
        Ok((path, data))
    }

    fn load_mask(&self, path: &Path) -> ExtractResult<Mask> {
        let coords = read_coordinates(path)?;
        self.rasterizer
            .rasterize(&coords)
            .ok_or_else(|| ExtractError::InvalidContour {
                path: path.to_owned(),
                points: coords.len(),
            })
    }

    /// 按错误策略处理: `Raise` 返回错误, `Skip` 记录日志并返回原因.
    fn tolerate(&self, err: ExtractError) -> ExtractResult<String> {
        match self.config.on_error {
            ErrorAction::Raise => {
                log::error!("aborting extraction: {err}");
                Err(err)
            }
            ErrorAction::Skip => {
                let reason = err.to_string();
                log::warn!("skipping: {reason}");
                Ok(reason)
            }
        }
    }

    fn channel_fault(&self, contour: &Path, channel: &str, err: ExtractError) -> ExtractResult<()> {
        let reason = self.tolerate(err)?;
        self.reporter.report(&Event::ChannelMissing {
            source: contour,
            channel,
            reason: &reason,
        });
        Ok(())
    }
}

/// [`ContourExtractor::stream_datasets`] 返回的惰性数据流.
#[derive(Debug)]
pub struct DatasetStream<'a> {
    extractor: &'a ContourExtractor,
    paths_rev: Vec<PathBuf>,
    pending: Option<ExtractError>,
    done: bool,
}

impl DatasetStream<'_> {
    /// 尚未处理的主轮廓文件个数.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.paths_rev.len()
    }
}

impl Iterator for DatasetStream<'_> {
    type Item = ExtractResult<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            self.done = true;
            return Some(Err(e));
        }
        if self.done {
            return None;
        }
        while let Some(path) = self.paths_rev.pop() {
            match self.extractor.extract_one(&path) {
                Ok(Some(sample)) => return Some(Ok(sample)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    self.paths_rev.clear();
                    return Some(Err(e));
                }
            }
        }
        self.done = true;
        None
    }
}

impl FusedIterator for DatasetStream<'_> {}

/// 样本来源: 实时提取器或内存中的样本.
pub trait SampleSource {
    /// 按顺序 (或打乱后) 迭代样本.
    fn samples(&self, shuffle: bool) -> Box<dyn Iterator<Item = ExtractResult<Sample>> + '_>;
}

impl SampleSource for ContourExtractor {
    #[inline]
    fn samples(&self, shuffle: bool) -> Box<dyn Iterator<Item = ExtractResult<Sample>> + '_> {
        Box::new(self.stream_datasets(shuffle))
    }
}

impl SampleSource for Vec<Sample> {
    fn samples(&self, shuffle: bool) -> Box<dyn Iterator<Item = ExtractResult<Sample>> + '_> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            order.shuffle(&mut rand::thread_rng());
        }
        Box::new(order.into_iter().map(move |i| Ok(self[i].clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::{ContourExtractor, PersistSummary, SampleSource};
    use crate::consts::{channel, CountBound, ErrorAction};
    use crate::dataset::archive;
    use crate::error::ExtractError;
    use crate::fixture::{square, Fixture, RecordingReporter};
    use crate::correlate::OutputPathResolver;
    use crate::validate::ContainmentValidator;
    use crate::SourceMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// 写入 `n` 组完整且合法的样本, 帧序号从 1 开始.
    fn populate(fx: &Fixture, n: u32) {
        for frame in 1..=n {
            fx.write_image(frame, (32, 32));
            fx.write_contour("i-contours", frame, &square(10.0, 18.0));
            fx.write_contour("o-contours", frame, &square(6.0, 24.0));
        }
    }

    #[test]
    fn test_stream_complete_samples() {
        let fx = Fixture::new();
        populate(&fx, 3);
        let ext = ContourExtractor::new(fx.config());

        let samples: Vec<_> = ext.stream_datasets(false).map(Result::unwrap).collect();
        assert_eq!(samples.len(), 3);
        for (dataset, sources) in &samples {
            assert_eq!(
                dataset.names().collect::<Vec<_>>(),
                ["image", "i-contours", "o-contours"]
            );
            assert_eq!(dataset.get("image").unwrap().shape(), (32, 32));
            assert_eq!(sources.len(), 3);
        }
        // 按文件名排序.
        let first = &samples[0].1[channel::I_CONTOURS];
        assert!(first.ends_with("IM-0001-0001-icontour-manual.txt"));
        assert!(samples[0].1[channel::IMAGE].ends_with("SCD0000101/1.png"));

        // 可以重复调用.
        assert_eq!(ext.stream_datasets(false).count(), 3);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let fx = Fixture::new();
        populate(&fx, 8);
        let mut config = fx.config();
        config.seed = Some(7);
        let ext = ContourExtractor::new(config);

        let a = ext.contour_files(true).unwrap();
        let b = ext.contour_files(true).unwrap();
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, ext.contour_files(false).unwrap());
    }

    #[test]
    fn test_single_line_contour_is_skipped() {
        let fx = Fixture::new();
        populate(&fx, 2);
        fx.write_contour_text("o-contours", 2, "12.0 13.0\n");

        let reporter = Arc::new(RecordingReporter::default());
        let mut config = fx.config();
        config.on_error = ErrorAction::Skip;
        let ext = ContourExtractor::new(config).with_reporter(reporter.clone());

        let samples: Vec<_> = ext.stream_datasets(false).map(Result::unwrap).collect();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].0.contains("o-contours"));
        assert!(!samples[1].0.contains("o-contours"));
        assert!(samples[1].0.contains("i-contours"));
        assert_eq!(reporter.kinds(), ["channel-missing"]);
        assert!(reporter.messages()[0].contains("`o-contours`"));
    }

    #[test]
    fn test_raise_stops_at_first_fault() {
        let fx = Fixture::new();
        populate(&fx, 3);
        fx.write_garbage_image(2);
        let ext = ContourExtractor::new(fx.config());

        let mut stream = ext.stream_datasets(false);
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(stream.next(), Some(Err(ExtractError::Decode(_)))));
        assert!(stream.next().is_none());
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_missing_secondary_is_not_a_fault() {
        let fx = Fixture::new();
        fx.write_image(1, (32, 32));
        fx.write_contour("i-contours", 1, &square(10.0, 18.0));
        let reporter = Arc::new(RecordingReporter::default());
        let ext = ContourExtractor::new(fx.config()).with_reporter(reporter.clone());

        let samples: Vec<_> = ext.stream_datasets(false).collect();
        assert_eq!(samples.len(), 1);
        let (dataset, _) = samples[0].as_ref().unwrap();
        assert_eq!(dataset.names().collect::<Vec<_>>(), ["image", "i-contours"]);
        assert_eq!(reporter.kinds(), ["channel-missing"]);
    }

    #[test]
    fn test_uncontained_sample_is_rejected() {
        let fx = Fixture::new();
        populate(&fx, 2);
        fx.write_contour("i-contours", 1, &square(2.0, 28.0));
        let reporter = Arc::new(RecordingReporter::default());
        let ext = ContourExtractor::new(fx.config()).with_reporter(reporter.clone());

        let samples: Vec<_> = ext.stream_datasets(false).map(Result::unwrap).collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(reporter.kinds(), ["sample-rejected"]);

        // 换用不检查包含关系的校验器.
        let ext = ContourExtractor::new(fx.config())
            .with_validator(ContainmentValidator::without_containment());
        assert_eq!(ext.stream_datasets(false).count(), 2);
    }

    #[test]
    fn test_persist_all() {
        let fx = Fixture::new();
        populate(&fx, 5);
        let out = fx.root().join("out/nested");
        let reporter = Arc::new(RecordingReporter::default());
        let ext = ContourExtractor::new(fx.config()).with_reporter(reporter.clone());

        let summary = ext.persist_all(&out, None, false).unwrap();
        assert_eq!(
            summary,
            PersistSummary {
                processed: 5,
                written: 5,
                rejected: 0
            }
        );
        let files = archive::list_archives(&out).unwrap();
        assert_eq!(files.len(), 5);
        assert!(files[0].ends_with("SC-HF-I-1-IM-0001-0001-image-contours.npz"));
        assert_eq!(reporter.kinds().len(), 5);

        let (dataset, sources) = archive::load(&files[0]).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(sources[channel::FILENAME], files[0]);
    }

    /// 从不给出输出路径.
    struct NoOutput;

    impl OutputPathResolver for NoOutput {
        fn resolve(&self, _: &Path, _: &Path, _: &SourceMap) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_persist_counts_rejected() {
        let fx = Fixture::new();
        populate(&fx, 3);
        fx.write_contour("i-contours", 2, &square(2.0, 28.0));
        let reporter = Arc::new(RecordingReporter::default());
        let ext = ContourExtractor::new(fx.config()).with_reporter(reporter.clone());

        let out = fx.root().join("out");
        let summary = ext.persist_all(&out, None, false).unwrap();
        assert_eq!(
            summary,
            PersistSummary {
                processed: 3,
                written: 2,
                rejected: 1
            }
        );
        assert_eq!(archive::list_archives(&out).unwrap().len(), 2);
        assert_eq!(reporter.kinds(), ["persisted", "sample-rejected", "persisted"]);
    }

    #[test]
    fn test_output_path_miss() {
        let fx = Fixture::new();
        populate(&fx, 2);

        // Skip: 样本被拒绝, 不写入任何文件.
        let reporter = Arc::new(RecordingReporter::default());
        let mut config = fx.config();
        config.on_error = ErrorAction::Skip;
        let ext = ContourExtractor::new(config)
            .with_output_resolver(NoOutput)
            .with_reporter(reporter.clone());
        let out = fx.root().join("skip");
        let summary = ext.persist_all(&out, None, false).unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.written, 0);
        assert_eq!(summary.rejected, 2);
        assert!(archive::list_archives(&out).unwrap().is_empty());
        assert_eq!(reporter.kinds(), ["sample-rejected", "sample-rejected"]);

        // Raise: 第一个样本即终止.
        let ext = ContourExtractor::new(fx.config()).with_output_resolver(NoOutput);
        match ext.persist_all(fx.root().join("raise"), None, false) {
            Err(ExtractError::CorrelationMiss { contour, target }) => {
                assert_eq!(target, "output file");
                assert!(contour.ends_with("IM-0001-0001-icontour-manual.txt"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_try_new_rejects_empty_target() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.target_size = (0, 32);
        assert!(matches!(
            ContourExtractor::try_new(config),
            Err(ExtractError::InvalidTargetSize((0, 32)))
        ));
        assert!(ContourExtractor::try_new(fx.config()).is_ok());
    }

    #[test]
    fn test_persist_count_bound() {
        let fx = Fixture::new();
        populate(&fx, 6);

        let ext = ContourExtractor::new(fx.config());
        let summary = ext.persist_all(fx.root().join("inclusive"), Some(2), false).unwrap();
        assert_eq!(summary.processed, 3);

        let mut config = fx.config();
        config.count_bound = CountBound::Exclusive;
        let ext = ContourExtractor::new(config);
        let summary = ext.persist_all(fx.root().join("exclusive"), Some(2), false).unwrap();
        assert_eq!(summary.processed, 2);
        let summary = ext.persist_all(fx.root().join("none"), Some(0), false).unwrap();
        assert_eq!(summary.processed, 0);
    }

    #[test]
    fn test_vec_sample_source() {
        let fx = Fixture::new();
        populate(&fx, 4);
        let ext = ContourExtractor::new(fx.config());
        let samples: Vec<_> = ext.samples(false).map(Result::unwrap).collect();
        assert_eq!(samples.len(), 4);

        let replay: Vec<_> = samples.samples(true).map(Result::unwrap).collect();
        assert_eq!(replay.len(), 4);
        for s in &samples {
            assert!(replay.contains(s));
        }
    }
}
