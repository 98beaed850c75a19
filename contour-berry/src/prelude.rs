//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF};

pub use crate::data::{ChannelData, Dataset, ElemKind, ImgWriteVis, Mask, Sample, SourceMap};

pub use crate::consts::channel::{FILENAME, IMAGE, I_CONTOURS, O_CONTOURS};
pub use crate::consts::{CountBound, ErrorAction, DEFAULT_TARGET_SIZE};

pub use crate::contour::{read_coordinates, ContourRasterizer, CoordinateList};
pub use crate::correlate::{
    load_folder_map, FolderMap, ImagePathResolver, OutputPathResolver, SecondaryPathResolver,
};
pub use crate::decode::{AutoDecoder, DecodedImage, ImageDecoder};
pub use crate::validate::{ContainmentValidator, DatasetValidator, ValidationFailure};

pub use crate::extract::{ContourExtractor, ExtractorConfig, PersistSummary, SampleSource};
pub use crate::report::{Event, LogReporter, NoopReporter, Reporter};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, archive, Batch, BatchConfig, BatchGenerator, ChannelSpec};

pub use crate::error::{BatchError, ExtractError};
