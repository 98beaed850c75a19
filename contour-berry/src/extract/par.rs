use rayon::prelude::*;
use std::path::Path;

use super::{ContourExtractor, PersistSummary};
use crate::error::ExtractResult;

impl ContourExtractor {
    /// [`ContourExtractor::persist_all`] 的并行版本, 在 rayon 全局线程池上提取和写入.
    ///
    /// 语义相同, 但写入顺序不确定; 出错时其他线程上正在处理的样本仍可能被写入.
    pub fn persist_all_par<P: AsRef<Path>>(
        &self,
        output_dir: P,
        max_count: Option<usize>,
        shuffle: bool,
    ) -> ExtractResult<PersistSummary> {
        let output_dir = output_dir.as_ref();
        let paths = self.prepare_persist(output_dir, max_count, shuffle)?;

        let written = paths
            .par_iter()
            .map(|contour| self.persist_one(output_dir, contour))
            .collect::<ExtractResult<Vec<bool>>>()?;

        let summary = PersistSummary {
            processed: written.len(),
            written: written.iter().filter(|w| **w).count(),
            rejected: written.iter().filter(|w| !**w).count(),
        };
        log::info!(
            "persisted {} of {} sample(s) to {} in parallel",
            summary.written,
            summary.processed,
            output_dir.display()
        );
        Ok(summary)
    }
}
