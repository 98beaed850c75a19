//! 测试用的临时目录布局与工具.

use image::{ImageBuffer, Luma};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use crate::consts::contour_token;
use crate::correlate::FolderMap;
use crate::report::{Event, Reporter};
use crate::{ExtractorConfig, Idx2dF};

/// 轮廓受试者目录.
pub const CONTOUR_FOLDER: &str = "SC-HF-I-1";

/// 影像受试者目录.
pub const IMAGE_FOLDER: &str = "SCD0000101";

/// 以 `(lo, lo)` 与 `(hi, hi)` 为对角的闭合正方形.
pub fn square(lo: f64, hi: f64) -> Vec<Idx2dF> {
    vec![(lo, lo), (hi, lo), (hi, hi), (lo, hi), (lo, lo)]
}

/// `<tmp>/contours/SC-HF-I-1/<type>/*.txt` 与 `<tmp>/images/SCD0000101/<frame>.png`.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn contour_root(&self) -> PathBuf {
        self.root().join("contours")
    }

    pub fn image_root(&self) -> PathBuf {
        self.root().join("images")
    }

    pub fn folder_map(&self) -> FolderMap {
        [(CONTOUR_FOLDER.to_owned(), IMAGE_FOLDER.to_owned())]
            .into_iter()
            .collect()
    }

    /// 32x32 掩码, 其余为默认选项.
    pub fn config(&self) -> ExtractorConfig {
        let mut config =
            ExtractorConfig::new(self.contour_root(), self.image_root(), self.folder_map());
        config.target_size = (32, 32);
        config
    }

    pub fn write_contour_text(&self, contour_type: &str, frame: u32, text: &str) -> PathBuf {
        let token = contour_token(contour_type).unwrap_or("contour");
        let dir = self.contour_root().join(CONTOUR_FOLDER).join(contour_type);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("IM-0001-{frame:04}-{token}-manual.txt"));
        fs::write(&path, text).unwrap();
        path
    }

    pub fn write_contour(&self, contour_type: &str, frame: u32, coords: &[Idx2dF]) -> PathBuf {
        let text: String = coords.iter().map(|(x, y)| format!("{x:.2} {y:.2}\n")).collect();
        self.write_contour_text(contour_type, frame, &text)
    }

    fn image_path(&self, frame: u32) -> PathBuf {
        let dir = self.image_root().join(IMAGE_FOLDER);
        fs::create_dir_all(&dir).unwrap();
        dir.join(format!("{frame}.png"))
    }

    /// 16-bit 灰度 png, 大小为 `(height, width)`.
    pub fn write_image(&self, frame: u32, (h, w): (usize, usize)) -> PathBuf {
        let path = self.image_path(frame);
        let buf = ImageBuffer::<Luma<u16>, Vec<u16>>::from_fn(w as u32, h as u32, |x, y| {
            Luma([(x * 100 + y + frame) as u16])
        });
        buf.save(&path).unwrap();
        path
    }

    pub fn write_garbage_image(&self, frame: u32) -> PathBuf {
        let path = self.image_path(frame);
        fs::write(&path, b"not an image at all").unwrap();
        path
    }
}

/// 记录所有事件.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &Event<'_>) {
        self.events
            .lock()
            .unwrap()
            .push((event.kind(), event.to_string()));
    }
}
