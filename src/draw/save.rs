use crate::draw::composite::RgbaBuffer;
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

pub const DRAW_EXPORT_SUFFIX: &str = "drawing";

/// Export collaborator: receives a read-only copy of the canvas and
/// persists it somewhere the engine knows nothing about.
pub trait ExportSink {
    fn export(&mut self, image: &RgbaBuffer) -> Result<PathBuf>;
}

/// Writes timestamped PNG files into one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngExporter {
    output_dir: PathBuf,
}

impl PngExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn export_at(
        &self,
        image: &RgbaBuffer,
        now: chrono::DateTime<Local>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("create draw export folder {}", self.output_dir.display())
        })?;
        let path = unique_target(&self.output_dir, &timestamped_stem(now));
        write_png(&path, image)?;
        Ok(path)
    }
}

impl ExportSink for PngExporter {
    fn export(&mut self, image: &RgbaBuffer) -> Result<PathBuf> {
        self.export_at(image, Local::now())
    }
}

pub fn exe_relative_output_folder_from_path(exe_path: &Path, subdir: &str) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(subdir))
}

pub fn ensure_output_folder(subdir: &str) -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    let output = exe_relative_output_folder_from_path(&exe_path, subdir)?;
    fs::create_dir_all(&output)
        .with_context(|| format!("create draw output folder {}", output.display()))?;
    Ok(output)
}

pub fn timestamped_stem(now: chrono::DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

pub fn build_filename(stem: &str, suffix: &str) -> String {
    format!("{}_{}.png", stem, suffix)
}

/// First free `<stem>_drawing[_N].png` in `dir`.
fn unique_target(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(build_filename(stem, DRAW_EXPORT_SUFFIX));
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| dir.join(build_filename(stem, &format!("{DRAW_EXPORT_SUFFIX}_{n}"))))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

pub fn write_png(path: &Path, image: &RgbaBuffer) -> Result<()> {
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.pixels.clone())
        .ok_or_else(|| anyhow!("canvas buffer does not match {}x{}", image.width, image.height))?;
    rgba.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png {}", path.display()))
}
