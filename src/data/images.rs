//! Image folders laid out one sub-directory per class:
//!
//! ```text
//! root/
//!   cat/  0001.jpg 0002.jpg ...
//!   dog/  0001.jpg ...
//! ```
//!
//! Class indices follow the sorted directory names. Every image is decoded,
//! resized to a fixed size and flattened into `[0, 1]` pixel values.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::dataset::Dataset;

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Grayscale,
    Rgb,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            ColorMode::Grayscale => 1,
            ColorMode::Rgb => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageFolder {
    pub dataset: Dataset<Vec<f64>>,
    pub class_names: Vec<String>,
}

/// Decodes image bytes (PNG/JPEG/BMP/GIF), resizes to `width x height` and
/// flattens the pixels, channel-interleaved for RGB.
pub fn image_bytes_to_input(bytes: &[u8], width: u32, height: u32, mode: ColorMode) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes).context("cannot decode image")?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    let pixels = match mode {
        ColorMode::Grayscale => resized
            .to_luma8()
            .pixels()
            .map(|p| p.0[0] as f64 / 255.0)
            .collect(),
        ColorMode::Rgb => resized
            .to_rgb8()
            .pixels()
            .flat_map(|p| p.0.iter().map(|&c| c as f64 / 255.0))
            .collect(),
    };
    Ok(pixels)
}

pub fn load_image_folder(root: &Path, width: u32, height: u32, mode: ColorMode) -> Result<ImageFolder> {
    ensure!(width > 0 && height > 0, "image size must be non-zero, got {}x{}", width, height);

    let class_dirs = sorted_entries(root)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect::<Vec<_>>();
    ensure!(
        class_dirs.len() >= 2,
        "{} must contain at least 2 class directories, found {}",
        root.display(), class_dirs.len()
    );

    let mut class_names = Vec::with_capacity(class_dirs.len());
    let mut inputs = Vec::new();
    let mut labels = Vec::new();

    for (class, dir) in class_dirs.iter().enumerate() {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut count = 0usize;
        for file in sorted_entries(dir)? {
            if !has_image_extension(&file) {
                debug!(path = %file.display(), "skipping non-image file");
                continue;
            }
            let bytes = std::fs::read(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let input = image_bytes_to_input(&bytes, width, height, mode)
                .with_context(|| format!("while loading {}", file.display()))?;
            inputs.push(input);
            labels.push(class);
            count += 1;
        }
        debug!(class = %name, images = count, "loaded class directory");
        class_names.push(name);
    }

    ensure!(!inputs.is_empty(), "no images found under {}", root.display());
    let dataset = Dataset::new(inputs, labels, class_names.len())?;
    Ok(ImageFolder { dataset, class_names })
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("cannot list {}", dir.display()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("cannot list {}", dir.display()))?;
    entries.sort();
    Ok(entries)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
