//! IDX binary files (MNIST and its derivatives: Fashion-MNIST, EMNIST, ...).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, num_classes)
//! ```

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};

use crate::data::dataset::Dataset;

const IMAGE_HEADER_LEN: usize = 16;
const LABEL_HEADER_LEN: usize = 8;

pub fn load_idx_pair(images: &Path, labels: &Path, num_classes: usize) -> Result<Dataset<Vec<f64>>> {
    let image_bytes = std::fs::read(images)
        .with_context(|| format!("cannot read IDX image file {}", images.display()))?;
    let label_bytes = std::fs::read(labels)
        .with_context(|| format!("cannot read IDX label file {}", labels.display()))?;
    parse_idx_pair(&image_bytes, &label_bytes, num_classes)
        .with_context(|| format!("while parsing {} / {}", images.display(), labels.display()))
}

/// Parses an image file and its label file into a dataset whose inputs are
/// flattened `rows * cols` pixel vectors scaled to `[0, 1]`.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    num_classes: usize,
) -> Result<Dataset<Vec<f64>>> {
    ensure!(num_classes >= 2, "num_classes must be at least 2, got {}", num_classes);

    // ── Image file ──────────────────────────────────────────────────────────

    check_header(image_bytes, IMAGE_HEADER_LEN, 3, "image")?;
    let n_items = be_u32(image_bytes, 4);
    let rows = be_u32(image_bytes, 8);
    let cols = be_u32(image_bytes, 12);

    let n_pixels = rows.checked_mul(cols).with_context(|| {
        format!("IDX image file: rows * cols overflows (rows={}, cols={})", rows, cols)
    })?;
    let data_len = n_items.checked_mul(n_pixels).with_context(|| {
        format!("IDX image file: data length overflows (n_items={}, n_pixels={})", n_items, n_pixels)
    })?;
    ensure!(
        image_bytes.len() >= IMAGE_HEADER_LEN + data_len,
        "IDX image file too short: header declares {} items of {}x{} pixels \
         ({} data bytes), but file is only {} bytes",
        n_items, rows, cols, data_len, image_bytes.len()
    );

    // ── Label file ──────────────────────────────────────────────────────────

    check_header(label_bytes, LABEL_HEADER_LEN, 1, "label")?;
    let label_count = be_u32(label_bytes, 4);
    ensure!(
        label_count == n_items,
        "IDX file mismatch: image file declares {} items but label file declares {}",
        n_items, label_count
    );
    ensure!(
        label_bytes.len() >= LABEL_HEADER_LEN + n_items,
        "IDX label file too short: header declares {} labels but file is only {} bytes",
        n_items, label_bytes.len()
    );

    let inputs: Vec<Vec<f64>> = if n_pixels == 0 {
        vec![Vec::new(); n_items]
    } else {
        image_bytes[IMAGE_HEADER_LEN..IMAGE_HEADER_LEN + data_len]
            .chunks_exact(n_pixels)
            .map(|chunk| chunk.iter().map(|&px| px as f64 / 255.0).collect())
            .collect()
    };
    let labels = label_bytes[LABEL_HEADER_LEN..LABEL_HEADER_LEN + n_items]
        .iter()
        .map(|&c| c as usize)
        .collect();

    Dataset::new(inputs, labels, num_classes)
}

fn check_header(bytes: &[u8], header_len: usize, dims: u8, what: &str) -> Result<()> {
    if bytes.len() < header_len {
        bail!(
            "IDX {} file too short: expected at least {} header bytes, got {}",
            what, header_len, bytes.len()
        );
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        bail!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}",
            what, bytes[0], bytes[1]
        );
    }
    if bytes[2] != 0x08 {
        bail!("IDX {} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}", what, bytes[2]);
    }
    if bytes[3] != dims {
        bail!("IDX {} file: byte 3 (dimensions) must be {}, got {}", what, dims, bytes[3]);
    }
    Ok(())
}

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}
