use std::path::Path;

use anyhow::Context;

use crate::{foundation::error::LayerbakeResult, model::raster::Raster};

/// Decode an encoded image (PNG, JPEG, ...) into straight RGBA8.
pub fn decode_raster(bytes: &[u8]) -> LayerbakeResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Raster::from_dynamic(&dyn_img)
}

pub fn load_raster(path: &Path) -> LayerbakeResult<Raster> {
    let dyn_img = image::ImageReader::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("sniff image format '{}'", path.display()))?
        .decode()
        .with_context(|| format!("decode image '{}'", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        width = dyn_img.width(),
        height = dyn_img.height(),
        "loaded raster"
    );
    Raster::from_dynamic(&dyn_img)
}

#[cfg(test)]
#[path = "../tests/unit/io.rs"]
mod tests;
