//! Image file I/O.

use anyhow::{Context, Result};
use filmsim_core::Raster;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// Decode an image file into an RGBA8 raster.
pub fn load_image(path: &Path) -> Result<Raster> {
    let img = image::open(path)
        .with_context(|| format!("cannot open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(Raster::from_rgba8(width, height, img.into_raw())?)
}

/// Encode `raster` to `path`, choosing the format from the extension.
/// Formats without alpha (JPEG) drop the alpha channel.
pub fn save_image(path: &Path, raster: &Raster) -> Result<()> {
    let img = RgbaImage::from_raw(raster.width(), raster.height(), raster.as_bytes().to_vec())
        .context("raster size does not match its buffer")?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let result = match ext.as_str() {
        "jpg" | "jpeg" => DynamicImage::ImageRgba8(img).to_rgb8().save(path),
        _ => img.save(path),
    };
    result.with_context(|| format!("cannot write image {}", path.display()))
}
