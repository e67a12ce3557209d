//! CPU color processing.
//!
//! Applies a LUT (with intensity) and grain to RGBA8 rasters. Produces the
//! same numbers as the GPU pass within quantization error and is used
//! whenever the GPU path is unavailable.

use crate::grain::{composite, GrainSettings, GrainTexture};
use crate::lut::LutGrid;
use filmsim_core::{FilmSimError, Raster, Result, BYTES_PER_PIXEL};
use rayon::prelude::*;
use tracing::debug;

/// Everything applied to an image in one pass.
#[derive(Debug, Clone, Copy)]
pub struct Look<'a> {
    pub lut: Option<&'a LutGrid>,
    /// Blend between original (0) and graded (1).
    pub intensity: f32,
    pub grain: Option<(&'a GrainTexture, &'a GrainSettings)>,
}

impl<'a> Look<'a> {
    /// A LUT-only look.
    pub fn new(lut: Option<&'a LutGrid>, intensity: f32) -> Self {
        Self {
            lut,
            intensity,
            grain: None,
        }
    }

    pub fn with_grain(mut self, texture: &'a GrainTexture, settings: &'a GrainSettings) -> Self {
        self.grain = Some((texture, settings));
        self
    }

    fn effective_intensity(&self) -> f32 {
        if self.intensity.is_nan() {
            0.0
        } else {
            self.intensity.clamp(0.0, 1.0)
        }
    }

    fn active_lut(&self) -> Option<&'a LutGrid> {
        self.lut.filter(|_| self.effective_intensity() > 0.0)
    }

    fn active_grain(&self) -> Option<(&'a GrainTexture, f32, f32)> {
        self.grain
            .filter(|(_, s)| s.is_active())
            .map(|(t, s)| (t, s.effective_intensity(), s.effective_scale()))
    }

    /// Whether applying this look leaves every pixel unchanged.
    pub fn is_noop(&self) -> bool {
        self.active_lut().is_none() && self.active_grain().is_none()
    }
}

/// Apply a LUT in place.
pub fn apply_lut(image: &mut Raster, lut: &LutGrid, intensity: f32) {
    apply_look(image, &Look::new(Some(lut), intensity));
}

/// Apply a look in place, processing rows in parallel.
pub fn apply_look(image: &mut Raster, look: &Look<'_>) {
    if image.is_empty() || look.is_noop() {
        return;
    }
    let lut = look.active_lut();
    let intensity = look.effective_intensity();
    let grain = look.active_grain();
    let stride = image.stride();

    image
        .as_bytes_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                let rgb = [to_unit(px[0]), to_unit(px[1]), to_unit(px[2])];
                let mut out = match lut {
                    Some(lut) => lut.apply(rgb, intensity),
                    None => rgb,
                };
                if let Some((texture, amount, scale)) = grain {
                    out = composite(out, texture.sample_at(x as u32, y as u32, scale), amount);
                }
                px[0] = to_byte(out[0]);
                px[1] = to_byte(out[1]);
                px[2] = to_byte(out[2]);
            }
        });
}

/// Downsample so the longer edge is at most `max_dim`, then apply the look.
pub fn render_bounded(image: &Raster, look: &Look<'_>, max_dim: u32) -> Result<Raster> {
    let mut out = downsample(image, max_dim)?;
    debug!(
        from = ?(image.width(), image.height()),
        to = ?(out.width(), out.height()),
        "bounded render"
    );
    apply_look(&mut out, look);
    Ok(out)
}

/// Box-filter `image` so its longer edge is at most `max_dim`.
///
/// Images already within bounds are copied unchanged.
pub fn downsample(image: &Raster, max_dim: u32) -> Result<Raster> {
    if max_dim == 0 {
        return Err(FilmSimError::InvalidParameter(
            "max dimension must be positive".into(),
        ));
    }
    let (w, h) = (image.width(), image.height());
    let longest = w.max(h);
    if longest <= max_dim {
        let mut copy = Raster::try_new(w, h)?;
        copy.as_bytes_mut().copy_from_slice(image.as_bytes());
        return Ok(copy);
    }

    let ratio = max_dim as f64 / longest as f64;
    let ow = ((w as f64 * ratio).round() as u32).clamp(1, max_dim);
    let oh = ((h as f64 * ratio).round() as u32).clamp(1, max_dim);
    let mut out = Raster::try_new(ow, oh)?;
    let out_stride = out.stride();

    out.as_bytes_mut()
        .par_chunks_mut(out_stride)
        .enumerate()
        .for_each(|(oy, row)| {
            let y0 = (oy as u64 * h as u64 / oh as u64) as u32;
            let y1 = (((oy as u64 + 1) * h as u64 / oh as u64) as u32).max(y0 + 1);
            for (ox, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                let x0 = (ox as u64 * w as u64 / ow as u64) as u32;
                let x1 = (((ox as u64 + 1) * w as u64 / ow as u64) as u32).max(x0 + 1);
                let mut sum = [0u64; 4];
                for y in y0..y1 {
                    let src = image.row(y);
                    for x in x0..x1 {
                        let i = x as usize * BYTES_PER_PIXEL;
                        for c in 0..4 {
                            sum[c] += src[i + c] as u64;
                        }
                    }
                }
                let count = ((y1 - y0) * (x1 - x0)) as u64;
                for c in 0..4 {
                    px[c] = ((sum[c] + count / 2) / count) as u8;
                }
            }
        });
    Ok(out)
}

#[inline]
fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Round to nearest, matching unorm conversion on the GPU.
#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
