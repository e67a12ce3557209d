//! Film grain: tileable noise textures and the composite formula.
//!
//! The GPU shader applies the same formula as [`composite`] and samples the
//! texture the same way as [`GrainTexture::sample_at`].

use filmsim_core::{FilmSimError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Edge length of generated grain textures.
pub const GRAIN_TEXTURE_SIZE: u32 = 256;

/// Grain character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrainStyle {
    Fine,
    #[default]
    Medium,
    Coarse,
}

impl GrainStyle {
    pub const ALL: [GrainStyle; 3] = [GrainStyle::Fine, GrainStyle::Medium, GrainStyle::Coarse];

    /// Look up a style by key. Unknown keys fall back to `Medium`.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "fine" => Self::Fine,
            "medium" => Self::Medium,
            "coarse" => Self::Coarse,
            other => {
                warn!(key = other, "unknown grain style, using medium");
                Self::Medium
            }
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Fine => "fine",
            Self::Medium => "medium",
            Self::Coarse => "coarse",
        }
    }

    /// Box blur radius applied to the white noise.
    fn blur_radius(&self) -> usize {
        match self {
            Self::Fine => 0,
            Self::Medium => 1,
            Self::Coarse => 2,
        }
    }

    fn seed(&self) -> u32 {
        match self {
            Self::Fine => 0x9E37_79B9,
            Self::Medium => 0x85EB_CA6B,
            Self::Coarse => 0xC2B2_AE35,
        }
    }
}

/// User-facing grain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainSettings {
    pub enabled: bool,
    /// Strength in [0, 1].
    pub intensity: f32,
    /// Screen pixels per grain texel (> 0).
    pub scale: f32,
    pub style: GrainStyle,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.35,
            scale: 1.0,
            style: GrainStyle::Medium,
        }
    }
}

impl GrainSettings {
    /// Intensity actually applied: zero when grain is disabled.
    pub fn effective_intensity(&self) -> f32 {
        if !self.enabled || !self.intensity.is_finite() {
            return 0.0;
        }
        self.intensity.clamp(0.0, 1.0)
    }

    /// Scale with invalid values replaced by 1.
    pub fn effective_scale(&self) -> f32 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }

    /// Whether grain contributes anything to the output.
    pub fn is_active(&self) -> bool {
        self.effective_intensity() > 0.0
    }
}

/// A single-channel, tileable grain texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrainTexture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GrainTexture {
    /// Deterministically generate the texture for a style.
    pub fn generate(style: GrainStyle) -> Self {
        let size = GRAIN_TEXTURE_SIZE as usize;
        let seed = style.seed();
        let noise: Vec<f32> = (0..size * size)
            .map(|i| hash((i % size) as u32, (i / size) as u32, seed))
            .collect();
        let blurred = box_blur_wrap(&noise, size, style.blur_radius());

        let mean = blurred.iter().sum::<f32>() / blurred.len() as f32;
        let spread = blurred
            .iter()
            .map(|v| (v - mean).abs())
            .fold(0.0f32, f32::max)
            .max(f32::EPSILON);
        let data = blurred
            .iter()
            .map(|v| ((0.5 + (v - mean) * 0.5 / spread).clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();

        Self {
            width: GRAIN_TEXTURE_SIZE,
            height: GRAIN_TEXTURE_SIZE,
            data,
        }
    }

    /// Build from raw 8-bit luma.
    pub fn from_luma(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize {
            return Err(FilmSimError::InvalidParameter(format!(
                "grain texture {}x{} with {} bytes",
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Load a grain texture from an image file, keeping its luma.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref())
            .map_err(|e| FilmSimError::UnsupportedFormat(format!("grain image: {}", e)))?
            .to_luma8();
        let (w, h) = img.dimensions();
        Self::from_luma(w, h, img.into_raw())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw R8 texels, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Normalized texel value.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize] as f32 / 255.0
    }

    /// Grain value under output pixel `(x, y)`: nearest texel, wrapping.
    #[inline]
    pub fn sample_at(&self, x: u32, y: u32, scale: f32) -> f32 {
        let tx = ((x as f32 + 0.5) / scale).floor() as u64 % self.width as u64;
        let ty = ((y as f32 + 0.5) / scale).floor() as u64 % self.height as u64;
        self.texel(tx as u32, ty as u32)
    }
}

/// Add grain to a color: `clamp(rgb + (grain - 0.5) * intensity, 0, 1)`.
#[inline]
pub fn composite(rgb: [f32; 3], grain: f32, intensity: f32) -> [f32; 3] {
    let offset = (grain - 0.5) * intensity;
    rgb.map(|c| (c + offset).clamp(0.0, 1.0))
}

/// Integer hash to [0, 1).
fn hash(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x
        .wrapping_mul(0x27D4_EB2D)
        .wrapping_add(y.wrapping_mul(0x1656_67B1))
        ^ seed;
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Separable box blur on a square, wrapping at the edges.
fn box_blur_wrap(src: &[f32], size: usize, radius: usize) -> Vec<f32> {
    if radius == 0 {
        return src.to_vec();
    }
    let taps = (2 * radius + 1) as f32;
    let wrap = |i: isize| i.rem_euclid(size as isize) as usize;

    let mut horizontal = vec![0.0f32; src.len()];
    for y in 0..size {
        for x in 0..size {
            let mut sum = 0.0;
            for k in -(radius as isize)..=radius as isize {
                sum += src[y * size + wrap(x as isize + k)];
            }
            horizontal[y * size + x] = sum / taps;
        }
    }

    let mut out = vec![0.0f32; src.len()];
    for y in 0..size {
        for x in 0..size {
            let mut sum = 0.0;
            for k in -(radius as isize)..=radius as isize {
                sum += horizontal[wrap(y as isize + k) * size + x];
            }
            out[y * size + x] = sum / taps;
        }
    }
    out
}
