//! The 3D LUT grid and its trilinear sampler.

use crate::error::LutError;

/// A 3D look-up table with `size³` RGB samples.
///
/// Samples are stored flat with red varying fastest, then green, then blue:
/// grid point `(r, g, b)` starts at `(r + g*N + b*N*N) * 3`. The GPU upload
/// uses the same ordering (width = red, height = green, depth = blue).
#[derive(Debug, Clone, PartialEq)]
pub struct LutGrid {
    size: usize,
    samples: Vec<f32>,
    title: Option<String>,
}

impl LutGrid {
    /// Smallest grid accepted. A single-point grid has no cell to interpolate.
    pub const MIN_SIZE: usize = 2;
    /// Largest grid accepted.
    pub const MAX_SIZE: usize = 256;

    /// Build a grid from flat RGB samples.
    ///
    /// Finite values outside [0, 1] are clamped; NaN or infinite values are
    /// rejected.
    pub fn new(size: usize, mut samples: Vec<f32>) -> Result<Self, LutError> {
        let expected = Self::sample_count(size)?;
        if samples.len() != expected {
            return Err(LutError::DimensionMismatch {
                expected,
                got: samples.len(),
            });
        }
        for (i, v) in samples.iter_mut().enumerate() {
            if !v.is_finite() {
                return Err(LutError::InvalidLut(format!(
                    "non-finite value at entry {}",
                    i / 3
                )));
            }
            *v = v.clamp(0.0, 1.0);
        }
        Ok(Self {
            size,
            samples,
            title: None,
        })
    }

    /// Build a grid by evaluating `f` at every normalized grid coordinate.
    pub fn from_fn<F>(size: usize, mut f: F) -> Result<Self, LutError>
    where
        F: FnMut([f32; 3]) -> [f32; 3],
    {
        let mut samples = Vec::with_capacity(Self::sample_count(size)?);
        let n = (size - 1) as f32;
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    let out = f([r as f32 / n, g as f32 / n, b as f32 / n]);
                    samples.extend_from_slice(&out);
                }
            }
        }
        Self::new(size, samples)
    }

    /// The identity cube: every grid point maps to its own coordinate.
    pub fn identity(size: usize) -> Result<Self, LutError> {
        Self::from_fn(size, |rgb| rgb)
    }

    /// Attach a display title (used for logging only).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn sample_count(size: usize) -> Result<usize, LutError> {
        if !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size) {
            return Err(LutError::UnsupportedSize(size));
        }
        Ok(size * size * size * 3)
    }

    /// Points per axis (N).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Flat RGB samples, red fastest.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Number of grid points (N³).
    pub fn len(&self) -> usize {
        self.samples.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The sample stored at grid coordinate `(r, g, b)`.
    #[inline]
    pub fn entry(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        let i = (r + g * self.size + b * self.size * self.size) * 3;
        [self.samples[i], self.samples[i + 1], self.samples[i + 2]]
    }

    /// Trilinearly interpolate the grid at `rgb`. Inputs are clamped to [0, 1].
    pub fn sample(&self, rgb: [f32; 3]) -> [f32; 3] {
        let s = self.size;
        let n = (s - 1) as f32;

        let coords = rgb.map(|c| unit(c) * n);

        // Base cell clamped to N-2 so the upper neighbour always exists;
        // an input of exactly 1.0 lands on the last cell with weight 1.
        let r0 = (coords[0] as usize).min(s - 2);
        let g0 = (coords[1] as usize).min(s - 2);
        let b0 = (coords[2] as usize).min(s - 2);
        let r1 = r0 + 1;
        let g1 = g0 + 1;
        let b1 = b0 + 1;
        let fr = coords[0] - r0 as f32;
        let fg = coords[1] - g0 as f32;
        let fb = coords[2] - b0 as f32;

        let c000 = self.entry(r0, g0, b0);
        let c100 = self.entry(r1, g0, b0);
        let c010 = self.entry(r0, g1, b0);
        let c110 = self.entry(r1, g1, b0);
        let c001 = self.entry(r0, g0, b1);
        let c101 = self.entry(r1, g0, b1);
        let c011 = self.entry(r0, g1, b1);
        let c111 = self.entry(r1, g1, b1);

        let mut out = [0.0f32; 3];
        for c in 0..3 {
            let c00 = c000[c] * (1.0 - fr) + c100[c] * fr;
            let c10 = c010[c] * (1.0 - fr) + c110[c] * fr;
            let c01 = c001[c] * (1.0 - fr) + c101[c] * fr;
            let c11 = c011[c] * (1.0 - fr) + c111[c] * fr;
            let c0 = c00 * (1.0 - fg) + c10 * fg;
            let c1 = c01 * (1.0 - fg) + c11 * fg;
            out[c] = c0 * (1.0 - fb) + c1 * fb;
        }
        out
    }

    /// Sample the grid and blend the result with `rgb` by `intensity`.
    pub fn apply(&self, rgb: [f32; 3], intensity: f32) -> [f32; 3] {
        let intensity = unit(intensity);
        if intensity == 0.0 {
            return rgb;
        }
        blend(rgb, self.sample(rgb), intensity)
    }

    /// Largest per-component difference between two grids of the same size.
    pub fn max_difference(&self, other: &LutGrid) -> Option<f32> {
        if self.size != other.size {
            return None;
        }
        Some(
            self.samples
                .iter()
                .zip(&other.samples)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f32::max),
        )
    }
}

/// Linear blend between the original and the graded color:
/// `original * (1 - intensity) + graded * intensity`.
#[inline]
pub fn blend(original: [f32; 3], graded: [f32; 3], intensity: f32) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for c in 0..3 {
        out[c] = original[c] * (1.0 - intensity) + graded[c] * intensity;
    }
    out
}

/// Clamp to [0, 1], mapping NaN to 0.
#[inline]
fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
