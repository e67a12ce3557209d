//! RGBA8 raster images in CPU memory.
//!
//! Every stage of the pipeline (LUT processing, GPU upload, export readback)
//! exchanges images as tightly packed RGBA8 rows.

use crate::error::{FilmSimError, Result};
use std::sync::Arc;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// An RGBA8 image with tightly packed rows (`stride == width * 4`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Allocate a zeroed raster, reporting allocation failure as an error
    /// instead of aborting.
    pub fn try_new(width: u32, height: u32) -> Result<Self> {
        let len = Self::byte_len(width, height)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            FilmSimError::OutOfMemory(format!(
                "cannot allocate {}x{} raster ({} bytes): {}",
                width, height, len, e
            ))
        })?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap existing RGBA8 pixel data.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::byte_len(width, height)?;
        if data.len() != expected {
            return Err(FilmSimError::InvalidParameter(format!(
                "raster {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a raster filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let mut raster = Self::try_new(width, height)?;
        for px in raster.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
        Ok(raster)
    }

    fn byte_len(width: u32, height: u32) -> Result<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| {
                FilmSimError::InvalidParameter(format!("raster {}x{} is too large", width, height))
            })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Whether the raster has no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw RGBA8 bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Raw RGBA8 bytes, mutable.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the raster and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Get a row of pixel data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Read a single pixel.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Write a single pixel.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Memory usage in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }

    /// Create a test pattern: color bars over a horizontal luminance ramp.
    ///
    /// The top half holds eight bars, the bottom half a gradient in every
    /// channel, so the pattern exercises both saturated and in-between values.
    pub fn test_pattern(width: u32, height: u32) -> Result<Self> {
        const BARS: [[u8; 4]; 8] = [
            [255, 255, 255, 255], // White
            [255, 255, 0, 255],   // Yellow
            [0, 255, 255, 255],   // Cyan
            [0, 255, 0, 255],     // Green
            [255, 0, 255, 255],   // Magenta
            [255, 0, 0, 255],     // Red
            [0, 0, 255, 255],     // Blue
            [0, 0, 0, 255],       // Black
        ];

        let mut raster = Self::try_new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                let rgba = if y < height / 2 {
                    BARS[(x as u64 * 8 / width as u64) as usize]
                } else {
                    let t = (x as u64 * 255 / (width.max(2) - 1) as u64) as u8;
                    let u = (y as u64 * 255 / (height.max(2) - 1) as u64) as u8;
                    [t, u, 255 - t, 255]
                };
                raster.set_pixel(x, y, rgba);
            }
        }
        Ok(raster)
    }
}

/// Arc-wrapped raster for shared ownership across threads.
pub type SharedRaster = Arc<Raster>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_size() {
        let raster = Raster::try_new(1920, 1080).unwrap();
        assert_eq!(raster.memory_size(), 1920 * 1080 * 4);
        assert_eq!(raster.stride(), 1920 * 4);
        assert!(raster.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_rgba8_rejects_wrong_length() {
        assert!(Raster::from_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(Raster::from_rgba8(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_pixel_roundtrip() {
        let mut raster = Raster::try_new(4, 3).unwrap();
        raster.set_pixel(3, 2, [1, 2, 3, 4]);
        assert_eq!(raster.pixel(3, 2), [1, 2, 3, 4]);
        assert_eq!(&raster.row(2)[12..16], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_test_pattern() {
        let raster = Raster::test_pattern(64, 32).unwrap();
        assert_eq!(raster.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(raster.pixel(63, 0), [0, 0, 0, 255]);
        // Ramp row starts dark in red, bright in blue
        let ramp = raster.pixel(0, 31);
        assert_eq!(ramp[0], 0);
        assert_eq!(ramp[2], 255);
    }

    #[test]
    fn test_filled() {
        let raster = Raster::filled(3, 3, [10, 20, 30, 40]).unwrap();
        assert!(raster.as_bytes().chunks(4).all(|p| p == [10, 20, 30, 40]));
    }
}
