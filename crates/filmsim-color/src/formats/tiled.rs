//! LUTs stored as images of tiled depth slices.
//!
//! Each blue slice is an N×N tile (x = red, y = green). Tiles are laid out
//! row-major, so slice `b` sits at tile `(b % columns, b / columns)`. Strips
//! (N²×N, N×N²) and squares (e.g. 512×512 for N = 64) are all handled.

use crate::error::LutError;
use crate::formats::binary::infer_size;
use crate::lut::LutGrid;
use image::RgbImage;

/// Decode an encoded image (PNG, TIFF, ...) and parse it as a tiled LUT.
pub fn parse_tiled(bytes: &[u8]) -> Result<LutGrid, LutError> {
    let img = image::load_from_memory(bytes)?;
    parse_tiled_image(&img.to_rgb8())
}

/// Parse an already decoded RGB image as a tiled LUT.
pub fn parse_tiled_image(img: &RgbImage) -> Result<LutGrid, LutError> {
    let (width, height) = img.dimensions();
    let size = tiled_size(width, height)?;
    let columns = width as usize / size;

    let mut samples = Vec::with_capacity(size * size * size * 3);
    for b in 0..size {
        let x0 = (b % columns) * size;
        let y0 = (b / columns) * size;
        for g in 0..size {
            for r in 0..size {
                let px = img.get_pixel((x0 + r) as u32, (y0 + g) as u32);
                samples.extend(px.0.iter().map(|&c| c as f32 / 255.0));
            }
        }
    }
    LutGrid::new(size, samples)
}

/// Recover N from image dimensions.
fn tiled_size(width: u32, height: u32) -> Result<usize, LutError> {
    let pixels = width as usize * height as usize;
    let size = infer_size(pixels).ok_or_else(|| {
        LutError::InvalidLut(format!(
            "{}x{} image does not hold a whole cube",
            width, height
        ))
    })?;
    if width as usize % size != 0 || height as usize % size != 0 {
        return Err(LutError::InvalidLut(format!(
            "{}x{} image is not a grid of {}x{} tiles",
            width, height, size, size
        )));
    }
    Ok(size)
}

/// Encode a grid as a tiled 8-bit image with `columns` tiles per row.
///
/// `columns` must divide N; N gives a horizontal strip, 1 a vertical strip.
pub fn encode_tiled(grid: &LutGrid, columns: usize) -> Result<RgbImage, LutError> {
    let size = grid.size();
    if columns == 0 || size % columns != 0 {
        return Err(LutError::InvalidLut(format!(
            "{} columns do not tile a {}-point cube",
            columns, size
        )));
    }
    let rows = size / columns;
    // `size * columns * size * rows == size³`, so the layout is always full.
    let mut img = RgbImage::new((size * columns) as u32, (size * rows) as u32);
    for b in 0..size {
        let x0 = (b % columns) * size;
        let y0 = (b / columns) * size;
        for g in 0..size {
            for r in 0..size {
                let rgb = grid.entry(r, g, b).map(|v| (v * 255.0).round() as u8);
                img.put_pixel((x0 + r) as u32, (y0 + g) as u32, image::Rgb(rgb));
            }
        }
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> LutGrid {
        LutGrid::from_fn(4, |[r, g, b]| [g, b, r]).unwrap()
    }

    #[test]
    fn test_horizontal_strip() {
        let img = encode_tiled(&fixture(), 4).unwrap();
        assert_eq!(img.dimensions(), (16, 4));
        let lut = parse_tiled_image(&img).unwrap();
        assert_eq!(lut.size(), 4);
        assert!(fixture().max_difference(&lut).unwrap() <= 0.5 / 255.0 + 1e-6);
    }

    #[test]
    fn test_vertical_strip() {
        let img = encode_tiled(&fixture(), 1).unwrap();
        assert_eq!(img.dimensions(), (4, 16));
        let lut = parse_tiled_image(&img).unwrap();
        assert!(fixture().max_difference(&lut).unwrap() <= 0.5 / 255.0 + 1e-6);
    }

    #[test]
    fn test_square_layout() {
        let img = encode_tiled(&fixture(), 2).unwrap();
        assert_eq!(img.dimensions(), (8, 8));
        let lut = parse_tiled_image(&img).unwrap();
        // Slice b=3 is tile (1, 1); its (r=0, g=0) texel is at (4, 4)
        assert_eq!(img.get_pixel(4, 4).0, [0, 255, 0]);
        assert_eq!(lut.entry(0, 0, 3), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_png_bytes() {
        let img = encode_tiled(&fixture(), 4).unwrap();
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let lut = parse_tiled(&bytes).unwrap();
        assert_eq!(lut.size(), 4);
    }

    #[test]
    fn test_rejects_non_cube_dimensions() {
        assert!(parse_tiled_image(&RgbImage::new(10, 10)).is_err());
        // 27 pixels is 3³, but 27x1 is not made of 3x3 tiles
        assert!(parse_tiled_image(&RgbImage::new(27, 1)).is_err());
        assert!(encode_tiled(&fixture(), 3).is_err());
    }
}
