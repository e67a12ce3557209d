//! Raw little-endian f32 LUT streams.

use crate::error::LutError;
use crate::lut::LutGrid;

/// Parse a flat stream of `N³ × 3` little-endian f32 values.
///
/// When `size` is `None` it is inferred from the cube root of the entry count.
pub fn parse_binary(bytes: &[u8], size: Option<usize>) -> Result<LutGrid, LutError> {
    if bytes.len() % 4 != 0 {
        return Err(LutError::InvalidLut(format!(
            "byte length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    let floats = bytes.len() / 4;
    if floats % 3 != 0 {
        return Err(LutError::InvalidLut(format!(
            "float count {} is not a multiple of 3",
            floats
        )));
    }
    let entries = floats / 3;

    let size = match size {
        Some(n) => {
            let expected = n.saturating_mul(n).saturating_mul(n);
            if expected != entries {
                return Err(LutError::DimensionMismatch {
                    expected,
                    got: entries,
                });
            }
            n
        }
        None => infer_size(entries).ok_or_else(|| {
            LutError::InvalidLut(format!("{} entries is not a perfect cube", entries))
        })?,
    };

    let samples = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    LutGrid::new(size, samples)
}

/// Encode a grid as a raw little-endian f32 stream.
pub fn write_binary(grid: &LutGrid) -> Vec<u8> {
    grid.samples().iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Whether `len` bytes could hold a whole `N³ × 3` f32 grid.
pub(crate) fn fits_float_stream(len: usize) -> bool {
    len % 12 == 0 && infer_size(len / 12).is_some()
}

/// Integer cube root of `entries`, if it is a perfect cube.
pub(crate) fn infer_size(entries: usize) -> Option<usize> {
    let n = (entries as f64).cbrt().round() as usize;
    (n > 0 && n * n * n == entries).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_roundtrip_with_inferred_size() {
        let lut = LutGrid::from_fn(4, |[r, g, b]| [b, g, r]).unwrap();
        let bytes = write_binary(&lut);
        assert_eq!(bytes.len(), 4 * 4 * 4 * 3 * 4);
        let back = parse_binary(&bytes, None).unwrap();
        assert_eq!(back.size(), 4);
        assert_eq!(back.samples(), lut.samples());
    }

    #[test]
    fn test_explicit_size_mismatch() {
        let bytes = write_binary(&LutGrid::identity(3).unwrap());
        assert!(matches!(
            parse_binary(&bytes, Some(4)),
            Err(LutError::DimensionMismatch { expected: 64, got: 27 })
        ));
        assert!(parse_binary(&bytes, Some(3)).is_ok());
    }

    #[test]
    fn test_rejects_ragged_lengths() {
        assert!(parse_binary(&[0u8; 7], None).is_err());
        // 4 floats: not a multiple of 3
        assert!(parse_binary(&[0u8; 16], None).is_err());
        // 2 entries: not a perfect cube
        assert!(parse_binary(&[0u8; 24], None).is_err());
    }

    #[test]
    fn test_clamps_and_rejects_nan() {
        let mut values = vec![0.5f32; 24];
        values[0] = 2.0;
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(parse_binary(&bytes, None).unwrap().samples()[0], 1.0);

        values[5] = f32::NAN;
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        assert!(parse_binary(&bytes, None).is_err());
    }

    #[test]
    fn test_infer_size() {
        assert_eq!(infer_size(33 * 33 * 33), Some(33));
        assert_eq!(infer_size(64 * 64 * 64), Some(64));
        assert_eq!(infer_size(10), None);
        assert_eq!(infer_size(0), None);
    }
}
