//! `.MS-LUT` byte tables found on some phone camera firmwares.
//!
//! The container is a small header followed by N³ entries of 3 or 4 bytes.
//! The header layout varies between versions, so the geometry is recovered
//! from the file size.

use crate::error::LutError;
use crate::lut::LutGrid;
use tracing::debug;

/// File magic.
pub const MAGIC: &[u8] = b".MS-LUT ";

/// Grid sizes tried, in order, when the file size is not a known profile.
const CANDIDATE_SIZES: [usize; 8] = [17, 32, 33, 21, 16, 25, 20, 64];
const CANDIDATE_CHANNELS: [usize; 2] = [3, 4];
const MAX_HEADER_LEN: usize = 4096;

/// Geometry recovered from an `.MS-LUT` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsLutHeader {
    pub version: u32,
    pub size: usize,
    pub channels: usize,
    pub data_offset: usize,
    /// Entries are stored blue-first.
    pub bgr: bool,
}

/// Whether `bytes` start with the `.MS-LUT ` magic.
pub fn is_ms_lut(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

/// Recover the table geometry and channel order.
pub fn read_header(bytes: &[u8]) -> Result<MsLutHeader, LutError> {
    if !is_ms_lut(bytes) {
        return Err(LutError::InvalidLut("missing .MS-LUT magic".into()));
    }
    let version = bytes
        .get(8..12)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0);

    let (size, channels, data_offset) = match bytes.len() {
        14855 => (17, 3, 116),
        98480 => (32, 3, 176),
        len => CANDIDATE_SIZES
            .iter()
            .flat_map(|&n| CANDIDATE_CHANNELS.iter().map(move |&ch| (n, ch)))
            .find_map(|(n, ch)| {
                let header = len.checked_sub(n * n * n * ch)?;
                (header < MAX_HEADER_LEN).then_some((n, ch, header))
            })
            .ok_or_else(|| {
                LutError::InvalidLut(format!("no known table geometry fits {} bytes", len))
            })?,
    };

    let bgr = detect_bgr(bytes, size, channels, data_offset);
    Ok(MsLutHeader {
        version,
        size,
        channels,
        data_offset,
        bgr,
    })
}

/// Along the red axis only the red component should grow. If the third byte
/// grows more than the first, red is stored last.
fn detect_bgr(bytes: &[u8], size: usize, channels: usize, offset: usize) -> bool {
    let mut first = Vec::with_capacity(4);
    let mut third = Vec::with_capacity(4);
    for r in 0..size.min(4) {
        let idx = offset + r * channels;
        if idx + 3 <= bytes.len() {
            first.push(bytes[idx] as i32);
            third.push(bytes[idx + 2] as i32);
        }
    }
    match (first.as_slice(), third.as_slice()) {
        ([f0, .., fl], [t0, .., tl]) => (tl - t0) > (fl - f0),
        _ => false,
    }
}

/// Parse an `.MS-LUT` file into a grid.
pub fn parse_ms_lut(bytes: &[u8]) -> Result<LutGrid, LutError> {
    let header = read_header(bytes)?;
    debug!(?header, "parsed .MS-LUT header");

    let entries = header.size * header.size * header.size;
    let needed = header.data_offset + entries * header.channels;
    if bytes.len() < needed {
        return Err(LutError::Truncated {
            expected: needed,
            got: bytes.len(),
        });
    }

    decode_entries(
        &bytes[header.data_offset..needed],
        header.size,
        header.channels,
        header.bgr,
    )
}

/// Decode `size³` packed 8-bit entries of `channels` bytes each. A fourth
/// byte, when present, is ignored.
pub(crate) fn decode_entries(
    payload: &[u8],
    size: usize,
    channels: usize,
    bgr: bool,
) -> Result<LutGrid, LutError> {
    if !(3..=4).contains(&channels) {
        return Err(LutError::InvalidLut(format!("{} bytes per entry", channels)));
    }
    let entries = size * size * size;
    if payload.len() < entries * channels {
        return Err(LutError::Truncated {
            expected: entries * channels,
            got: payload.len(),
        });
    }
    let mut samples = Vec::with_capacity(entries * 3);
    for entry in payload.chunks_exact(channels).take(entries) {
        let (r, g, b) = if bgr {
            (entry[2], entry[1], entry[0])
        } else {
            (entry[0], entry[1], entry[2])
        };
        samples.extend([r, g, b].map(|v| v as f32 / 255.0));
    }
    LutGrid::new(size, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(size: usize, channels: usize, header_len: usize, bgr: bool) -> Vec<u8> {
        let mut bytes = vec![0u8; header_len];
        bytes[..MAGIC.len()].copy_from_slice(MAGIC);
        bytes[8..12].copy_from_slice(&2u32.to_le_bytes());
        let lut = LutGrid::identity(size).unwrap();
        for rgb in lut.samples().chunks_exact(3) {
            let px = rgb.iter().map(|v| (v * 255.0).round() as u8).collect::<Vec<_>>();
            if bgr {
                bytes.extend([px[2], px[1], px[0]]);
            } else {
                bytes.extend([px[0], px[1], px[2]]);
            }
            if channels == 4 {
                bytes.push(255);
            }
        }
        bytes
    }

    #[test]
    fn test_known_profile_17() {
        let bytes = build(17, 3, 116, false);
        assert_eq!(bytes.len(), 14855);
        let header = read_header(&bytes).unwrap();
        assert_eq!(header.size, 17);
        assert_eq!(header.data_offset, 116);
        assert_eq!(header.version, 2);
        assert!(!header.bgr);

        let lut = parse_ms_lut(&bytes).unwrap();
        assert_eq!(lut.size(), 17);
        assert_eq!(lut.entry(16, 0, 0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_known_profile_32_bgr() {
        let bytes = build(32, 3, 176, true);
        assert_eq!(bytes.len(), 98480);
        let header = read_header(&bytes).unwrap();
        assert!(header.bgr);
        let lut = parse_ms_lut(&bytes).unwrap();
        assert_eq!(lut.entry(31, 0, 0), [1.0, 0.0, 0.0]);
        assert_eq!(lut.entry(0, 0, 31), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_brute_force_four_channels() {
        let bytes = build(33, 4, 64, false);
        let header = read_header(&bytes).unwrap();
        assert_eq!((header.size, header.channels, header.data_offset), (33, 4, 64));
        let lut = parse_ms_lut(&bytes).unwrap();
        assert!(LutGrid::identity(33).unwrap().max_difference(&lut).unwrap() <= 0.5 / 255.0 + 1e-6);
    }

    #[test]
    fn test_rejects_unknown_geometry() {
        let mut bytes = MAGIC.to_vec();
        bytes.resize(100, 0);
        assert!(read_header(&bytes).is_err());
        assert!(read_header(b"not a lut").is_err());
    }
}
