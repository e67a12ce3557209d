//! Headerless 8-bit byte tables: N³ packed entries of 3 or 4 bytes.
//!
//! These carry no header, so the geometry comes from the file length and the
//! channel order from the file name.

use crate::error::LutError;
use crate::formats::binary::infer_size;
use crate::formats::ms_lut::decode_entries;
use crate::lut::LutGrid;
use std::path::Path;
use tracing::debug;

/// Table lengths seen on shipping devices, as `(bytes, size, channels)`.
const KNOWN_TABLES: [(usize, usize, usize); 4] = [
    (16384, 16, 4),
    (131072, 32, 4),
    (98304, 32, 3),
    (12288, 16, 3),
];

/// Whether `len` is one of the known table lengths.
pub fn is_known_table(len: usize) -> bool {
    KNOWN_TABLES.iter().any(|&(bytes, ..)| bytes == len)
}

/// Grid size and bytes per entry for a table of `len` bytes.
///
/// Known lengths win; otherwise 4-byte entries are tried before 3-byte ones.
pub fn table_geometry(len: usize) -> Option<(usize, usize)> {
    if let Some(&(_, size, channels)) = KNOWN_TABLES.iter().find(|&&(bytes, ..)| bytes == len) {
        return Some((size, channels));
    }
    [4, 3].into_iter().find_map(|channels| {
        if len % channels != 0 {
            return None;
        }
        infer_size(len / channels)
            .filter(|&size| size >= 2)
            .map(|size| (size, channels))
    })
}

/// Entries are blue-first unless the file name carries an `.rgb.` tag.
pub fn bgr_from_name(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    !name.contains(".rgb.")
}

/// Parse a headerless byte table.
pub fn parse_byte_table(bytes: &[u8], bgr: bool) -> Result<LutGrid, LutError> {
    let (size, channels) = table_geometry(bytes.len()).ok_or_else(|| {
        LutError::InvalidLut(format!("no byte table geometry fits {} bytes", bytes.len()))
    })?;
    debug!(size, channels, bgr, "parsing byte table");
    decode_entries(bytes, size, channels, bgr)
}
