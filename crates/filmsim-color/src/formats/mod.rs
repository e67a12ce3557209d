//! LUT asset encodings and format detection.
//!
//! Every encoding converges on the same [`LutGrid`]. Detection happens once
//! per asset, producing a [`LutSource`] that is parsed without touching the
//! filesystem again.

pub mod binary;
pub mod byte_table;
pub mod cube;
pub mod ms_lut;
pub mod tiled;

pub use binary::{parse_binary, write_binary};
pub use byte_table::parse_byte_table;
pub use cube::{parse_cube, write_cube};
pub use ms_lut::parse_ms_lut;
pub use tiled::{encode_tiled, parse_tiled, parse_tiled_image};

use crate::error::LutError;
use crate::lut::LutGrid;
use std::path::Path;
use tracing::debug;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "tif", "tiff", "jpg", "jpeg", "bmp"];

/// How many leading bytes are inspected when sniffing text content.
const SNIFF_LEN: usize = 4096;

/// A LUT asset whose encoding has been identified.
#[derive(Debug, Clone, PartialEq)]
pub enum LutSource {
    /// `.cube` text.
    Text(String),
    /// Raw little-endian f32 stream; `size` is inferred when `None`.
    Binary { bytes: Vec<u8>, size: Option<usize> },
    /// Headerless table of 8-bit entries, blue-first when `bgr` is set.
    ByteTable { bytes: Vec<u8>, bgr: bool },
    /// Encoded image holding tiled depth slices.
    TiledImage(Vec<u8>),
    /// `.MS-LUT` byte table.
    MsLut(Vec<u8>),
}

impl LutSource {
    /// Identify the encoding of `bytes`, using `path` for the extension hint.
    pub fn detect(path: &Path, bytes: Vec<u8>) -> Result<Self, LutError> {
        if ms_lut::is_ms_lut(&bytes) {
            return Ok(Self::MsLut(bytes));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if looks_like_cube_text(&bytes) {
            return Ok(Self::text(&bytes));
        }
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(Self::TiledImage(bytes));
        }
        if ext == "cube" {
            return Ok(Self::text(&bytes));
        }

        let len = bytes.len();
        let byte_table = byte_table::is_known_table(len)
            || (!binary::fits_float_stream(len) && byte_table::table_geometry(len).is_some());
        if byte_table {
            let bgr = byte_table::bgr_from_name(path);
            return Ok(Self::ByteTable { bytes, bgr });
        }
        Ok(Self::Binary { bytes, size: None })
    }

    /// Non-UTF-8 bytes only ever appear in comments and titles, so they are
    /// replaced rather than rejected.
    fn text(bytes: &[u8]) -> Self {
        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Short name of the encoding.
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "cube",
            Self::Binary { .. } => "binary",
            Self::ByteTable { .. } => "byte-table",
            Self::TiledImage(_) => "tiled-image",
            Self::MsLut(_) => "ms-lut",
        }
    }

    /// Parse into a grid.
    pub fn parse(&self) -> Result<LutGrid, LutError> {
        match self {
            Self::Text(text) => parse_cube(text),
            Self::Binary { bytes, size } => parse_binary(bytes, *size),
            Self::ByteTable { bytes, bgr } => parse_byte_table(bytes, *bgr),
            Self::TiledImage(bytes) => parse_tiled(bytes),
            Self::MsLut(bytes) => parse_ms_lut(bytes),
        }
    }
}

fn looks_like_cube_text(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if !head
        .iter()
        .all(|&b| b.is_ascii_graphic() || b.is_ascii_whitespace() || !b.is_ascii())
    {
        return false;
    }
    let head = String::from_utf8_lossy(head);
    head.contains("LUT_3D_SIZE") || head.contains("TITLE")
}

/// Read a LUT asset from disk and parse it.
///
/// The file is read fully and closed before parsing. Grids without a
/// `TITLE` are titled after the file stem.
pub fn load_lut(path: impl AsRef<Path>) -> Result<LutGrid, LutError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let source = LutSource::detect(path, bytes)?;
    debug!(path = %path.display(), format = source.format_name(), "loading LUT");

    let grid = source.parse()?;
    if grid.title().is_some() {
        return Ok(grid);
    }
    Ok(match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => grid.with_title(stem),
        None => grid,
    })
}
