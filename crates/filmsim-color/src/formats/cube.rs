//! Text `.cube` LUTs.

use crate::error::LutError;
use crate::lut::LutGrid;
use std::fmt::Write as _;
use tracing::debug;

/// Parse a text `.cube` file containing a 3D LUT.
pub fn parse_cube(content: &str) -> Result<LutGrid, LutError> {
    let mut size: Option<usize> = None;
    let mut title: Option<String> = None;
    let mut samples = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        if starts_numeric(first) {
            let mut count = 0;
            for token in line.split_whitespace() {
                let v: f32 = token
                    .parse()
                    .map_err(|_| LutError::parse(line_no, format!("bad number '{}'", token)))?;
                if !v.is_finite() {
                    return Err(LutError::parse(line_no, "non-finite value"));
                }
                samples.push(v);
                count += 1;
            }
            if count != 3 {
                return Err(LutError::parse(
                    line_no,
                    format!("expected 3 values, got {}", count),
                ));
            }
            continue;
        }

        match first {
            "LUT_3D_SIZE" => {
                let value = tokens
                    .next()
                    .ok_or_else(|| LutError::parse(line_no, "missing LUT_3D_SIZE value"))?;
                let n: usize = value
                    .parse()
                    .map_err(|e| LutError::parse(line_no, format!("bad LUT_3D_SIZE: {}", e)))?;
                size = Some(n);
            }
            "LUT_1D_SIZE" => {
                return Err(LutError::InvalidLut("expected 3D LUT, got 1D".into()));
            }
            "TITLE" => {
                let rest = line["TITLE".len()..].trim().trim_matches('"');
                if !rest.is_empty() {
                    title = Some(rest.to_string());
                }
            }
            // DOMAIN_MIN/DOMAIN_MAX and vendor keywords do not affect the
            // sample mapping.
            _ => debug!(line = line_no, keyword = first, "ignoring cube directive"),
        }
    }

    let size = size.ok_or_else(|| LutError::InvalidLut("missing LUT_3D_SIZE".into()))?;
    if !(LutGrid::MIN_SIZE..=LutGrid::MAX_SIZE).contains(&size) {
        return Err(LutError::UnsupportedSize(size));
    }
    let expected = size * size * size;
    let got = samples.len() / 3;
    if got != expected {
        return Err(LutError::DimensionMismatch { expected, got });
    }

    let grid = LutGrid::new(size, samples)?;
    Ok(match title {
        Some(t) => grid.with_title(t),
        None => grid,
    })
}

fn starts_numeric(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

/// Encode a grid as `.cube` text.
pub fn write_cube(grid: &LutGrid, title: &str) -> String {
    let mut out = String::with_capacity(grid.len() * 27 + 128);
    let _ = writeln!(out, "TITLE \"{}\"", title);
    let _ = writeln!(out, "LUT_3D_SIZE {}", grid.size());
    out.push_str("DOMAIN_MIN 0.0 0.0 0.0\n");
    out.push_str("DOMAIN_MAX 1.0 1.0 1.0\n\n");
    for rgb in grid.samples().chunks_exact(3) {
        let _ = writeln!(out, "{:.6} {:.6} {:.6}", rgb[0], rgb[1], rgb[2]);
    }
    out
}
