//! Integration tests for LUT loading across every encoding.

use filmsim_color::formats::{encode_tiled, write_binary};
use filmsim_color::{load_lut, write_cube, LutGrid};
use std::path::Path;

/// A film-like curve: lifted blacks, warm highlights, slight channel crosstalk.
fn film_look(size: usize) -> LutGrid {
    LutGrid::from_fn(size, |[r, g, b]| {
        let lift = |v: f32| 0.04 + 0.92 * v;
        [
            lift(0.9 * r + 0.1 * g).min(1.0),
            lift(g),
            lift(0.85 * b + 0.05 * r),
        ]
    })
    .unwrap()
}

fn in_unit_range(lut: &LutGrid) -> bool {
    lut.samples().iter().all(|v| (0.0..=1.0).contains(v))
}

fn ms_lut_bytes(size: usize) -> Vec<u8> {
    let mut bytes = b".MS-LUT ".to_vec();
    bytes.extend(2u32.to_le_bytes());
    bytes.resize(64, 0);
    let identity = LutGrid::identity(size).unwrap();
    for v in identity.samples() {
        bytes.push((v * 255.0).round() as u8);
    }
    bytes
}

/// Headerless BGRA bytes, the layout phone firmwares ship.
fn bgra_table(lut: &LutGrid) -> Vec<u8> {
    lut.samples()
        .chunks_exact(3)
        .flat_map(|p| [p[2], p[1], p[0], 1.0].map(|v| (v * 255.0).round() as u8))
        .collect()
}

fn write(dir: &Path, name: &str, bytes: impl AsRef<[u8]>) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn each_format_loads_to_documented_size() {
    let dir = tempfile::tempdir().unwrap();
    let look = film_look(17);

    let cube = write(dir.path(), "look.cube", write_cube(&look, "Look"));
    let raw = write(dir.path(), "look.bin", write_binary(&look));
    let tiled = dir.path().join("look.png");
    encode_tiled(&look, 17).unwrap().save(&tiled).unwrap();
    let ms = write(dir.path(), "look.MS-LUT", ms_lut_bytes(17));
    let table = write(dir.path(), "look.rgba.bin", bgra_table(&look));

    for path in [&cube, &raw, &tiled, &ms, &table] {
        let lut = load_lut(path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
        assert_eq!(lut.size(), 17, "{}", path.display());
        assert_eq!(lut.len(), 17 * 17 * 17);
        assert_eq!(lut.samples().len(), 17 * 17 * 17 * 3);
        assert!(in_unit_range(&lut));
    }
}

#[test]
fn tiled_and_text_encodings_agree() {
    let look = film_look(16);
    let dir = tempfile::tempdir().unwrap();
    let cube = write(dir.path(), "look.cube", write_cube(&look, "Look"));
    let tiled = dir.path().join("look.png");
    encode_tiled(&look, 4).unwrap().save(&tiled).unwrap();

    let text = load_lut(&cube).unwrap();
    let image = load_lut(&tiled).unwrap();
    assert!(text.max_difference(&image).unwrap() <= 1.0 / 255.0);
}

#[test]
fn byte_table_matches_text_encoding() {
    let look = film_look(16);
    let dir = tempfile::tempdir().unwrap();
    let table = write(dir.path(), "phone.bin", bgra_table(&look));
    assert_eq!(std::fs::metadata(&table).unwrap().len(), 16384);

    let text = load_lut(write(dir.path(), "phone.cube", write_cube(&look, "Phone"))).unwrap();
    let bytes = load_lut(&table).unwrap();
    assert!(text.max_difference(&bytes).unwrap() <= 0.5 / 255.0 + 1e-6);
}

#[test]
fn two_point_ramp_interpolates_midpoint() {
    let text = "LUT_3D_SIZE 2\n\
                0 0 0\n1 0 0\n0 1 0\n1 1 0\n\
                0 0 1\n1 0 1\n0 1 1\n1 1 1\n";
    let dir = tempfile::tempdir().unwrap();
    let lut = load_lut(write(dir.path(), "ramp.cube", text)).unwrap();
    let out = lut.sample([0.5, 0.5, 0.5]);
    for c in out {
        assert!((c - 0.5).abs() < 1e-6);
    }
}

#[test]
fn converted_cube_matches_source() {
    let dir = tempfile::tempdir().unwrap();
    let ms = load_lut(write(dir.path(), "phone.MS-LUT", ms_lut_bytes(17))).unwrap();
    let cube = write(dir.path(), "phone.cube", write_cube(&ms, "phone"));
    let reparsed = load_lut(cube).unwrap();
    assert!(ms.max_difference(&reparsed).unwrap() <= 1e-6);
    assert_eq!(reparsed.title(), Some("phone"));
}

#[test]
fn corrupt_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let truncated = write(dir.path(), "short.cube", "LUT_3D_SIZE 4\n0 0 0\n");
    let one_d = write(dir.path(), "curve.cube", "LUT_1D_SIZE 2\n0 0 0\n1 1 1\n");
    let ragged = write(dir.path(), "ragged.bin", [0u8; 10]);
    for path in [truncated, one_d, ragged] {
        assert!(load_lut(&path).is_err(), "{}", path.display());
    }
}
