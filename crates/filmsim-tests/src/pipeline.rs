//! Integration tests for the renderer, CPU fallback and catalog.
//!
//! Exercises CPU-side paths only; no GPU required.

use filmsim_color::{apply_look, write_cube, GrainSettings, GrainStyle, GrainTexture, Look, LutGrid};
use filmsim_core::{FilmSimError, Raster, Result};
use filmsim_render::{
    export_cpu, load_catalog, CatalogItem, CpuPreview, ExportBackend, ExportRequest, GrainCache,
    RenderConfig, Renderer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Export backend that fails the way a lost device would.
struct LostDevice {
    calls: Arc<AtomicUsize>,
}

impl ExportBackend for LostDevice {
    fn name(&self) -> &'static str {
        "lost-device"
    }

    fn export(&mut self, _source: &Raster, _look: &Look<'_>) -> Result<Raster> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FilmSimError::Gpu("device lost".into()))
    }

    fn release(&mut self) {}
}

fn renderer(export: Option<Box<dyn ExportBackend>>) -> Renderer {
    let config = RenderConfig {
        gpu_enabled: false,
        viewport_width: 128,
        viewport_height: 96,
        ..RenderConfig::default()
    };
    let viewport = config.viewport();
    Renderer::with_backends(
        config,
        Box::new(CpuPreview::new(viewport)),
        export,
        Arc::new(GrainCache::new()),
    )
    .unwrap()
}

fn cool_look() -> Arc<LutGrid> {
    Arc::new(LutGrid::from_fn(9, |[r, g, b]| [r * 0.9, g, (b * 1.1).min(1.0)]).unwrap())
}

#[test]
fn null_look_export_of_large_image_is_identical() {
    let renderer = renderer(None);
    let source = Arc::new(Raster::test_pattern(4000, 3000).unwrap());
    let request = ExportRequest::new(Arc::clone(&source)).with_grain(GrainSettings {
        enabled: false,
        ..GrainSettings::default()
    });
    let out = renderer.export(request).unwrap();
    assert_eq!((out.width(), out.height()), (4000, 3000));
    assert!(out == *source);
}

#[test]
fn gpu_failure_falls_back_to_cpu_result() {
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = renderer(Some(Box::new(LostDevice {
        calls: Arc::clone(&calls),
    })));
    let source = Arc::new(Raster::test_pattern(64, 48).unwrap());
    let grain = GrainSettings {
        enabled: true,
        intensity: 0.2,
        ..GrainSettings::default()
    };
    let request = ExportRequest::new(Arc::clone(&source))
        .with_lut(cool_look(), 0.8)
        .with_grain(grain);

    let out = renderer.export(request.clone()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let texture = GrainTexture::generate(GrainStyle::Medium);
    let expected = export_cpu(&source, &request.look(&texture), usize::MAX).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn cpu_failure_reaches_caller() {
    let config = RenderConfig {
        gpu_enabled: false,
        cpu_memory_budget: 16,
        ..RenderConfig::default()
    };
    let renderer = Renderer::with_backends(
        config,
        Box::new(CpuPreview::new((32, 32))),
        None,
        Arc::new(GrainCache::new()),
    )
    .unwrap();
    let request = ExportRequest::new(Arc::new(Raster::test_pattern(64, 64).unwrap()))
        .with_lut(cool_look(), 1.0);
    assert!(matches!(
        renderer.export(request),
        Err(FilmSimError::OutOfMemory(_))
    ));
}

#[test]
fn disabled_grain_is_bit_identical() {
    let lut = cool_look();
    let texture = GrainTexture::generate(GrainStyle::Coarse);
    let disabled = GrainSettings {
        enabled: false,
        intensity: 0.9,
        ..GrainSettings::default()
    };
    let zero = GrainSettings {
        enabled: true,
        intensity: 0.0,
        ..GrainSettings::default()
    };

    let mut plain = Raster::test_pattern(96, 64).unwrap();
    apply_look(&mut plain, &Look::new(Some(&lut), 0.7));
    for settings in [&disabled, &zero] {
        let mut grained = Raster::test_pattern(96, 64).unwrap();
        apply_look(
            &mut grained,
            &Look::new(Some(&lut), 0.7).with_grain(&texture, settings),
        );
        assert_eq!(grained, plain);
    }
}

#[test]
fn pending_uploads_happen_once_per_change() {
    let renderer = renderer(None);
    renderer
        .set_image(Arc::new(Raster::test_pattern(200, 100).unwrap()))
        .unwrap();
    renderer.set_lut(Some(cool_look())).unwrap();
    renderer.read_frame().unwrap();

    // State-only changes draw again without re-uploading.
    renderer.set_intensity(0.4).unwrap();
    renderer.set_grain_enabled(true).unwrap();
    renderer.request_frame().unwrap();
    renderer.read_frame().unwrap();

    let stats = renderer.stats().unwrap();
    assert_eq!(stats.image_uploads, 1);
    assert_eq!(stats.lut_uploads, 1);
    assert_eq!(stats.grain_uploads, 1);
    assert!(stats.frames >= 2);

    renderer.set_lut(None).unwrap();
    renderer.set_grain_style(GrainStyle::Fine).unwrap();
    renderer.read_frame().unwrap();
    let stats = renderer.stats().unwrap();
    assert_eq!(stats.lut_uploads, 2);
    assert_eq!(stats.grain_uploads, 2);
    assert_eq!(stats.image_uploads, 1);
}

#[test]
fn preview_frame_fits_viewport() {
    let renderer = renderer(None);
    renderer
        .set_image(Arc::new(Raster::test_pattern(400, 200).unwrap()))
        .unwrap();
    let frame = renderer.read_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (128, 64));

    renderer.resize(64, 64).unwrap();
    let frame = renderer.read_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (64, 32));
}

#[test]
fn catalog_skips_unreadable_luts() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("Portra.cube");
    std::fs::write(&good, write_cube(&cool_look(), "Portra")).unwrap();
    let bad = dir.path().join("Broken.cube");
    std::fs::write(&bad, "LUT_3D_SIZE 1\n0 0 0\n").unwrap();

    let entries = load_catalog(&[
        CatalogItem::new("Portra", &good),
        CatalogItem::new("Broken", &bad),
        CatalogItem::new("Gone", dir.path().join("gone.cube")),
    ]);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Portra");
    assert_eq!(entries[0].lut.size(), 9);
}
