//! Integration tests for the GPU pipelines.
//!
//! Each test returns early when the machine has no usable adapter.

use filmsim_color::{apply_look, GrainSettings, GrainStyle, GrainTexture, Look, LutGrid};
use filmsim_core::{FilmSimError, Raster, ViewTransform};
use filmsim_gpu::{DrawOutcome, ExportPipeline, GpuContext, PipelineState, PreviewPipeline};
use glam::Vec2;
use std::sync::Arc;

fn gpu() -> Option<Arc<GpuContext>> {
    match GpuContext::new_blocking() {
        Ok(ctx) => Some(Arc::new(ctx)),
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            None
        }
    }
}

fn max_channel_difference(a: &Raster, b: &Raster) -> u8 {
    assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    a.as_bytes()
        .chunks_exact(4)
        .zip(b.as_bytes().chunks_exact(4))
        .flat_map(|(p, q)| (0..3).map(move |c| p[c].abs_diff(q[c])))
        .max()
        .unwrap_or(0)
}

fn faded_look() -> LutGrid {
    LutGrid::from_fn(17, |[r, g, b]| {
        let fade = |v: f32| 0.06 + 0.88 * v;
        [fade(r), fade(0.95 * g + 0.05 * r), fade(0.9 * b)]
    })
    .unwrap()
}

#[test]
fn gpu_export_matches_cpu() {
    let Some(ctx) = gpu() else { return };
    let mut export = ExportPipeline::new(ctx).unwrap();
    let source = Raster::test_pattern(320, 240).unwrap();
    let lut = faded_look();
    let texture = GrainTexture::generate(GrainStyle::Fine);

    for grain in [
        GrainSettings::default(),
        GrainSettings {
            enabled: true,
            intensity: 0.3,
            scale: 2.0,
            style: GrainStyle::Fine,
        },
    ] {
        for intensity in [0.0, 0.5, 1.0] {
            let look = Look::new(Some(&lut), intensity).with_grain(&texture, &grain);
            let gpu = export.render(&source, &look).unwrap();
            let mut cpu = source.clone();
            apply_look(&mut cpu, &look);
            let diff = max_channel_difference(&gpu, &cpu);
            assert!(diff <= 2, "intensity {} grain {:?}: diff {}", intensity, grain, diff);
        }
    }
}

#[test]
fn gpu_disabled_grain_is_bit_identical() {
    let Some(ctx) = gpu() else { return };
    let mut export = ExportPipeline::new(ctx).unwrap();
    let source = Raster::test_pattern(128, 96).unwrap();
    let lut = faded_look();
    let texture = GrainTexture::generate(GrainStyle::Coarse);
    let disabled = GrainSettings {
        enabled: false,
        intensity: 1.0,
        ..GrainSettings::default()
    };

    let plain = export.render(&source, &Look::new(Some(&lut), 1.0)).unwrap();
    let grained = export
        .render(&source, &Look::new(Some(&lut), 1.0).with_grain(&texture, &disabled))
        .unwrap();
    assert_eq!(plain, grained);
}

#[test]
fn gpu_export_null_look_is_identical() {
    let Some(ctx) = gpu() else { return };
    let mut export = ExportPipeline::new(ctx).unwrap();
    let source = Raster::test_pattern(4000, 3000).unwrap();
    let out = export.render(&source, &Look::new(None, 1.0)).unwrap();
    assert!(out == source);
}

#[test]
fn gpu_export_rejects_oversized_sources() {
    let Some(ctx) = gpu() else { return };
    let max = ctx.max_texture_dimension();
    let export = ExportPipeline::new(Arc::clone(&ctx)).unwrap();
    assert!(matches!(
        export.check_dimensions(max + 1, 16),
        Err(FilmSimError::Gpu(_))
    ));
    assert!(export.check_dimensions(0, 16).is_err());

    let tight = ExportPipeline::with_budget(ctx, 1024).unwrap();
    assert!(matches!(
        tight.check_dimensions(64, 64),
        Err(FilmSimError::OutOfMemory(_))
    ));
}

#[test]
fn gpu_export_after_release_fails() {
    let Some(ctx) = gpu() else { return };
    let mut export = ExportPipeline::new(ctx).unwrap();
    export.release();
    assert!(export.is_released());
    let lut = faded_look();
    let source = Raster::test_pattern(8, 8).unwrap();
    assert!(export.render(&source, &Look::new(Some(&lut), 1.0)).is_err());
}

#[test]
fn preview_uploads_once_per_change() {
    let Some(ctx) = gpu() else { return };
    let mut preview = PreviewPipeline::new(ctx, (160, 120));
    assert_eq!(preview.draw().unwrap(), DrawOutcome::Skipped);
    assert_eq!(preview.state(), PipelineState::Ready);

    preview.set_image(Arc::new(Raster::test_pattern(64, 48).unwrap()));
    preview.set_lut(Some(Arc::new(faded_look())));
    assert_eq!(preview.draw().unwrap(), DrawOutcome::Drawn);
    preview.set_intensity(0.5);
    preview.set_view_transform(ViewTransform::new(2.0, Vec2::new(0.1, 0.0)));
    assert_eq!(preview.draw().unwrap(), DrawOutcome::Drawn);

    let stats = preview.stats();
    assert_eq!(stats.image_uploads, 1);
    assert_eq!(stats.lut_uploads, 1);
    assert_eq!(stats.grain_uploads, 1);
    assert_eq!(stats.frames, 2);

    let frame = preview.read_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (160, 120));

    preview.release();
    assert_eq!(preview.state(), PipelineState::Released);
    assert!(preview.draw().is_err());
}

#[test]
fn preview_letterboxes_wide_images() {
    let Some(ctx) = gpu() else { return };
    let mut preview = PreviewPipeline::new(ctx, (100, 100));
    preview.set_image(Arc::new(Raster::filled(200, 100, [255, 255, 255, 255]).unwrap()));
    preview.draw().unwrap();
    let frame = preview.read_frame().unwrap();
    // Image occupies the middle half vertically; bars above and below are cleared to black.
    assert_eq!(frame.pixel(50, 50)[..3], [255, 255, 255]);
    assert_eq!(frame.pixel(50, 5)[..3], [0, 0, 0]);
    assert_eq!(frame.pixel(50, 95)[..3], [0, 0, 0]);
}

#[test]
fn preview_init_retry_keeps_requested_grain() {
    let Some(ctx) = gpu() else { return };
    let too_wide = ctx.max_texture_dimension() + 1;
    let mut preview = PreviewPipeline::new(ctx, (too_wide, 16));
    let custom = GrainTexture::from_luma(8, 4, vec![128; 32]).unwrap();
    preview.set_grain_texture(Arc::new(custom));

    assert!(preview.init().is_err());
    assert_eq!(preview.state(), PipelineState::Uninitialized);

    preview.resize(64, 64).unwrap();
    preview.init().unwrap();
    assert_eq!(preview.grain_texture_size(), (8, 4));
}

#[test]
fn preview_oversized_resize_keeps_previous_target() {
    let Some(ctx) = gpu() else { return };
    let too_wide = ctx.max_texture_dimension() + 1;
    let mut preview = PreviewPipeline::new(ctx, (64, 48));
    preview.init().unwrap();

    assert!(preview.resize(too_wide, 16).is_err());
    assert_eq!(preview.viewport(), (64, 48));

    preview.set_image(Arc::new(Raster::test_pattern(32, 24).unwrap()));
    assert_eq!(preview.draw().unwrap(), DrawOutcome::Drawn);
    let frame = preview.read_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (64, 48));
}
