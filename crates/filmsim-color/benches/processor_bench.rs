//! Benchmarks for the CPU color processor.
//!
//! Run with: cargo bench -p filmsim-color

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use filmsim_color::{
    apply_look, formats, render_bounded, GrainSettings, GrainStyle, GrainTexture, Look, LutGrid,
};
use filmsim_core::Raster;

fn film_lut(size: usize) -> LutGrid {
    LutGrid::from_fn(size, |[r, g, b]| {
        [
            (r * 0.95 + 0.03).min(1.0),
            g * g * 0.3 + g * 0.7,
            (b * 0.85 + r * 0.1).min(1.0),
        ]
    })
    .expect("valid LUT")
}

fn bench_sampler(c: &mut Criterion) {
    let lut = film_lut(33);

    c.bench_function("trilinear_sample_33", |bencher| {
        bencher.iter(|| lut.sample(black_box([0.31, 0.62, 0.77])));
    });
}

fn bench_full_resolution(c: &mut Criterion) {
    let lut = film_lut(33);
    let source = Raster::test_pattern(1920, 1080).expect("raster");
    let texture = GrainTexture::generate(GrainStyle::Medium);
    let grain = GrainSettings {
        enabled: true,
        ..Default::default()
    };

    c.bench_function("apply_look_1080p", |bencher| {
        bencher.iter(|| {
            let mut img = source.clone();
            apply_look(&mut img, &Look::new(Some(&lut), 0.8));
            img
        });
    });

    c.bench_function("apply_look_grain_1080p", |bencher| {
        bencher.iter(|| {
            let mut img = source.clone();
            apply_look(
                &mut img,
                &Look::new(Some(&lut), 0.8).with_grain(&texture, &grain),
            );
            img
        });
    });

    c.bench_function("render_bounded_512", |bencher| {
        bencher.iter(|| render_bounded(&source, &Look::new(Some(&lut), 1.0), black_box(512)));
    });
}

fn bench_parsing(c: &mut Criterion) {
    let text = formats::write_cube(&film_lut(33), "bench");

    c.bench_function("parse_cube_33", |bencher| {
        bencher.iter(|| formats::parse_cube(black_box(&text)));
    });
}

criterion_group!(benches, bench_sampler, bench_full_resolution, bench_parsing);
criterion_main!(benches);
