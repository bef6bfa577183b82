use criterion::{criterion_group, criterion_main, Criterion};
use hoglite::{
    build_mask, extract_features, filter_features, filter_separable, CellSize, CoarseStage,
    DetectConfig, Detector, FeatureSize, ImageView, LinearFilter, PyramidConfig, SeparableFilter,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn ramp(len: usize, period: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (i % period) as f32 / period as f32 - 0.5)
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let width = 640;
    let height = 480;
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height).unwrap();

    c.bench_function("extract_cell8", |b| {
        b.iter(|| black_box(extract_features(view, CellSize::Eight).unwrap()));
    });
    c.bench_function("extract_cell4", |b| {
        b.iter(|| black_box(extract_features(view, CellSize::Four).unwrap()));
    });

    let map = extract_features(view, CellSize::Eight).unwrap();
    let filter = LinearFilter::new(8, 8, FeatureSize::Full, ramp(8 * 8 * 16, 29)).unwrap();
    c.bench_function("filter_direct_8x8", |b| {
        b.iter(|| black_box(filter_features(map.view(), &filter, None).unwrap()));
    });

    let sep = SeparableFilter::new(8, FeatureSize::Full, ramp(8 * 16, 13), ramp(8, 5)).unwrap();
    c.bench_function("filter_separable_8x8", |b| {
        b.iter(|| black_box(filter_separable(map.view(), &sep).unwrap()));
    });

    let scores = filter_features(map.view(), &filter, None).unwrap();
    let (sw, sh) = (scores.width(), scores.height());
    c.bench_function("build_mask_scale2", |b| {
        b.iter(|| black_box(build_mask(scores.view(), 0.0, 2, 4, sw * 2, sh * 2).unwrap()));
    });

    let pyramid = PyramidConfig {
        max_levels: 4,
        scale_step: 0.8,
        min_size: 8,
    };
    let dense = Detector::new(filter.clone()).with_config(DetectConfig {
        pyramid: pyramid.clone(),
        ..DetectConfig::default()
    });
    c.bench_function("detect_dense", |b| {
        b.iter(|| black_box(dense.detect(view).unwrap()));
    });

    let coarse = LinearFilter::new(4, 4, FeatureSize::Full, ramp(4 * 4 * 16, 17)).unwrap();
    let cascaded = Detector::new(filter).with_config(DetectConfig {
        pyramid,
        coarse: Some(CoarseStage {
            filter: coarse,
            threshold: 0.5,
            window: 4,
        }),
        ..DetectConfig::default()
    });
    c.bench_function("detect_coarse_to_fine", |b| {
        b.iter(|| black_box(cascaded.detect(view).unwrap()));
    });
}

#[cfg(feature = "rayon")]
fn bench_parallel(c: &mut Criterion) {
    let image = make_image(640, 480);
    let view = ImageView::from_slice(&image, 640, 480).unwrap();
    c.bench_function("extract_cell4_parallel", |b| {
        b.iter(|| black_box(hoglite::extract_features_par(view, CellSize::Four).unwrap()));
    });
}

#[cfg(not(feature = "rayon"))]
fn bench_parallel(_c: &mut Criterion) {}

criterion_group!(benches, bench_pipeline, bench_parallel);
criterion_main!(benches);
