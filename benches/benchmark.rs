use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gdal::raster::Buffer;
use veg_map::processing::composite::MedianCompositor;
use veg_map::processing::indices::{IndexCalculator, NDI};
use veg_map::processing::{Classifier, SclMask};
use veg_map::utils::gdal_ext::TypedBuffer;

/// Benchmark the core NDVI calculation logic in isolation
fn benchmark_ndvi_calculation(c: &mut Criterion) {
    // Create synthetic test data
    let size = (1024, 1024);
    let mut nir_data = vec![0.0f32; size.0 * size.1];
    let mut red_data = vec![0.0f32; size.0 * size.1];

    // Fill with some test values (simulating NIR and RED reflectance)
    for i in 0..nir_data.len() {
        nir_data[i] = 0.5 + (i % 100) as f32 * 0.001;
        red_data[i] = 0.25 + (i % 50) as f32 * 0.001;
    }

    let inputs = vec![
        TypedBuffer::F32(Buffer::new(size, nir_data)),
        TypedBuffer::F32(Buffer::new(size, red_data)),
    ];

    let ndi = NDI::ndvi();

    c.bench_function("ndvi_core_calculation", |b| {
        b.iter(|| ndi.calculate(black_box(&inputs)))
    });
}

/// Benchmark the median composite over a stack of masked scenes
fn benchmark_median_composite(c: &mut Criterion) {
    let size = (512, 512);
    let mask = SclMask::default();

    let mut stack = Vec::new();
    for scene in 0..8 {
        let scl_data: Vec<u8> = (0..size.0 * size.1).map(|i| ((i + scene) % 12) as u8).collect();
        let scl = TypedBuffer::U8(Buffer::new(size, scl_data));

        let band_data: Vec<f32> = (0..size.0 * size.1)
            .map(|i| 0.2 + ((i * (scene + 1)) % 100) as f32 * 0.005)
            .collect();
        let mut band = Buffer::new(size, band_data);
        mask.apply(&scl, &mut band).unwrap();
        stack.push(band);
    }

    c.bench_function("median_composite_8_scenes", |b| {
        b.iter(|| MedianCompositor.composite(black_box(&stack)).unwrap())
    });
}

/// Benchmark the threshold classifier
fn benchmark_classify(c: &mut Criterion) {
    let size = (1024, 1024);
    let data: Vec<f32> = (0..size.0 * size.1)
        .map(|i| -0.2 + (i % 120) as f32 * 0.01)
        .collect();
    let index = Buffer::new(size, data);
    let classifier = Classifier::default();

    c.bench_function("classify_ladder", |b| {
        b.iter(|| classifier.classify(black_box(&index)))
    });
}

criterion_group!(
    benches,
    benchmark_ndvi_calculation,
    benchmark_median_composite,
    benchmark_classify
);
criterion_main!(benches);
