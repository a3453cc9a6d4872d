// tests/unit_tests.rs
use gdal::raster::Buffer;
use veg_map::processing::composite::{clip_f32, clip_u8, MedianCompositor};
use veg_map::processing::indices::{IndexCalculator, NDI};
use veg_map::processing::mask::{SclMask, DEFAULT_MASKED_CODES};
use veg_map::processing::{Classifier, VegClass};
use veg_map::utils::gdal_ext::TypedBuffer;
use veg_map::{NODATA_VALUE_CLASS, NODATA_VALUE_FLOAT};

/// Helper function to create NIR/RED test inputs with specific dimensions
fn create_test_data(width: usize, height: usize, nir_values: &[f32], red_values: &[f32]) -> Vec<TypedBuffer> {
    let mut nir_data = vec![0.0f32; width * height];
    let mut red_data = vec![0.0f32; width * height];

    // Fill with test data (repeating pattern if needed)
    for i in 0..width * height {
        nir_data[i] = nir_values[i % nir_values.len()];
        red_data[i] = red_values[i % red_values.len()];
    }

    vec![
        TypedBuffer::F32(Buffer::new((width, height), nir_data)),
        TypedBuffer::F32(Buffer::new((width, height), red_data)),
    ]
}

/// Helper function to extract result values from TypedBuffer
fn get_results(result: &TypedBuffer) -> Vec<f32> {
    match result {
        TypedBuffer::F32(buffer) => buffer.data().to_vec(),
        _ => panic!("Expected F32 buffer"),
    }
}

// ---------------------------------------------------------------------------
// Cloud mask
// ---------------------------------------------------------------------------

/// SCL codes 3, 8, 9 and 10 mask a pixel; every other code passes the
/// reflectance through untouched.
#[test]
fn test_scl_mask_codes() {
    let mask = SclMask::default();

    for code in 0..=11u16 {
        let scl = TypedBuffer::U8(Buffer::new((1, 1), vec![code as u8]));
        let mut band = Buffer::new((1, 1), vec![0.25f32]);
        mask.apply(&scl, &mut band).unwrap();

        if DEFAULT_MASKED_CODES.contains(&code) {
            assert_eq!(band.data()[0], NODATA_VALUE_FLOAT, "code {} should mask", code);
        } else {
            assert_eq!(band.data()[0], 0.25, "code {} should pass through", code);
        }
    }
}

#[test]
fn test_scl_mask_u16_band() {
    let mask = SclMask::default();
    let scl = TypedBuffer::U16(Buffer::new((2, 1), vec![9u16, 4u16]));
    let mut band = Buffer::new((2, 1), vec![0.5f32, 0.5]);

    mask.apply(&scl, &mut band).unwrap();
    assert_eq!(band.data()[0], NODATA_VALUE_FLOAT);
    assert_eq!(band.data()[1], 0.5);
}

#[test]
fn test_scl_mask_custom_codes() {
    let mask = SclMask::new(Some(vec![6]));
    assert!(mask.is_masked(6));
    assert!(!mask.is_masked(3));
}

#[test]
fn test_scl_mask_shape_mismatch() {
    let mask = SclMask::default();
    let scl = TypedBuffer::U8(Buffer::new((2, 2), vec![0; 4]));
    let mut band = Buffer::new((3, 2), vec![0.0f32; 6]);
    assert!(mask.apply(&scl, &mut band).is_err());
}

#[test]
fn test_scl_mask_rejects_float_scl() {
    let mask = SclMask::default();
    let scl = TypedBuffer::F32(Buffer::new((1, 1), vec![3.0f32]));
    let mut band = Buffer::new((1, 1), vec![0.1f32]);
    assert!(mask.apply(&scl, &mut band).is_err());
}

// ---------------------------------------------------------------------------
// Median composite
// ---------------------------------------------------------------------------

#[test]
fn test_median_composite_odd_count() {
    let stack = vec![
        Buffer::new((2, 1), vec![0.3f32, 0.1]),
        Buffer::new((2, 1), vec![0.1f32, 0.5]),
        Buffer::new((2, 1), vec![0.2f32, 0.3]),
    ];

    let result = MedianCompositor.composite(&stack).unwrap();
    assert_eq!(result.data()[0], 0.2);
    assert_eq!(result.data()[1], 0.3);
}

#[test]
fn test_median_composite_even_count() {
    let stack = vec![
        Buffer::new((1, 1), vec![0.1f32]),
        Buffer::new((1, 1), vec![0.2f32]),
        Buffer::new((1, 1), vec![0.4f32]),
        Buffer::new((1, 1), vec![0.8f32]),
    ];

    // Mean of the two middle values
    let result = MedianCompositor.composite(&stack).unwrap();
    assert!((result.data()[0] - 0.3).abs() < 1e-6);
}

/// Masked observations are skipped; a pixel masked in every scene stays
/// nodata in the composite.
#[test]
fn test_median_composite_skips_nodata() {
    let stack = vec![
        Buffer::new((2, 1), vec![NODATA_VALUE_FLOAT, NODATA_VALUE_FLOAT]),
        Buffer::new((2, 1), vec![0.6f32, NODATA_VALUE_FLOAT]),
        Buffer::new((2, 1), vec![0.4f32, NODATA_VALUE_FLOAT]),
    ];

    let result = MedianCompositor.composite(&stack).unwrap();
    assert!((result.data()[0] - 0.5).abs() < 1e-6);
    assert_eq!(result.data()[1], NODATA_VALUE_FLOAT);
}

#[test]
fn test_median_composite_skips_nan() {
    let stack = vec![
        Buffer::new((1, 1), vec![f32::NAN]),
        Buffer::new((1, 1), vec![0.4f32]),
    ];
    let result = MedianCompositor.composite(&stack).unwrap();
    assert_eq!(result.data()[0], 0.4);
}

#[test]
fn test_median_composite_single_scene() {
    let stack = vec![Buffer::new((2, 1), vec![0.7f32, NODATA_VALUE_FLOAT])];
    let result = MedianCompositor.composite(&stack).unwrap();
    assert_eq!(result.data()[0], 0.7);
    assert_eq!(result.data()[1], NODATA_VALUE_FLOAT);
}

#[test]
fn test_median_composite_empty_stack() {
    assert!(MedianCompositor.composite(&[]).is_err());
}

#[test]
fn test_median_composite_shape_mismatch() {
    let stack = vec![
        Buffer::new((2, 1), vec![0.1f32, 0.2]),
        Buffer::new((1, 2), vec![0.1f32, 0.2]),
    ];
    assert!(MedianCompositor.composite(&stack).is_err());
}

#[test]
fn test_clip_to_region() {
    let mut band = Buffer::new((2, 2), vec![0.1f32, 0.2, 0.3, 0.4]);
    clip_f32(&mut band, &[true, false, false, true]).unwrap();
    assert_eq!(band.data(), &[0.1, NODATA_VALUE_FLOAT, NODATA_VALUE_FLOAT, 0.4]);

    let mut classes = Buffer::new((2, 2), vec![1u8, 2, 3, 4]);
    clip_u8(&mut classes, &[false, true, true, false]).unwrap();
    assert_eq!(classes.data(), &[NODATA_VALUE_CLASS, 2, 3, NODATA_VALUE_CLASS]);
}

#[test]
fn test_clip_mask_length_mismatch() {
    let mut band = Buffer::new((2, 2), vec![0.0f32; 4]);
    assert!(clip_f32(&mut band, &[true, false]).is_err());
}

// ---------------------------------------------------------------------------
// NDVI
// ---------------------------------------------------------------------------

/// Test NDVI calculation with known values
#[test]
fn test_ndvi_calculation() {
    // Test data pairs (NIR, RED)
    let test_cases = [
        // NIR, RED, Expected NDVI
        (0.5, 0.2, 0.428571),           // (0.5-0.2)/(0.5+0.2)
        (0.3, 0.3, 0.0),                // equal bands
        (0.05, 0.15, -0.5),             // water-like, negative
        (0.0, 0.0, NODATA_VALUE_FLOAT), // divide by zero -> nodata
    ];

    let nir_values: Vec<f32> = test_cases.iter().map(|(nir, _, _)| *nir).collect();
    let red_values: Vec<f32> = test_cases.iter().map(|(_, red, _)| *red).collect();
    let inputs = create_test_data(2, 2, &nir_values, &red_values);

    let ndi = NDI::ndvi();
    let result = ndi.calculate(&inputs);
    let result_values = get_results(&result);

    for (i, (_, _, expected)) in test_cases.iter().enumerate() {
        if *expected == NODATA_VALUE_FLOAT {
            assert_eq!(result_values[i], NODATA_VALUE_FLOAT);
        } else {
            assert!(
                (result_values[i] - expected).abs() < 0.0001,
                "Expected {}, got {} at index {}",
                expected,
                result_values[i],
                i
            );
        }
    }
}

/// Nodata in either input propagates; it never leaks into the ratio.
#[test]
fn test_ndvi_nodata_propagation() {
    let nir_values = [0.5, NODATA_VALUE_FLOAT, 0.5, NODATA_VALUE_FLOAT];
    let red_values = [0.2, 0.2, NODATA_VALUE_FLOAT, NODATA_VALUE_FLOAT];
    let inputs = create_test_data(2, 2, &nir_values, &red_values);

    let result_values = get_results(&NDI::ndvi().calculate(&inputs));

    assert!((result_values[0] - 0.428571).abs() < 0.0001);
    assert_eq!(result_values[1], NODATA_VALUE_FLOAT);
    assert_eq!(result_values[2], NODATA_VALUE_FLOAT);
    assert_eq!(result_values[3], NODATA_VALUE_FLOAT);
}

#[test]
fn test_ndvi_range() {
    let nir_values: Vec<f32> = (1..=100).map(|i| i as f32 * 0.01).collect();
    let red_values: Vec<f32> = (1..=100).map(|i| (101 - i) as f32 * 0.005).collect();
    let inputs = create_test_data(10, 10, &nir_values, &red_values);

    for value in get_results(&NDI::ndvi().calculate(&inputs)) {
        assert!((-1.0..=1.0).contains(&value), "NDVI out of range: {}", value);
    }
}

#[test]
fn test_custom_index_name() {
    let custom_name = "Custom NDI Name";
    let ndi = NDI::new(0, 1, Some(custom_name.to_string()));
    assert_eq!(ndi.name(), custom_name);
    assert_eq!(ndi.required_bands(), 2);

    assert_eq!(NDI::ndvi().name(), "NDVI");
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Ladder tie-breaks: a value equal to a break lands in the higher class.
#[test]
fn test_classify_ladder() {
    let classifier = Classifier::default();

    let cases = [
        (-0.5, 1u8),
        (-0.01, 1),
        (0.0, 2),
        (0.19999, 2),
        (0.2, 3),
        (0.49999, 3),
        (0.5, 4),
        (0.9, 4),
    ];
    for (value, expected) in cases {
        assert_eq!(
            classifier.classify_value(value),
            expected,
            "value {} misclassified",
            value
        );
    }
}

#[test]
fn test_classify_raster() {
    let index = Buffer::new(
        (3, 2),
        vec![-0.2f32, 0.1, 0.3, 0.7, NODATA_VALUE_FLOAT, 0.5],
    );
    let classes = Classifier::default().classify(&index);
    assert_eq!(classes.data(), &[1u8, 2, 3, 4, NODATA_VALUE_CLASS, 4]);
}

/// A missing index pixel is never defaulted into a class. NaN counts as
/// missing the same way the sentinel does.
#[test]
fn test_classify_missing_propagation() {
    let index = Buffer::new((2, 1), vec![NODATA_VALUE_FLOAT, f32::NAN]);
    let classes = Classifier::default().classify(&index);
    assert!(classes.data().iter().all(|&c| c == NODATA_VALUE_CLASS));
}

#[test]
fn test_classify_custom_breaks() {
    let classifier = Classifier::new([-0.1, 0.3, 0.6]).unwrap();
    assert_eq!(classifier.classify_value(-0.05), 2);
    assert_eq!(classifier.classify_value(0.3), 3);
    assert_eq!(classifier.classify_value(0.61), 4);
}

#[test]
fn test_classify_rejects_unordered_breaks() {
    assert!(Classifier::new([0.2, 0.2, 0.5]).is_err());
    assert!(Classifier::new([0.5, 0.2, 0.0]).is_err());
}

#[test]
fn test_class_labels() {
    assert_eq!(VegClass::Water.code(), 1);
    assert_eq!(VegClass::DenseVegetation.code(), 4);
    assert_eq!(VegClass::Barren.label(), "Bare soil / Built-up");
    assert_eq!(VegClass::ALL.len(), 4);
}

// ---------------------------------------------------------------------------
// Full chain determinism
// ---------------------------------------------------------------------------

/// Re-running mask -> composite -> NDVI -> classify on identical inputs is
/// bit-identical.
#[test]
fn test_pipeline_idempotence() {
    let run = || {
        let mask = SclMask::default();
        let scl_codes: Vec<u8> = vec![4, 8, 5, 3, 6, 9, 4, 10, 2];

        let mut nir_stack = Vec::new();
        let mut red_stack = Vec::new();
        for offset in 0..3 {
            let scl = TypedBuffer::U8(Buffer::new((3, 3), scl_codes.clone()));
            let mut nir = Buffer::new(
                (3, 3),
                (0..9).map(|i| 0.3 + (i + offset) as f32 * 0.02).collect(),
            );
            let mut red = Buffer::new(
                (3, 3),
                (0..9).map(|i| 0.2 + (i * offset) as f32 * 0.01).collect(),
            );
            mask.apply(&scl, &mut nir).unwrap();
            mask.apply(&scl, &mut red).unwrap();
            nir_stack.push(nir);
            red_stack.push(red);
        }

        let nir = MedianCompositor.composite(&nir_stack).unwrap();
        let red = MedianCompositor.composite(&red_stack).unwrap();
        let ndvi = NDI::ndvi()
            .calculate(&[TypedBuffer::F32(nir), TypedBuffer::F32(red)])
            .into_f32()
            .unwrap();
        let classes = Classifier::default().classify(&ndvi);
        (ndvi.data().to_vec(), classes.data().to_vec())
    };

    let (ndvi_a, classes_a) = run();
    let (ndvi_b, classes_b) = run();

    assert_eq!(ndvi_a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
               ndvi_b.iter().map(|v| v.to_bits()).collect::<Vec<_>>());
    assert_eq!(classes_a, classes_b);
}
