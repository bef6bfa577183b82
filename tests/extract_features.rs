use hoglite::lowlevel::EXTRACTED_FEATURES;
use hoglite::{
    extract_features, extract_features_into, CellSize, FeatureMap, FeatureSize, FeatureViewMut,
    HogLiteError, HogLiteExtractor, ImageView,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn square_image(size: usize, x0: usize, x1: usize, bg: u8, fg: u8) -> Vec<u8> {
    let mut data = vec![bg; size * size];
    for y in x0..x1 {
        for x in x0..x1 {
            data[y * size + x] = fg;
        }
    }
    data
}

fn texture(map: &FeatureMap, x: usize, y: usize) -> f32 {
    map.cell(x, y).unwrap()[12..16].iter().sum()
}

#[test]
fn flat_image_has_no_energy() {
    let data = vec![128u8; 32 * 32];
    let view = ImageView::from_slice(&data, 32, 32).unwrap();
    let map = extract_features(view, CellSize::Eight).unwrap();
    assert_eq!((map.width(), map.height()), (2, 2));
    assert_eq!(map.feature_size(), FeatureSize::Full);
    assert!(map.data().iter().all(|&v| v == 0.0));
}

#[test]
fn bright_square_raises_texture_on_its_edges() {
    let data = square_image(64, 24, 40, 20, 220);
    let view = ImageView::from_slice(&data, 64, 64).unwrap();
    let map = extract_features(view, CellSize::Eight).unwrap();
    assert_eq!((map.width(), map.height()), (6, 6));

    // Feature (2, 2) describes the cell holding the top-left corner.
    assert!(texture(&map, 2, 2) > 0.01, "edge texture {}", texture(&map, 2, 2));
    // Feature (5, 5) is far from every edge.
    assert_eq!(texture(&map, 5, 5), 0.0);
    assert!(map.cell(5, 5).unwrap().iter().all(|&v| v == 0.0));
}

#[test]
fn vertical_step_votes_into_a_single_orientation() {
    let width = 48;
    let height = 48;
    let data: Vec<u8> = (0..width * height)
        .map(|i| if i % width < 20 { 10 } else { 200 })
        .collect();
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let map = extract_features(view, CellSize::Eight).unwrap();

    let mut seen_edge = false;
    for cell in map.data().chunks_exact(EXTRACTED_FEATURES) {
        for (b, &v) in cell[..8].iter().enumerate() {
            if b != 7 {
                assert_eq!(v, 0.0, "bin {b}");
            }
        }
        assert_eq!(cell[11], cell[7]);
        seen_edge |= cell[7] > 0.0;
    }
    assert!(seen_edge);
}

#[test]
fn contrast_normalization_removes_global_gain() {
    // Block normalization divides out the step height.
    let make = |lo: u8, hi: u8| -> FeatureMap {
        let data: Vec<u8> = (0..40 * 40)
            .map(|i| if i % 40 < 17 { lo } else { hi })
            .collect();
        let view = ImageView::from_slice(&data, 40, 40).unwrap();
        extract_features(view, CellSize::Four).unwrap()
    };
    let weak = make(100, 140);
    let strong = make(20, 220);
    for (a, b) in weak.data().iter().zip(strong.data()) {
        assert!((a - b).abs() < 0.02, "{a} vs {b}");
    }
}

#[test]
fn strided_input_matches_packed_copy() {
    let mut rng = StdRng::seed_from_u64(7);
    let width = 70;
    let height = 54;
    let stride = 83;
    let mut padded = vec![0u8; stride * height];
    for v in padded.iter_mut() {
        *v = rng.random_range(0..=255);
    }
    let mut packed = Vec::with_capacity(width * height);
    for y in 0..height {
        packed.extend_from_slice(&padded[y * stride..y * stride + width]);
    }

    let strided = ImageView::new(&padded, width, height, stride).unwrap();
    let contiguous = ImageView::from_slice(&packed, width, height).unwrap();
    let a = extract_features(strided, CellSize::Four).unwrap();
    let b = extract_features(contiguous, CellSize::Four).unwrap();
    assert_eq!(a, b);
}

#[test]
fn into_variant_validates_destination_first() {
    let data = vec![0u8; 40 * 40];
    let view = ImageView::from_slice(&data, 40, 40).unwrap();

    let mut buf = vec![5.0f32; 16 * 2 * 2];
    let mut dst = FeatureViewMut::new(&mut buf, 2, 2, FeatureSize::Full, 32).unwrap();
    let err = extract_features_into(view, CellSize::Eight, &mut dst).unwrap_err();
    assert!(matches!(err, HogLiteError::DimensionMismatch { .. }));
    assert!(buf.iter().all(|&v| v == 5.0));

    let mut small = vec![0.0f32; 8 * 3 * 3];
    let mut dst = FeatureViewMut::new(&mut small, 3, 3, FeatureSize::Compressed, 24).unwrap();
    let err = HogLiteExtractor::new(CellSize::Eight)
        .extract(view, &mut dst)
        .unwrap_err();
    assert_eq!(err, HogLiteError::UnsupportedFeatureSize { size: 8 });
}
