#![cfg(feature = "simd")]

use hoglite::lowlevel::{Correlator, ScalarCorrelator, SimdCorrelator};
use hoglite::{FeatureMap, FeatureSize, LinearFilter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vec(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

#[test]
fn dot_matches_scalar_for_every_tail_length() {
    let mut rng = StdRng::seed_from_u64(5);
    for len in 0..70 {
        let a = random_vec(&mut rng, len);
        let b = random_vec(&mut rng, len);
        let s = ScalarCorrelator::dot(&a, &b);
        let v = SimdCorrelator::dot(&a, &b);
        assert!((s - v).abs() < 1e-4, "len {len}: {s} vs {v}");
    }
}

#[test]
fn axpy_matches_scalar_for_every_tail_length() {
    let mut rng = StdRng::seed_from_u64(6);
    for len in 0..40 {
        let src = random_vec(&mut rng, len);
        let base = random_vec(&mut rng, len);
        let mut a = base.clone();
        let mut b = base;
        ScalarCorrelator::axpy(&mut a, -0.75, &src);
        SimdCorrelator::axpy(&mut b, -0.75, &src);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-6, "len {len}: {x} vs {y}");
        }
    }
}

#[test]
fn score_at_matches_scalar_on_random_maps() {
    let mut rng = StdRng::seed_from_u64(8);
    for fs in [FeatureSize::Compressed, FeatureSize::Full] {
        let f = fs.channels();
        let map = FeatureMap::from_vec(random_vec(&mut rng, 14 * 9 * f), 14, 9, fs).unwrap();
        let filter = LinearFilter::new(5, 3, fs, random_vec(&mut rng, 5 * 3 * f)).unwrap();
        for y in 0..=9 - 3 {
            for x in 0..=14 - 5 {
                let s = ScalarCorrelator::score_at(map.view(), &filter, x, y);
                let v = SimdCorrelator::score_at(map.view(), &filter, x, y);
                assert!((s - v).abs() < 1e-3, "({x}, {y}): {s} vs {v}");
            }
        }
    }
}
