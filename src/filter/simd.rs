//! SIMD correlator using the `wide` crate.
//!
//! Filter rows always span a multiple of eight floats (cells carry 8 or 16
//! channels), so dot products run entirely in `f32x8` lanes. `axpy` walks
//! score rows of arbitrary width and finishes with a scalar tail.

use crate::filter::Correlator;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    (arr[0] + arr[1] + arr[2] + arr[3]) + (arr[4] + arr[5] + arr[6] + arr[7])
}

/// `wide`-based correlator.
pub struct SimdCorrelator;

impl Correlator for SimdCorrelator {
    #[inline]
    fn dot(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        let mut acc = f32x8::ZERO;
        let mut a_chunks = a.chunks_exact(LANES);
        let mut b_chunks = b.chunks_exact(LANES);
        for (ca, cb) in (&mut a_chunks).zip(&mut b_chunks) {
            acc += load_f32x8(ca) * load_f32x8(cb);
        }
        let tail: f32 = a_chunks
            .remainder()
            .iter()
            .zip(b_chunks.remainder())
            .map(|(&x, &y)| x * y)
            .sum();
        hsum(acc) + tail
    }

    #[inline]
    fn axpy(dst: &mut [f32], scale: f32, src: &[f32]) {
        debug_assert_eq!(dst.len(), src.len());
        let s = f32x8::splat(scale);
        let mut d_chunks = dst.chunks_exact_mut(LANES);
        let mut s_chunks = src.chunks_exact(LANES);
        for (cd, cs) in (&mut d_chunks).zip(&mut s_chunks) {
            let out = load_f32x8(cd) + s * load_f32x8(cs);
            cd.copy_from_slice(&out.to_array());
        }
        for (d, &v) in d_chunks
            .into_remainder()
            .iter_mut()
            .zip(s_chunks.remainder())
        {
            *d += scale * v;
        }
    }
}
