//! Per-cell descriptor assembly.
//!
//! Each descriptor has 16 floats:
//! `[directional 0..8 | combined 8..12 | texture 12..16]`.

use crate::feature::{BINS, EXTRACTED_FEATURES, HALF_BINS};
use crate::util::math::inv_sqrt_eps;

/// Upper bound of one normalized bin contribution.
const CLIP: f32 = 0.2;
/// Keeps empty neighbourhoods finite.
const NORM_EPS: f32 = 1e-4;
/// Brings the texture channel to the same range as the others (about 1/sqrt(18)).
const TEXTURE_SCALE: f32 = 0.2357;

#[inline]
fn clipped(value: f32, n: &[f32; 4]) -> [f32; 4] {
    [
        (value * n[0]).min(CLIP),
        (value * n[1]).min(CLIP),
        (value * n[2]).min(CLIP),
        (value * n[3]).min(CLIP),
    ]
}

#[inline]
fn half_sum(c: [f32; 4]) -> f32 {
    0.5 * ((c[0] + c[1]) + (c[2] + c[3]))
}

/// Builds the descriptor of one cell from its histogram and block energies.
pub(crate) fn assemble_cell(hist: &[f32], denominators: &[f32; 4], out: &mut [f32]) {
    debug_assert_eq!(hist.len(), BINS);
    debug_assert_eq!(out.len(), EXTRACTED_FEATURES);

    let n = denominators.map(|d| inv_sqrt_eps(d, NORM_EPS));
    let mut texture = [0.0f32; 4];
    for (b, &value) in hist.iter().enumerate() {
        let c = clipped(value, &n);
        for (t, v) in texture.iter_mut().zip(c) {
            *t += v;
        }
        out[b] = half_sum(c);
    }
    for k in 0..HALF_BINS {
        let c = clipped(hist[k] + hist[k + HALF_BINS], &n);
        out[BINS + k] = half_sum(c);
    }
    for (dst, t) in out[BINS + HALF_BINS..].iter_mut().zip(texture) {
        *dst = t * TEXTURE_SCALE;
    }
}

/// Assembles one feature row.
///
/// `hist` is the full histogram row; feature `x` reads cell `x + 1`.
pub(crate) fn assemble_row(hist: &[f32], denominators: &[[f32; 4]], out: &mut [f32]) {
    for (x, (dst, denom)) in out
        .chunks_exact_mut(EXTRACTED_FEATURES)
        .zip(denominators.iter())
        .enumerate()
    {
        let start = (x + 1) * BINS;
        assemble_cell(&hist[start..start + BINS], denom, dst);
    }
}
