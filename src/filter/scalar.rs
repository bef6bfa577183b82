//! Scalar reference correlator.

use crate::filter::Correlator;

/// Plain iterator arithmetic; the reference every other correlator is
/// compared against.
pub struct ScalarCorrelator;

impl Correlator for ScalarCorrelator {
    #[inline]
    fn dot(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(&x, &y)| x * y).sum()
    }

    #[inline]
    fn axpy(dst: &mut [f32], scale: f32, src: &[f32]) {
        debug_assert_eq!(dst.len(), src.len());
        for (d, &s) in dst.iter_mut().zip(src) {
            *d += scale * s;
        }
    }
}
