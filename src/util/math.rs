//! Numeric helpers shared by the pipeline stages.

/// Returns `1 / sqrt(value + eps)`.
#[inline]
pub(crate) fn inv_sqrt_eps(value: f32, eps: f32) -> f32 {
    1.0 / (value + eps).sqrt()
}

/// Floor division for signed operands with a positive divisor.
#[inline]
pub(crate) fn floor_div(value: isize, divisor: isize) -> isize {
    debug_assert!(divisor > 0);
    value.div_euclid(divisor)
}

/// Ceiling division for signed operands with a positive divisor.
#[inline]
pub(crate) fn ceil_div(value: isize, divisor: isize) -> isize {
    debug_assert!(divisor > 0);
    -(-value).div_euclid(divisor)
}

/// Bilinear sampling entry along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AxisTap {
    pub index: usize,
    pub next: usize,
    pub frac: f32,
}

/// Builds the per-axis sampling table used by bilinear resampling.
///
/// Source positions follow the pixel-center convention
/// `alpha = (i + 0.5) * src / dst - 0.5` and are clamped so both taps stay
/// inside `0..src`.
pub(crate) fn bilinear_taps(src: usize, dst: usize) -> Vec<AxisTap> {
    let scale = src as f32 / dst as f32;
    (0..dst)
        .map(|i| {
            if src < 2 {
                return AxisTap {
                    index: 0,
                    next: 0,
                    frac: 0.0,
                };
            }
            let alpha = (i as f32 + 0.5) * scale - 0.5;
            let base = alpha.floor();
            let (index, frac) = if base < 0.0 {
                (0, 0.0)
            } else if base as usize > src - 2 {
                (src - 2, 1.0)
            } else {
                (base as usize, alpha - base)
            };
            AxisTap {
                index,
                next: index + 1,
                frac,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{bilinear_taps, ceil_div, floor_div, inv_sqrt_eps};

    #[test]
    fn signed_division_rounds_toward_the_right_side() {
        assert_eq!(floor_div(-3, 2), -2);
        assert_eq!(ceil_div(-3, 2), -1);
        assert_eq!(floor_div(5, 2), 2);
        assert_eq!(ceil_div(5, 2), 3);
        assert_eq!(ceil_div(4, 2), 2);
    }

    #[test]
    fn inv_sqrt_eps_stays_finite_at_zero() {
        let v = inv_sqrt_eps(0.0, 1e-4);
        assert!((v - 100.0).abs() < 1e-3);
    }

    #[test]
    fn taps_for_identity_hit_source_centers() {
        let taps = bilinear_taps(5, 5);
        for (i, tap) in taps.iter().enumerate() {
            let pos = tap.index as f32 + tap.frac;
            assert!((pos - i as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn taps_clamp_at_both_borders() {
        let taps = bilinear_taps(4, 8);
        assert_eq!(taps[0].index, 0);
        assert_eq!(taps[0].frac, 0.0);
        let last = taps.last().unwrap();
        assert_eq!(last.index, 2);
        assert_eq!(last.next, 3);
        assert_eq!(last.frac, 1.0);
    }

    #[test]
    fn taps_for_single_source_cell_read_index_zero() {
        let taps = bilinear_taps(1, 3);
        assert!(taps.iter().all(|t| t.index == 0 && t.next == 0));
    }
}
