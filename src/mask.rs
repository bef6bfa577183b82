//! Threshold masks that prune a fine correlation pass.
//!
//! A coarse score at `(sx, sy)` above the threshold enables every fine
//! position in the `size x size` window anchored at `(sx * scale, sy * scale)`.
//! The builder counts passing coarse scores with a summed-area table and
//! answers one rectangle query per fine position, so the cost does not
//! depend on the window size.

use crate::image::{ImageView, ImageViewMut, Mask};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{ceil_div, floor_div};
use crate::util::{HogLiteError, HogLiteResult};

/// Coarse index interval that can enable output index `i` along one axis.
fn axis_ranges(coarse: usize, fine: usize, scale: usize, size: usize) -> Vec<Option<(usize, usize)>> {
    let last = coarse as isize - 1;
    let scale = scale as isize;
    let size = size as isize;
    (0..fine as isize)
        .map(|i| {
            let lo = ceil_div(i + 1 - size, scale).max(0);
            let hi = floor_div(i, scale).min(last);
            (lo <= hi).then_some((lo as usize, hi as usize))
        })
        .collect()
}

/// Summed-area table of `score > threshold` with one zero row and column of
/// padding on the low side.
fn indicator_sat(scores: ImageView<'_, f32>, threshold: f32) -> Vec<u32> {
    let w = scores.width();
    let h = scores.height();
    let pitch = w + 1;
    let mut sat = vec![0u32; pitch * (h + 1)];
    for y in 0..h {
        let row = scores.row_unchecked(y);
        let mut run = 0u32;
        for (x, &score) in row.iter().enumerate() {
            run += u32::from(score > threshold);
            sat[(y + 1) * pitch + x + 1] = sat[y * pitch + x + 1] + run;
        }
    }
    sat
}

/// Builds a mask for a fine score map of the size of `dst`.
///
/// `scale` must be 1 or 2 and `size` at least 1. Every element of the
/// `dst` view is written with 1 (evaluate) or 0 (skip).
pub fn build_mask_into(
    scores: ImageView<'_, f32>,
    threshold: f32,
    scale: usize,
    size: usize,
    dst: &mut ImageViewMut<'_, u8>,
) -> HogLiteResult<()> {
    if scale != 1 && scale != 2 {
        return Err(HogLiteError::InvalidScale { scale });
    }
    if size == 0 {
        return Err(HogLiteError::InvalidWindow { size });
    }
    let width = dst.width();
    let height = dst.height();
    let _span = trace_span!(
        "build_mask",
        coarse_width = scores.width(),
        coarse_height = scores.height(),
        width = width,
        height = height
    )
    .entered();

    let sat = indicator_sat(scores, threshold);
    let pitch = scores.width() + 1;
    let xs = axis_ranges(scores.width(), width, scale, size);
    let ys = axis_ranges(scores.height(), height, scale, size);

    let mut enabled = 0usize;
    for (y, ry) in ys.iter().enumerate() {
        let out = dst.row_mut_unchecked(y);
        let Some((y0, y1)) = *ry else {
            out.fill(0);
            continue;
        };
        let top = y0 * pitch;
        let bottom = (y1 + 1) * pitch;
        for (m, rx) in out.iter_mut().zip(xs.iter()) {
            *m = match *rx {
                Some((x0, x1)) => {
                    let count = sat[bottom + x1 + 1] + sat[top + x0]
                        - sat[top + x1 + 1]
                        - sat[bottom + x0];
                    u8::from(count > 0)
                }
                None => 0,
            };
            enabled += usize::from(*m);
        }
    }

    trace_event!("mask_built", enabled = enabled, total = width * height);
    Ok(())
}

/// Builds a new `width x height` mask.
pub fn build_mask(
    scores: ImageView<'_, f32>,
    threshold: f32,
    scale: usize,
    size: usize,
    width: usize,
    height: usize,
) -> HogLiteResult<Mask> {
    let mut mask = Mask::zeros(width, height)?;
    build_mask_into(scores, threshold, scale, size, &mut mask.view_mut())?;
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::{axis_ranges, build_mask, build_mask_into};
    use crate::image::{ImageView, ImageViewMut};
    use crate::util::HogLiteError;

    #[test]
    fn axis_ranges_cover_window() {
        // Coarse 3 cells, scale 2, window 3: sx covers [2sx, 2sx + 3).
        let r = axis_ranges(3, 8, 2, 3);
        assert_eq!(r[0], Some((0, 0)));
        assert_eq!(r[2], Some((0, 1)));
        assert_eq!(r[3], Some((1, 1)));
        assert_eq!(r[6], Some((2, 2)));
        assert_eq!(r[7], None);
    }

    #[test]
    fn single_peak_enables_its_window() {
        let mut scores = vec![0.0f32; 16];
        scores[4 + 1] = 1.0; // (1, 1)
        let view = ImageView::from_slice(&scores, 4, 4).unwrap();
        let mask = build_mask(view, 0.5, 2, 3, 8, 8).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                let expected = (2..5).contains(&x) && (2..5).contains(&y);
                assert_eq!(*mask.get(x, y).unwrap() != 0, expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn threshold_is_strict() {
        let scores = vec![0.5f32; 4];
        let view = ImageView::from_slice(&scores, 2, 2).unwrap();
        let mask = build_mask(view, 0.5, 1, 1, 2, 2).unwrap();
        assert!(mask.data().iter().all(|&m| m == 0));
        let mask = build_mask(view, 0.49, 1, 1, 2, 2).unwrap();
        assert!(mask.data().iter().all(|&m| m == 1));
    }

    #[test]
    fn rejects_bad_parameters_without_writing() {
        let scores = vec![1.0f32; 4];
        let view = ImageView::from_slice(&scores, 2, 2).unwrap();
        let mut buf = vec![9u8; 4];
        let mut dst = ImageViewMut::from_slice(&mut buf, 2, 2).unwrap();
        assert_eq!(
            build_mask_into(view, 0.0, 3, 1, &mut dst).unwrap_err(),
            HogLiteError::InvalidScale { scale: 3 }
        );
        assert_eq!(
            build_mask_into(view, 0.0, 1, 0, &mut dst).unwrap_err(),
            HogLiteError::InvalidWindow { size: 0 }
        );
        assert!(buf.iter().all(|&m| m == 9));
    }
}
