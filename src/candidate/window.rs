//! Maximum of the sum of two small score windows.

use crate::image::ImageView;
use crate::util::{HogLiteError, HogLiteResult};

/// Side length of the searched window.
pub const WINDOW: usize = 7;

/// Location and value of a window maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowMax {
    /// Largest `a + b` in the window.
    pub score: f32,
    /// Column of the maximum.
    pub x: usize,
    /// Row of the maximum.
    pub y: usize,
}

/// Finds the maximum of `a + b` over the first seven columns of both views.
///
/// Both views need at least 7 columns and the same height of 1 to 7 rows.
/// Ties resolve to the first position in row-major order; NaN sums are
/// never selected unless every sum is NaN.
pub fn find_max_7x7(a: ImageView<'_, f32>, b: ImageView<'_, f32>) -> HogLiteResult<WindowMax> {
    let height = a.height();
    if a.width() < WINDOW || height > WINDOW {
        return Err(HogLiteError::DimensionMismatch {
            context: "max window",
            expected_width: WINDOW,
            expected_height: WINDOW,
            width: a.width(),
            height,
        });
    }
    b.ensure_covers("max window", WINDOW, height)?;
    if b.height() != height {
        return Err(HogLiteError::DimensionMismatch {
            context: "max window",
            expected_width: WINDOW,
            expected_height: height,
            width: b.width(),
            height: b.height(),
        });
    }

    let mut best = WindowMax {
        score: f32::NAN,
        x: 0,
        y: 0,
    };
    for y in 0..height {
        let ra = &a.row_unchecked(y)[..WINDOW];
        let rb = &b.row_unchecked(y)[..WINDOW];
        for (x, (&va, &vb)) in ra.iter().zip(rb).enumerate() {
            let score = va + vb;
            if score > best.score || (best.score.is_nan() && !score.is_nan()) {
                best = WindowMax { score, x, y };
            }
        }
    }
    Ok(best)
}
