//! Two-pass correlation with rank-1 filters.
//!
//! The horizontal pass correlates every source row with the `width * F`
//! horizontal weights into a `dst_width x src_height` buffer; the vertical
//! pass then combines `height` buffer rows per output row. Summing several
//! separable components with `accumulate` approximates a dense filter at a
//! fraction of the cost.

use crate::feature::FeatureView;
use crate::filter::{score_map_size, ActiveCorrelator, Correlator, SeparableFilter};
use crate::image::{ImageViewMut, ScoreMap};
use crate::trace::{trace_event, trace_span};
use crate::util::HogLiteResult;

/// Horizontal response of one feature row.
#[inline]
pub(crate) fn horizontal_row<C: Correlator>(src_row: &[f32], filter: &SeparableFilter, out: &mut [f32]) {
    let f = filter.feature_size().channels();
    let span = filter.horizontal().len();
    for (x, dst) in out.iter_mut().enumerate() {
        *dst = C::dot(&src_row[x * f..x * f + span], filter.horizontal());
    }
}

/// Vertical combination for output row `y`.
///
/// `buffer` holds the horizontal responses, `row_len` floats per source row.
/// `scratch` must have `out.len()` elements.
#[inline]
pub(crate) fn vertical_row<C: Correlator>(
    buffer: &[f32],
    row_len: usize,
    filter: &SeparableFilter,
    y: usize,
    scratch: &mut [f32],
    out: &mut [f32],
    accumulate: bool,
) {
    scratch.fill(0.0);
    for (k, &v) in filter.vertical().iter().enumerate() {
        let start = (y + k) * row_len;
        C::axpy(scratch, v, &buffer[start..start + row_len]);
    }
    if accumulate {
        for (d, &s) in out.iter_mut().zip(scratch.iter()) {
            *d += s;
        }
    } else {
        out.copy_from_slice(scratch);
    }
}

/// Correlates a separable filter over `src` into `dst`.
///
/// With `accumulate` the responses are added to the existing contents of
/// `dst`, so several components can be summed into one score map.
pub fn filter_separable_into(
    src: FeatureView<'_>,
    filter: &SeparableFilter,
    dst: &mut ImageViewMut<'_, f32>,
    accumulate: bool,
) -> HogLiteResult<()> {
    let (width, height) =
        score_map_size(src, filter.width(), filter.height(), filter.feature_size())?;
    dst.ensure_covers("score map", width, height)?;
    let _span = trace_span!(
        "filter_separable",
        width = width,
        height = height,
        accumulate = accumulate
    )
    .entered();

    let mut buffer = vec![0.0f32; width * src.height()];
    for (y, out) in buffer.chunks_exact_mut(width).enumerate() {
        horizontal_row::<ActiveCorrelator>(src.row_unchecked(y), filter, out);
    }

    let mut scratch = vec![0.0f32; width];
    for y in 0..height {
        let out = &mut dst.row_mut_unchecked(y)[..width];
        vertical_row::<ActiveCorrelator>(&buffer, width, filter, y, &mut scratch, out, accumulate);
    }

    trace_event!("scores_computed", count = width * height);
    Ok(())
}

/// Correlates a separable filter over `src` into a new score map.
pub fn filter_separable(src: FeatureView<'_>, filter: &SeparableFilter) -> HogLiteResult<ScoreMap> {
    let (width, height) =
        score_map_size(src, filter.width(), filter.height(), filter.feature_size())?;
    let mut scores = ScoreMap::zeros(width, height)?;
    filter_separable_into(src, filter, &mut scores.view_mut(), false)?;
    Ok(scores)
}
