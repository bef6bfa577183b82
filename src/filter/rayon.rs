//! Row-parallel correlation (feature-gated).
//!
//! Output rows are independent, so each rayon task owns one `stride`-sized
//! chunk of the destination buffer. Results are identical to the sequential
//! entry points because every score is computed by the same row routine.

use crate::feature::FeatureView;
use crate::filter::direct::correlate_row;
use crate::filter::separable::{horizontal_row, vertical_row};
use crate::filter::{
    check_dense, score_map_size, ActiveCorrelator, LinearFilter, SeparableFilter,
};
use crate::image::{ImageView, ImageViewMut, ScoreMap};
use crate::trace::{trace_event, trace_span};
use crate::util::HogLiteResult;
use rayon::prelude::*;

/// Parallel version of [`filter_features_into`](crate::filter::filter_features_into).
pub fn filter_features_par_into(
    src: FeatureView<'_>,
    filter: &LinearFilter,
    mask: Option<ImageView<'_, u8>>,
    dst: &mut ImageViewMut<'_, f32>,
) -> HogLiteResult<()> {
    let (width, height) = check_dense(src, filter, mask, dst)?;
    let _span = trace_span!(
        "filter_features",
        width = width,
        height = height,
        masked = mask.is_some(),
        parallel = true
    )
    .entered();

    let (rows, _, stride) = dst.raw_rows_mut();
    rows.par_chunks_mut(stride)
        .take(height)
        .enumerate()
        .for_each(|(y, row)| {
            let mask_row = mask.map(|m| m.row_unchecked(y));
            correlate_row::<ActiveCorrelator>(src, filter, mask_row, y, &mut row[..width]);
        });

    trace_event!("scores_computed", count = width * height);
    Ok(())
}

/// Parallel version of [`filter_features`](crate::filter::filter_features).
pub fn filter_features_par(
    src: FeatureView<'_>,
    filter: &LinearFilter,
    mask: Option<ImageView<'_, u8>>,
) -> HogLiteResult<ScoreMap> {
    let (width, height) =
        score_map_size(src, filter.width(), filter.height(), filter.feature_size())?;
    let mut scores = ScoreMap::zeros(width, height)?;
    filter_features_par_into(src, filter, mask, &mut scores.view_mut())?;
    Ok(scores)
}

/// Parallel version of [`filter_separable_into`](crate::filter::filter_separable_into).
pub fn filter_separable_par_into(
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
        accumulate = accumulate,
        parallel = true
    )
    .entered();

    let mut buffer = vec![0.0f32; width * src.height()];
    buffer
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out)| {
            horizontal_row::<ActiveCorrelator>(src.row_unchecked(y), filter, out);
        });

    let buffer = &buffer;
    let (rows, _, stride) = dst.raw_rows_mut();
    rows.par_chunks_mut(stride)
        .take(height)
        .enumerate()
        .for_each_init(
            || vec![0.0f32; width],
            |scratch, (y, row)| {
                vertical_row::<ActiveCorrelator>(
                    buffer,
                    width,
                    filter,
                    y,
                    scratch,
                    &mut row[..width],
                    accumulate,
                );
            },
        );

    trace_event!("scores_computed", count = width * height);
    Ok(())
}
