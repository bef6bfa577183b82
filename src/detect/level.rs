//! Scoring of a single pyramid level.

use crate::candidate::nms::nms_2d;
use crate::candidate::topk::Peak;
use crate::detect::{CoarseStage, DetectConfig, FineFilter};
use crate::feature::{resize_features, FeatureMap};
use crate::filter::{
    filter_features, filter_features_into, filter_separable_into, score_map_size, LinearFilter,
    SeparableFilter, MASKED_SCORE,
};
#[cfg(feature = "rayon")]
use crate::filter::rayon::{filter_features_par_into, filter_separable_par_into};
use crate::image::{ImageView, ImageViewMut, Mask, ScoreMap};
use crate::mask::build_mask;
use crate::trace::{trace_event, trace_span};
use crate::util::HogLiteResult;

/// Upscale between the coarse (half-resolution) and fine score grids.
const COARSE_SCALE: usize = 2;

/// Scores one level and returns its suppressed peaks.
pub(crate) fn score_level(
    map: &FeatureMap,
    level: usize,
    fine: &FineFilter,
    cfg: &DetectConfig,
) -> HogLiteResult<Vec<Peak>> {
    let _span = trace_span!(
        "score_level",
        level = level,
        width = map.width(),
        height = map.height()
    )
    .entered();

    let (fw, fh) = fine.size();
    let (width, height) = score_map_size(map.view(), fw, fh, map.feature_size())?;
    let mask = match &cfg.coarse {
        Some(stage) => coarse_mask(map, stage, width, height)?,
        None => None,
    };
    let mask_view = mask.as_ref().map(Mask::view);

    let scores = match fine {
        FineFilter::Dense(filter) => dense_scores(map, filter, mask_view, cfg.parallel)?,
        FineFilter::Separable(parts) => {
            let mut scores = separable_scores(map, parts, width, height, cfg.parallel)?;
            if let Some(mask) = mask_view {
                apply_mask(&mut scores, mask);
            }
            scores
        }
    };

    let mut peaks = threshold_peaks(&scores, cfg.threshold, level);
    let candidates = peaks.len();
    let kept = nms_2d(&mut peaks, cfg.nms_radius);
    trace_event!("level_peaks", candidates = candidates, kept = kept.len());
    Ok(kept)
}

/// Builds the fine-grid mask from a half-resolution correlation.
///
/// Returns `None` when the half-resolution level is too small for the coarse
/// filter, in which case the fine pass runs dense.
fn coarse_mask(
    map: &FeatureMap,
    stage: &CoarseStage,
    width: usize,
    height: usize,
) -> HogLiteResult<Option<Mask>> {
    let half_w = map.width().div_ceil(COARSE_SCALE);
    let half_h = map.height().div_ceil(COARSE_SCALE);
    if half_w < stage.filter.width() || half_h < stage.filter.height() {
        return Ok(None);
    }
    let half = resize_features(map.view(), half_w, half_h)?;
    let coarse = filter_features(half.view(), &stage.filter, None)?;
    let mask = build_mask(
        coarse.view(),
        stage.threshold,
        COARSE_SCALE,
        stage.window,
        width,
        height,
    )?;
    Ok(Some(mask))
}

fn dense_scores(
    map: &FeatureMap,
    filter: &LinearFilter,
    mask: Option<ImageView<'_, u8>>,
    parallel: bool,
) -> HogLiteResult<ScoreMap> {
    let (width, height) =
        score_map_size(map.view(), filter.width(), filter.height(), filter.feature_size())?;
    let mut scores = ScoreMap::zeros(width, height)?;
    correlate_dense(map, filter, mask, &mut scores.view_mut(), parallel)?;
    Ok(scores)
}

fn separable_scores(
    map: &FeatureMap,
    parts: &[SeparableFilter],
    width: usize,
    height: usize,
    parallel: bool,
) -> HogLiteResult<ScoreMap> {
    let mut scores = ScoreMap::zeros(width, height)?;
    for (i, part) in parts.iter().enumerate() {
        correlate_component(map, part, &mut scores.view_mut(), i > 0, parallel)?;
    }
    Ok(scores)
}

#[cfg(feature = "rayon")]
fn correlate_dense(
    map: &FeatureMap,
    filter: &LinearFilter,
    mask: Option<ImageView<'_, u8>>,
    dst: &mut ImageViewMut<'_, f32>,
    parallel: bool,
) -> HogLiteResult<()> {
    if parallel {
        filter_features_par_into(map.view(), filter, mask, dst)
    } else {
        filter_features_into(map.view(), filter, mask, dst)
    }
}

#[cfg(not(feature = "rayon"))]
fn correlate_dense(
    map: &FeatureMap,
    filter: &LinearFilter,
    mask: Option<ImageView<'_, u8>>,
    dst: &mut ImageViewMut<'_, f32>,
    _parallel: bool,
) -> HogLiteResult<()> {
    filter_features_into(map.view(), filter, mask, dst)
}

#[cfg(feature = "rayon")]
fn correlate_component(
    map: &FeatureMap,
    part: &SeparableFilter,
    dst: &mut ImageViewMut<'_, f32>,
    accumulate: bool,
    parallel: bool,
) -> HogLiteResult<()> {
    if parallel {
        filter_separable_par_into(map.view(), part, dst, accumulate)
    } else {
        filter_separable_into(map.view(), part, dst, accumulate)
    }
}

#[cfg(not(feature = "rayon"))]
fn correlate_component(
    map: &FeatureMap,
    part: &SeparableFilter,
    dst: &mut ImageViewMut<'_, f32>,
    accumulate: bool,
    _parallel: bool,
) -> HogLiteResult<()> {
    filter_separable_into(map.view(), part, dst, accumulate)
}

fn apply_mask(scores: &mut ScoreMap, mask: ImageView<'_, u8>) {
    let width = scores.width();
    let mut view = scores.view_mut();
    for y in 0..view.height() {
        let mask_row = mask.row_unchecked(y);
        let row = view.row_mut_unchecked(y);
        for (s, &m) in row.iter_mut().zip(&mask_row[..width]) {
            if m == 0 {
                *s = MASKED_SCORE;
            }
        }
    }
}

fn threshold_peaks(scores: &ScoreMap, threshold: f32, level: usize) -> Vec<Peak> {
    let width = scores.width();
    scores
        .data()
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score > threshold)
        .map(|(i, &score)| Peak {
            x: i % width,
            y: i / width,
            score,
            level,
        })
        .collect()
}
