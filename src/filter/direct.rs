//! Dense correlation with optional mask.

use crate::feature::FeatureView;
use crate::filter::{
    check_dense, score_map_size, ActiveCorrelator, Correlator, LinearFilter, MASKED_SCORE,
};
use crate::image::{ImageView, ImageViewMut, ScoreMap};
use crate::trace::{trace_event, trace_span};
use crate::util::HogLiteResult;

/// Scores one output row. `mask_row`, when present, has at least `out.len()`
/// entries.
pub(crate) fn correlate_row<C: Correlator>(
    src: FeatureView<'_>,
    filter: &LinearFilter,
    mask_row: Option<&[u8]>,
    y: usize,
    out: &mut [f32],
) {
    match mask_row {
        None => {
            for (x, dst) in out.iter_mut().enumerate() {
                *dst = C::score_at(src, filter, x, y);
            }
        }
        Some(mask_row) => {
            for (x, (dst, &m)) in out.iter_mut().zip(mask_row).enumerate() {
                *dst = if m == 0 {
                    MASKED_SCORE
                } else {
                    C::score_at(src, filter, x, y)
                };
            }
        }
    }
}

/// Correlates `filter` over `src` into `dst`.
///
/// `dst` receives `(src.width - filter.width + 1) x (src.height - filter.height + 1)`
/// scores; larger destinations keep their extra elements. Where `mask` is
/// zero the score is [`MASKED_SCORE`].
pub fn filter_features_into(
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
        masked = mask.is_some()
    )
    .entered();

    for y in 0..height {
        let out = &mut dst.row_mut_unchecked(y)[..width];
        let mask_row = mask.map(|m| m.row_unchecked(y));
        correlate_row::<ActiveCorrelator>(src, filter, mask_row, y, out);
    }

    trace_event!("scores_computed", count = width * height);
    Ok(())
}

/// Correlates `filter` over `src` into a new score map.
pub fn filter_features(
    src: FeatureView<'_>,
    filter: &LinearFilter,
    mask: Option<ImageView<'_, u8>>,
) -> HogLiteResult<ScoreMap> {
    let (width, height) =
        score_map_size(src, filter.width(), filter.height(), filter.feature_size())?;
    let mut scores = ScoreMap::zeros(width, height)?;
    filter_features_into(src, filter, mask, &mut scores.view_mut())?;
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::{filter_features, filter_features_into};
    use crate::feature::{FeatureMap, FeatureSize};
    use crate::filter::{LinearFilter, MASKED_SCORE};
    use crate::image::{ImageView, ImageViewMut};
    use crate::util::HogLiteError;

    fn ones_map(width: usize, height: usize) -> FeatureMap {
        FeatureMap::from_vec(
            vec![1.0; width * height * 8],
            width,
            height,
            FeatureSize::Compressed,
        )
        .unwrap()
    }

    #[test]
    fn output_size_and_values() {
        let map = ones_map(5, 4);
        let filter = LinearFilter::new(2, 3, FeatureSize::Compressed, vec![0.5; 48]).unwrap();
        let scores = filter_features(map.view(), &filter, None).unwrap();
        assert_eq!((scores.width(), scores.height()), (4, 2));
        assert!(scores.data().iter().all(|&v| v == 24.0));
    }

    #[test]
    fn mask_zero_gives_sentinel() {
        let map = ones_map(3, 3);
        let filter = LinearFilter::new(1, 1, FeatureSize::Compressed, vec![1.0; 8]).unwrap();
        let mask_data = [1u8, 0, 1, 0, 1, 0, 1, 1, 0];
        let mask = ImageView::from_slice(&mask_data, 3, 3).unwrap();
        let scores = filter_features(map.view(), &filter, Some(mask)).unwrap();
        for (&m, &s) in mask_data.iter().zip(scores.data()) {
            if m == 0 {
                assert_eq!(s, MASKED_SCORE);
            } else {
                assert_eq!(s, 8.0);
            }
        }
    }

    #[test]
    fn validation_happens_before_writes() {
        let map = ones_map(2, 2);
        let filter = LinearFilter::new(3, 1, FeatureSize::Compressed, vec![1.0; 24]).unwrap();
        let mut buf = vec![7.0f32; 4];
        let mut dst = ImageViewMut::from_slice(&mut buf, 2, 2).unwrap();
        let err = filter_features_into(map.view(), &filter, None, &mut dst).unwrap_err();
        assert_eq!(
            err,
            HogLiteError::FilterTooLarge {
                filter_width: 3,
                filter_height: 1,
                width: 2,
                height: 2
            }
        );
        assert!(buf.iter().all(|&v| v == 7.0));
    }

    #[test]
    fn short_mask_is_rejected() {
        let map = ones_map(4, 4);
        let filter = LinearFilter::new(1, 1, FeatureSize::Compressed, vec![1.0; 8]).unwrap();
        let mask_data = [1u8; 12];
        let mask = ImageView::from_slice(&mask_data, 4, 3).unwrap();
        let err = filter_features(map.view(), &filter, Some(mask)).unwrap_err();
        assert!(matches!(err, HogLiteError::DimensionMismatch { context: "mask", .. }));
    }

    #[test]
    fn layout_mismatch_is_rejected() {
        let map = ones_map(4, 4);
        let filter = LinearFilter::new(1, 1, FeatureSize::Full, vec![1.0; 16]).unwrap();
        let err = filter_features(map.view(), &filter, None).unwrap_err();
        assert_eq!(err, HogLiteError::UnsupportedFeatureSize { size: 16 });
    }
}
