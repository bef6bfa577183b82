//! Sliding correlation of learned filters against feature maps.
//!
//! A filter placement at `(x, y)` reads `filter_height` feature rows starting
//! at row `y`, and from each row the `filter_width * F` consecutive floats
//! starting at cell `x`. Because cells are packed, every filter row reduces to
//! one contiguous dot product, which is the primitive the [`Correlator`]
//! implementations accelerate.

use crate::feature::{FeatureSize, FeatureView};
use crate::image::{ImageView, ImageViewMut};
use crate::util::{HogLiteError, HogLiteResult};

mod direct;
pub mod scalar;
mod separable;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use direct::{filter_features, filter_features_into};
pub use separable::{filter_separable, filter_separable_into};

/// Score written where the mask disables evaluation.
///
/// Lower than any finite threshold a caller can meaningfully use.
pub const MASKED_SCORE: f32 = f32::MIN;

#[cfg(not(feature = "simd"))]
pub(crate) type ActiveCorrelator = scalar::ScalarCorrelator;
#[cfg(feature = "simd")]
pub(crate) type ActiveCorrelator = simd::SimdCorrelator;

/// Arithmetic primitives behind every correlation pass.
pub trait Correlator {
    /// Dot product of two slices of equal length.
    fn dot(a: &[f32], b: &[f32]) -> f32;

    /// `dst[i] += scale * src[i]`.
    fn axpy(dst: &mut [f32], scale: f32, src: &[f32]);

    /// Response of `filter` placed with its top-left cell at `(x, y)`.
    ///
    /// The caller guarantees that the placement lies inside `src`.
    #[inline]
    fn score_at(src: FeatureView<'_>, filter: &LinearFilter, x: usize, y: usize) -> f32 {
        let f = filter.feature_size.channels();
        let span = filter.width * f;
        let mut sum = 0.0f32;
        for dy in 0..filter.height {
            let row = src.row_unchecked(y + dy);
            sum += Self::dot(&row[x * f..x * f + span], filter.row(dy));
        }
        sum
    }
}

/// Dense `width x height` filter over `feature_size` channels.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearFilter {
    width: usize,
    height: usize,
    feature_size: FeatureSize,
    weights: Vec<f32>,
}

impl LinearFilter {
    /// Wraps row-major weights (`height` rows of `width * F` floats).
    pub fn new(
        width: usize,
        height: usize,
        feature_size: FeatureSize,
        weights: Vec<f32>,
    ) -> HogLiteResult<Self> {
        if width == 0 || height == 0 {
            return Err(HogLiteError::InvalidDimensions { width, height });
        }
        let expected = width * height * feature_size.channels();
        if weights.len() != expected {
            return Err(HogLiteError::FilterLength {
                expected,
                got: weights.len(),
            });
        }
        Ok(Self {
            width,
            height,
            feature_size,
            weights,
        })
    }

    /// Expands a separable filter into its dense outer product.
    pub fn from_separable(filter: &SeparableFilter) -> Self {
        let mut weights = Vec::with_capacity(filter.horizontal.len() * filter.vertical.len());
        for &v in &filter.vertical {
            weights.extend(filter.horizontal.iter().map(|&h| h * v));
        }
        Self {
            width: filter.width,
            height: filter.height(),
            feature_size: filter.feature_size,
            weights,
        }
    }

    /// Returns the width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the channel layout.
    pub fn feature_size(&self) -> FeatureSize {
        self.feature_size
    }

    /// Returns the row-major weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub(crate) fn row(&self, dy: usize) -> &[f32] {
        let span = self.width * self.feature_size.channels();
        &self.weights[dy * span..(dy + 1) * span]
    }
}

/// Rank-1 filter: `filter[dy][dx] = vertical[dy] * horizontal[dx]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SeparableFilter {
    width: usize,
    feature_size: FeatureSize,
    horizontal: Vec<f32>,
    vertical: Vec<f32>,
}

impl SeparableFilter {
    /// Creates a separable filter from `width * F` horizontal weights and
    /// one vertical weight per filter row.
    pub fn new(
        width: usize,
        feature_size: FeatureSize,
        horizontal: Vec<f32>,
        vertical: Vec<f32>,
    ) -> HogLiteResult<Self> {
        if width == 0 || vertical.is_empty() {
            return Err(HogLiteError::InvalidDimensions {
                width,
                height: vertical.len(),
            });
        }
        let expected = width * feature_size.channels();
        if horizontal.len() != expected {
            return Err(HogLiteError::FilterLength {
                expected,
                got: horizontal.len(),
            });
        }
        Ok(Self {
            width,
            feature_size,
            horizontal,
            vertical,
        })
    }

    /// Returns the width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in cells.
    pub fn height(&self) -> usize {
        self.vertical.len()
    }

    /// Returns the channel layout.
    pub fn feature_size(&self) -> FeatureSize {
        self.feature_size
    }

    /// Returns the horizontal weights.
    pub fn horizontal(&self) -> &[f32] {
        &self.horizontal
    }

    /// Returns the vertical weights.
    pub fn vertical(&self) -> &[f32] {
        &self.vertical
    }
}

/// Validates a placement of a `width x height` filter over `src` and returns
/// the score-map size.
pub(crate) fn score_map_size(
    src: FeatureView<'_>,
    width: usize,
    height: usize,
    feature_size: FeatureSize,
) -> HogLiteResult<(usize, usize)> {
    if src.feature_size() != feature_size {
        return Err(HogLiteError::UnsupportedFeatureSize {
            size: feature_size.channels(),
        });
    }
    if src.width() < width || src.height() < height {
        return Err(HogLiteError::FilterTooLarge {
            filter_width: width,
            filter_height: height,
            width: src.width(),
            height: src.height(),
        });
    }
    Ok((src.width() - width + 1, src.height() - height + 1))
}

/// Shared precondition check for the dense correlators.
pub(crate) fn check_dense(
    src: FeatureView<'_>,
    filter: &LinearFilter,
    mask: Option<ImageView<'_, u8>>,
    dst: &ImageViewMut<'_, f32>,
) -> HogLiteResult<(usize, usize)> {
    let (width, height) = score_map_size(src, filter.width, filter.height, filter.feature_size)?;
    dst.ensure_covers("score map", width, height)?;
    if let Some(mask) = mask {
        mask.ensure_covers("mask", width, height)?;
    }
    Ok((width, height))
}
