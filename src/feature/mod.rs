//! HOG-Lite feature maps and the extraction pipeline.
//!
//! A feature map is a row-major grid of per-cell descriptors. Each cell holds
//! `feature_size` consecutive floats; rows are separated by an explicit stride
//! counted in floats, so padded layouts produced by other code can be borrowed
//! without copying.

use crate::image::{ImageView, ImageViewMut};
use crate::util::{HogLiteError, HogLiteResult};

mod assemble;
mod normalize;
pub mod compress;
mod extract;
mod gradient;
pub mod pyramid;
pub mod resize;

pub use compress::{compress_features, compress_features_into, PCA_INPUT, PCA_OUTPUT};
pub use extract::{extract_features, extract_features_into, HogLiteExtractor};
#[cfg(feature = "rayon")]
pub use extract::extract_features_par;
pub use pyramid::{FeaturePyramid, PyramidConfig, PyramidLevel};
pub use resize::{resize_features, resize_features_into};

/// Number of orientation bins per cell histogram.
pub(crate) const BINS: usize = 8;
/// Half of the orientation bins; the two halves fold into one combined group.
pub(crate) const HALF_BINS: usize = BINS / 2;
/// Number of floats emitted per cell by the extractor.
pub const EXTRACTED_FEATURES: usize = 16;

/// Spatial size of a histogram cell in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellSize {
    /// 4x4 pixel cells.
    Four,
    /// 8x8 pixel cells.
    Eight,
}

impl CellSize {
    /// Returns the cell side length in pixels.
    pub fn pixels(self) -> usize {
        match self {
            CellSize::Four => 4,
            CellSize::Eight => 8,
        }
    }

    /// Smallest image side the extractor accepts.
    pub fn min_image_size(self) -> usize {
        self.pixels() * 3
    }
}

impl TryFrom<usize> for CellSize {
    type Error = HogLiteError;

    fn try_from(cell: usize) -> HogLiteResult<Self> {
        match cell {
            4 => Ok(CellSize::Four),
            8 => Ok(CellSize::Eight),
            _ => Err(HogLiteError::UnsupportedCellSize { cell }),
        }
    }
}

/// Number of channels per cell in a feature map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureSize {
    /// PCA-compressed descriptors.
    Compressed,
    /// Descriptors as produced by the extractor.
    Full,
}

impl FeatureSize {
    /// Returns the channel count.
    pub fn channels(self) -> usize {
        match self {
            FeatureSize::Compressed => 8,
            FeatureSize::Full => 16,
        }
    }
}

impl TryFrom<usize> for FeatureSize {
    type Error = HogLiteError;

    fn try_from(size: usize) -> HogLiteResult<Self> {
        match size {
            8 => Ok(FeatureSize::Compressed),
            16 => Ok(FeatureSize::Full),
            _ => Err(HogLiteError::UnsupportedFeatureSize { size }),
        }
    }
}

/// Borrowed feature grid with a stride in floats.
#[derive(Clone, Copy, Debug)]
pub struct FeatureView<'a> {
    raw: ImageView<'a, f32>,
    width: usize,
    feature_size: FeatureSize,
}

impl<'a> FeatureView<'a> {
    /// Creates a view over `height` rows of `width` cells each.
    pub fn new(
        data: &'a [f32],
        width: usize,
        height: usize,
        feature_size: FeatureSize,
        stride: usize,
    ) -> HogLiteResult<Self> {
        let row_len = width
            .checked_mul(feature_size.channels())
            .ok_or(HogLiteError::InvalidDimensions { width, height })?;
        let raw = ImageView::new(data, row_len, height, stride)?;
        Ok(Self {
            raw,
            width,
            feature_size,
        })
    }

    /// Creates a view over a tightly packed buffer.
    pub fn from_slice(
        data: &'a [f32],
        width: usize,
        height: usize,
        feature_size: FeatureSize,
    ) -> HogLiteResult<Self> {
        Self::new(
            data,
            width,
            height,
            feature_size,
            width * feature_size.channels(),
        )
    }

    /// Returns the grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in cells.
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the channel layout.
    pub fn feature_size(&self) -> FeatureSize {
        self.feature_size
    }

    /// Returns the row stride in floats.
    pub fn stride(&self) -> usize {
        self.raw.stride()
    }

    /// Returns the floats of row `y` (`width * channels` values).
    pub fn row(&self, y: usize) -> Option<&'a [f32]> {
        self.raw.row(y)
    }

    /// Returns the descriptor of cell `(x, y)`.
    pub fn cell(&self, x: usize, y: usize) -> Option<&'a [f32]> {
        if x >= self.width {
            return None;
        }
        let f = self.feature_size.channels();
        self.raw.row(y).map(|row| &row[x * f..(x + 1) * f])
    }

    #[inline]
    pub(crate) fn row_unchecked(&self, y: usize) -> &'a [f32] {
        self.raw.row_unchecked(y)
    }

    /// Returns a zero-copy view over a window of cells.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> HogLiteResult<Self> {
        let f = self.feature_size.channels();
        let raw = self.raw.roi(x * f, y, width * f, height)?;
        Ok(Self {
            raw,
            width,
            feature_size: self.feature_size,
        })
    }
}

/// Mutable feature grid with a stride in floats.
#[derive(Debug)]
pub struct FeatureViewMut<'a> {
    raw: ImageViewMut<'a, f32>,
    width: usize,
    feature_size: FeatureSize,
}

impl<'a> FeatureViewMut<'a> {
    /// Creates a mutable view over `height` rows of `width` cells each.
    pub fn new(
        data: &'a mut [f32],
        width: usize,
        height: usize,
        feature_size: FeatureSize,
        stride: usize,
    ) -> HogLiteResult<Self> {
        let row_len = width
            .checked_mul(feature_size.channels())
            .ok_or(HogLiteError::InvalidDimensions { width, height })?;
        let raw = ImageViewMut::new(data, row_len, height, stride)?;
        Ok(Self {
            raw,
            width,
            feature_size,
        })
    }

    /// Returns the grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in cells.
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the channel layout.
    pub fn feature_size(&self) -> FeatureSize {
        self.feature_size
    }

    /// Reborrows as an immutable view.
    pub fn as_view(&self) -> FeatureView<'_> {
        FeatureView {
            raw: self.raw.as_view(),
            width: self.width,
            feature_size: self.feature_size,
        }
    }

    #[inline]
    pub(crate) fn row_mut_unchecked(&mut self, y: usize) -> &mut [f32] {
        self.raw.row_mut_unchecked(y)
    }

    pub(crate) fn ensure_shape(
        &self,
        context: &'static str,
        width: usize,
        height: usize,
        feature_size: FeatureSize,
    ) -> HogLiteResult<()> {
        if self.feature_size != feature_size {
            return Err(HogLiteError::UnsupportedFeatureSize {
                size: self.feature_size.channels(),
            });
        }
        if self.width < width || self.height() < height {
            return Err(HogLiteError::DimensionMismatch {
                context,
                expected_width: width,
                expected_height: height,
                width: self.width,
                height: self.height(),
            });
        }
        Ok(())
    }
}

/// Owned, tightly packed feature grid.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMap {
    data: Vec<f32>,
    width: usize,
    height: usize,
    feature_size: FeatureSize,
}

impl FeatureMap {
    /// Creates a zero-filled map.
    pub fn zeros(width: usize, height: usize, feature_size: FeatureSize) -> HogLiteResult<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(feature_size.channels()))
            .filter(|&len| len > 0)
            .ok_or(HogLiteError::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![0.0; len],
            width,
            height,
            feature_size,
        })
    }

    /// Wraps a tightly packed buffer.
    pub fn from_vec(
        data: Vec<f32>,
        width: usize,
        height: usize,
        feature_size: FeatureSize,
    ) -> HogLiteResult<Self> {
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(feature_size.channels()))
            .filter(|&len| len > 0)
            .ok_or(HogLiteError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(HogLiteError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            feature_size,
        })
    }

    /// Copies a strided view into a packed map.
    pub fn from_view(view: FeatureView<'_>) -> HogLiteResult<Self> {
        let mut map = Self::zeros(view.width(), view.height(), view.feature_size())?;
        let row_len = map.row_len();
        for y in 0..view.height() {
            map.data[y * row_len..(y + 1) * row_len].copy_from_slice(view.row_unchecked(y));
        }
        Ok(map)
    }

    /// Returns the grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the channel layout.
    pub fn feature_size(&self) -> FeatureSize {
        self.feature_size
    }

    /// Returns the packed backing buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the descriptor of cell `(x, y)`.
    pub fn cell(&self, x: usize, y: usize) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let f = self.feature_size.channels();
        let start = (y * self.width + x) * f;
        self.data.get(start..start + f)
    }

    #[cfg(feature = "rayon")]
    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    fn row_len(&self) -> usize {
        self.width * self.feature_size.channels()
    }

    /// Returns a borrowed view.
    pub fn view(&self) -> FeatureView<'_> {
        let row_len = self.row_len();
        FeatureView {
            raw: ImageView::packed(&self.data, row_len, self.height),
            width: self.width,
            feature_size: self.feature_size,
        }
    }

    /// Returns a mutable view.
    pub fn view_mut(&mut self) -> FeatureViewMut<'_> {
        let row_len = self.row_len();
        FeatureViewMut {
            raw: ImageViewMut::packed(&mut self.data, row_len, self.height),
            width: self.width,
            feature_size: self.feature_size,
        }
    }
}

/// Returns the feature-grid size produced for an image of the given size.
pub fn feature_grid_size(width: usize, height: usize, cell: CellSize) -> HogLiteResult<(usize, usize)> {
    let min = cell.min_image_size();
    if width < min || height < min {
        return Err(HogLiteError::ImageTooSmall { width, height, min });
    }
    let c = cell.pixels();
    Ok((width / c - 2, height / c - 2))
}
