//! Strided 2D buffers shared by every pipeline stage.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are
//! zero-copy views into the same backing slice and retain the original stride.
//!
//! The same types carry grayscale pixels (`u8`), score maps (`f32`) and
//! pruning masks (`u8`, non-zero means "evaluate").

use crate::util::{HogLiteError, HogLiteResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Borrowed 2D view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> HogLiteResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> HogLiteResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(HogLiteError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the width in elements.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Wraps a packed buffer whose length the caller guarantees.
    pub(crate) fn packed(data: &'a [T], width: usize, height: usize) -> Self {
        debug_assert!(data.len() >= width * height);
        Self {
            data,
            width,
            height,
            stride: width,
        }
    }

    /// Returns row `y` for callers that already validated the geometry.
    #[inline]
    pub(crate) fn row_unchecked(&self, y: usize) -> &'a [T] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> HogLiteResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(HogLiteError::InvalidDimensions { width, height });
        }
        let fits_x = x.checked_add(width).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|end| end <= self.height);
        if !fits_x || !fits_y {
            return Err(HogLiteError::DimensionMismatch {
                context: "roi exceeds view",
                expected_width: self.width,
                expected_height: self.height,
                width: x.saturating_add(width),
                height: y.saturating_add(height),
            });
        }
        let start = y * self.stride + x;
        ImageView::new(&self.data[start..], width, height, self.stride)
    }

    /// Checks that the view covers at least `width x height` elements.
    pub(crate) fn ensure_covers(
        &self,
        context: &'static str,
        width: usize,
        height: usize,
    ) -> HogLiteResult<()> {
        if self.width < width || self.height < height {
            return Err(HogLiteError::DimensionMismatch {
                context,
                expected_width: width,
                expected_height: height,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Mutable 2D view with an explicit stride, used for caller-owned outputs.
#[derive(Debug)]
pub struct ImageViewMut<'a, T> {
    data: &'a mut [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageViewMut<'a, T> {
    /// Creates a contiguous mutable view with `stride == width`.
    pub fn from_slice(data: &'a mut [T], width: usize, height: usize) -> HogLiteResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a mutable view with an explicit stride.
    pub fn new(
        data: &'a mut [T],
        width: usize,
        height: usize,
        stride: usize,
    ) -> HogLiteResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(HogLiteError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the width in elements.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Wraps a packed buffer whose length the caller guarantees.
    pub(crate) fn packed(data: &'a mut [T], width: usize, height: usize) -> Self {
        debug_assert!(data.len() >= width * height);
        Self {
            data,
            width,
            height,
            stride: width,
        }
    }

    /// Reborrows as an immutable view.
    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &*self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// Returns row `y` as a mutable slice of length `width`.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get_mut(start..end)
    }

    #[inline]
    pub(crate) fn row_mut_unchecked(&mut self, y: usize) -> &mut [T] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Splits the backing buffer into `stride`-sized row chunks.
    #[cfg(feature = "rayon")]
    pub(crate) fn raw_rows_mut(&mut self) -> (&mut [T], usize, usize) {
        (&mut *self.data, self.width, self.stride)
    }

    /// Checks that the view covers at least `width x height` elements.
    pub(crate) fn ensure_covers(
        &self,
        context: &'static str,
        width: usize,
        height: usize,
    ) -> HogLiteResult<()> {
        self.as_view().ensure_covers(context, width, height)
    }
}

/// Owned contiguous 2D buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

/// Correlation responses, one per valid filter placement.
pub type ScoreMap = OwnedImage<f32>;

/// Pruning mask: non-zero entries are evaluated, zero entries are skipped.
pub type Mask = OwnedImage<u8>;

impl<T: Copy + Default> OwnedImage<T> {
    /// Creates a buffer filled with `T::default()`.
    pub fn zeros(width: usize, height: usize) -> HogLiteResult<Self> {
        let len = width
            .checked_mul(height)
            .filter(|&len| len > 0)
            .ok_or(HogLiteError::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![T::default(); len],
            width,
            height,
        })
    }

    /// Wraps a contiguous row-major buffer of exactly `width * height` elements.
    pub fn new(data: Vec<T>, width: usize, height: usize) -> HogLiteResult<Self> {
        let needed = width
            .checked_mul(height)
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
        })
    }

    /// Copies a strided view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, T>) -> HogLiteResult<Self> {
        let mut out = Self::zeros(view.width(), view.height())?;
        for y in 0..view.height() {
            let start = y * out.width;
            out.data[start..start + out.width].copy_from_slice(view.row_unchecked(y));
        }
        Ok(out)
    }
}

impl<T> OwnedImage<T> {
    /// Returns the width in elements.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major backing buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// Returns a borrowed view of the buffer.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns a mutable view of the buffer.
    pub fn view_mut(&mut self) -> ImageViewMut<'_, T> {
        ImageViewMut {
            data: &mut self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

pub(crate) fn required_len(width: usize, height: usize, stride: usize) -> HogLiteResult<usize> {
    if width == 0 || height == 0 {
        return Err(HogLiteError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(HogLiteError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(HogLiteError::InvalidDimensions { width, height })?;
    Ok(needed)
}
