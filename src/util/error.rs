//! Error types for hoglite.

use thiserror::Error;

/// Result alias for hoglite operations.
pub type HogLiteResult<T> = std::result::Result<T, HogLiteError>;

/// Precondition violations reported by the pipeline.
///
/// Every entry point validates its inputs before touching output buffers,
/// so an error never leaves a partially written destination behind.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HogLiteError {
    /// Width or height is zero or overflows the address space.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is shorter than one row of elements.
    #[error("stride {stride} is smaller than row length {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer cannot hold the described view.
    #[error("buffer too small: need {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Cell size other than 4 or 8.
    #[error("unsupported cell size {cell} (expected 4 or 8)")]
    UnsupportedCellSize { cell: usize },
    /// Feature size other than 8 or 16.
    #[error("unsupported feature size {size} (expected 8 or 16)")]
    UnsupportedFeatureSize { size: usize },
    /// Source image is below the minimum extractable size.
    #[error("image {width}x{height} is smaller than the minimum {min}x{min}")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
    /// Filter does not fit inside the feature map.
    #[error("filter {filter_width}x{filter_height} exceeds feature map {width}x{height}")]
    FilterTooLarge {
        filter_width: usize,
        filter_height: usize,
        width: usize,
        height: usize,
    },
    /// Filter weight count does not match its declared shape.
    #[error("filter has {got} weights, expected {expected}")]
    FilterLength { expected: usize, got: usize },
    /// Two buffers that must agree in shape do not.
    #[error("{context}: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        context: &'static str,
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },
    /// Mask upscale factor outside the supported set.
    #[error("unsupported mask scale {scale} (expected 1 or 2)")]
    InvalidScale { scale: usize },
    /// Mask window must cover at least one position.
    #[error("invalid mask window size {size}")]
    InvalidWindow { size: usize },
    /// Image decoding failed (`image-io` feature).
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
