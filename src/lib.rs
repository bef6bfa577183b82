//! HOG-Lite is a CPU-first dense feature pipeline for object detection.
//!
//! Grayscale images are turned into per-cell oriented-gradient descriptors,
//! correlated against learned linear filters and pruned by thresholds. The
//! crate provides scalar reference implementations of every stage, a
//! coarse-to-fine multi-scale [`Detector`], optional parallelism via the
//! `rayon` feature and SIMD correlation via the `simd` feature.

mod candidate;
pub mod detect;
pub mod feature;
pub mod filter;
pub mod image;
pub mod lowlevel;
pub mod mask;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;
pub use image::{ImageView, ImageViewMut, Mask, OwnedImage, ScoreMap};
pub use util::{HogLiteError, HogLiteResult};

pub use candidate::window::{find_max_7x7, WindowMax};
pub use detect::{CoarseStage, DetectConfig, Detection, Detector, FineFilter};
pub use feature::{
    compress_features, compress_features_into, extract_features, extract_features_into,
    feature_grid_size, resize_features, resize_features_into, CellSize, FeatureMap,
    FeaturePyramid, FeatureSize, FeatureView, FeatureViewMut, HogLiteExtractor, PyramidConfig,
};
#[cfg(feature = "rayon")]
pub use feature::extract_features_par;
pub use filter::{
    filter_features, filter_features_into, filter_separable, filter_separable_into, LinearFilter,
    SeparableFilter, MASKED_SCORE,
};
#[cfg(feature = "rayon")]
pub use filter::rayon::{
    filter_features_par, filter_features_par_into, filter_separable_par_into,
};
pub use mask::{build_mask, build_mask_into};
