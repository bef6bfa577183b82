//! Low-level building blocks for custom detection pipelines.
//!
//! These items expose the correlator primitives and candidate utilities
//! behind the high-level [`Detector`](crate::Detector). Most users should
//! prefer the top-level functions and the `Detector` type.

pub use crate::candidate::nms::nms_2d;
pub use crate::candidate::topk::{Peak, TopK};
pub use crate::candidate::window::WINDOW;
pub use crate::feature::{PyramidLevel, EXTRACTED_FEATURES, PCA_INPUT, PCA_OUTPUT};
pub use crate::filter::scalar::ScalarCorrelator;
#[cfg(feature = "simd")]
pub use crate::filter::simd::SimdCorrelator;
pub use crate::filter::Correlator;
