//! Multi-scale ladder of feature maps.
//!
//! Level 0 is the extracted map. Every further level is resampled directly
//! from level 0 with bilinear interpolation, so errors do not compound along
//! the ladder.

use crate::feature::{resize_features, FeatureMap};
use crate::trace::trace_event;
use crate::util::HogLiteResult;

/// Configuration for building a feature pyramid.
#[derive(Clone, Debug)]
pub struct PyramidConfig {
    /// Maximum number of levels, including level 0.
    pub max_levels: usize,
    /// Size ratio between consecutive levels, in `(0, 1)`.
    pub scale_step: f32,
    /// Levels narrower or shorter than this are not built.
    pub min_size: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            max_levels: 1,
            scale_step: 0.8,
            min_size: 1,
        }
    }
}

/// One resampled level.
#[derive(Clone, Debug)]
pub struct PyramidLevel {
    map: FeatureMap,
    scale: f32,
}

impl PyramidLevel {
    /// Returns the feature map of this level.
    pub fn map(&self) -> &FeatureMap {
        &self.map
    }

    /// Returns the size of this level relative to level 0.
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

/// Owned ladder of feature maps.
#[derive(Clone, Debug)]
pub struct FeaturePyramid {
    levels: Vec<PyramidLevel>,
}

impl FeaturePyramid {
    /// Builds a pyramid from a base map.
    ///
    /// The base level is always present. A `scale_step` outside `(0, 1)`
    /// yields the base level only.
    pub fn build(base: FeatureMap, cfg: &PyramidConfig) -> HogLiteResult<Self> {
        let max_levels = if cfg.scale_step > 0.0 && cfg.scale_step < 1.0 {
            cfg.max_levels.max(1)
        } else {
            1
        };
        let base_width = base.width();
        let base_height = base.height();
        let mut levels = vec![PyramidLevel {
            map: base,
            scale: 1.0,
        }];

        let mut prev = (base_width, base_height);
        while levels.len() < max_levels {
            let nominal = cfg.scale_step.powi(levels.len() as i32);
            let width = (base_width as f32 * nominal).round() as usize;
            let height = (base_height as f32 * nominal).round() as usize;
            if width < cfg.min_size.max(1) || height < cfg.min_size.max(1) {
                break;
            }
            if (width, height) == prev {
                break;
            }
            let map = resize_features(levels[0].map.view(), width, height)?;
            let scale = width as f32 / base_width as f32;
            levels.push(PyramidLevel { map, scale });
            prev = (width, height);
        }

        trace_event!("pyramid_built", levels = levels.len());
        Ok(Self { levels })
    }

    /// Returns all levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// Returns a specific level.
    pub fn level(&self, index: usize) -> Option<&PyramidLevel> {
        self.levels.get(index)
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; the base level is always present.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
