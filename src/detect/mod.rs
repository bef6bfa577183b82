//! Coarse-to-fine multi-scale detection.
//!
//! The detector extracts features once, optionally compresses them, builds a
//! feature pyramid and scores every level with the fine filter. An optional
//! coarse stage correlates a half-resolution copy of each level first and
//! only evaluates fine positions near coarse responses above its threshold.
//! Peaks above the detection threshold are suppressed per level and the
//! strongest survivors across all levels are returned.

use crate::candidate::topk::{Peak, TopK};
use crate::feature::{
    compress_features, extract_features, CellSize, FeatureMap, FeaturePyramid, PyramidConfig,
};
use crate::filter::{LinearFilter, SeparableFilter};
use crate::image::ImageView;
use crate::trace::{trace_event, trace_span};
use crate::util::{HogLiteError, HogLiteResult};

mod level;

use level::score_level;

/// Optional pruning pass on half-resolution features.
#[derive(Clone, Debug)]
pub struct CoarseStage {
    /// Filter applied to the half-resolution level.
    pub filter: LinearFilter,
    /// Coarse responses above this value enable fine positions.
    pub threshold: f32,
    /// Side of the fine window enabled by one coarse response.
    pub window: usize,
}

/// Detection configuration.
#[derive(Clone, Debug)]
pub struct DetectConfig {
    /// Histogram cell size used for extraction.
    pub cell: CellSize,
    /// Optional 16x8 row-major PCA matrix applied after extraction.
    pub pca: Option<Vec<f32>>,
    /// Pyramid built from the extracted map.
    pub pyramid: PyramidConfig,
    /// Fine scores above this value become detections.
    pub threshold: f32,
    /// Optional coarse pruning stage.
    pub coarse: Option<CoarseStage>,
    /// Chebyshev radius for per-level non-maximum suppression.
    pub nms_radius: usize,
    /// Maximum number of detections returned.
    pub max_detections: usize,
    /// Use rayon for extraction and correlation when the feature is enabled.
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            cell: CellSize::Eight,
            pca: None,
            pyramid: PyramidConfig::default(),
            threshold: 0.0,
            coarse: None,
            nms_radius: 2,
            max_detections: 16,
            parallel: false,
        }
    }
}

/// Filter scored at the fine stage.
#[derive(Clone, Debug)]
pub enum FineFilter {
    /// Dense filter, correlated directly.
    Dense(LinearFilter),
    /// Sum of rank-1 components, accumulated into one score map.
    Separable(Vec<SeparableFilter>),
}

impl FineFilter {
    /// Width and height in cells.
    pub fn size(&self) -> (usize, usize) {
        match self {
            FineFilter::Dense(f) => (f.width(), f.height()),
            FineFilter::Separable(parts) => parts
                .first()
                .map(|f| (f.width(), f.height()))
                .unwrap_or((0, 0)),
        }
    }
}

/// Detection in feature-grid coordinates of one pyramid level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Column of the filter placement.
    pub x: usize,
    /// Row of the filter placement.
    pub y: usize,
    /// Pyramid level.
    pub level: usize,
    /// Size of the level relative to level 0.
    pub scale: f32,
    /// Fine filter response.
    pub score: f32,
}

impl Detection {
    /// Top-left pixel of the placement in source-image coordinates.
    ///
    /// Feature column `x` describes histogram cell `x + 1`, whose pixels
    /// start at `(x + 1) * cell` at level 0.
    pub fn image_origin(&self, cell: CellSize) -> (f32, f32) {
        let c = cell.pixels() as f32;
        (
            (self.x + 1) as f32 * c / self.scale,
            (self.y + 1) as f32 * c / self.scale,
        )
    }
}

/// Detector for one fine filter.
#[derive(Clone, Debug)]
pub struct Detector {
    fine: FineFilter,
    cfg: DetectConfig,
}

impl Detector {
    /// Creates a detector for a dense filter with default configuration.
    pub fn new(filter: LinearFilter) -> Self {
        Self {
            fine: FineFilter::Dense(filter),
            cfg: DetectConfig::default(),
        }
    }

    /// Creates a detector whose fine filter is a sum of separable components.
    ///
    /// Components must share width, height and feature layout.
    pub fn separable(components: Vec<SeparableFilter>) -> HogLiteResult<Self> {
        let first = components
            .first()
            .ok_or(HogLiteError::InvalidDimensions {
                width: 0,
                height: 0,
            })?;
        let shape = (first.width(), first.height(), first.feature_size());
        for part in &components[1..] {
            if (part.width(), part.height(), part.feature_size()) != shape {
                return Err(HogLiteError::DimensionMismatch {
                    context: "separable component",
                    expected_width: shape.0,
                    expected_height: shape.1,
                    width: part.width(),
                    height: part.height(),
                });
            }
        }
        Ok(Self {
            fine: FineFilter::Separable(components),
            cfg: DetectConfig::default(),
        })
    }

    /// Overrides the configuration.
    pub fn with_config(mut self, cfg: DetectConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DetectConfig {
        &self.cfg
    }

    /// Returns the fine filter.
    pub fn fine_filter(&self) -> &FineFilter {
        &self.fine
    }

    /// Extracts features from `image` and detects on them.
    pub fn detect(&self, image: ImageView<'_, u8>) -> HogLiteResult<Vec<Detection>> {
        let _span = trace_span!(
            "detect",
            width = image.width(),
            height = image.height(),
            levels = self.cfg.pyramid.max_levels
        )
        .entered();
        let features = self.extract(image)?;
        self.detect_features(features)
    }

    /// Detects on an already extracted (and, if configured, compressed) map.
    pub fn detect_features(&self, features: FeatureMap) -> HogLiteResult<Vec<Detection>> {
        let pyramid = FeaturePyramid::build(features, &self.cfg.pyramid)?;
        let (fw, fh) = self.fine.size();

        let mut topk = TopK::new(self.cfg.max_detections);
        for (index, level) in pyramid.levels().iter().enumerate() {
            let map = level.map();
            // Levels only shrink; once the filter stops fitting, later ones
            // cannot fit either. Level 0 reports the error instead.
            if index > 0 && (map.width() < fw || map.height() < fh) {
                break;
            }
            let peaks = score_level(map, index, &self.fine, &self.cfg)?;
            for peak in peaks {
                topk.push(peak);
            }
        }

        let detections: Vec<Detection> = topk
            .into_sorted_desc()
            .into_iter()
            .map(|peak| to_detection(peak, &pyramid))
            .collect();
        trace_event!("detections", count = detections.len());
        Ok(detections)
    }

    fn extract(&self, image: ImageView<'_, u8>) -> HogLiteResult<FeatureMap> {
        #[cfg(feature = "rayon")]
        let features = if self.cfg.parallel {
            crate::feature::extract_features_par(image, self.cfg.cell)?
        } else {
            extract_features(image, self.cfg.cell)?
        };
        #[cfg(not(feature = "rayon"))]
        let features = extract_features(image, self.cfg.cell)?;

        match &self.cfg.pca {
            Some(pca) => compress_features(features.view(), pca),
            None => Ok(features),
        }
    }
}

fn to_detection(peak: Peak, pyramid: &FeaturePyramid) -> Detection {
    let scale = pyramid.level(peak.level).map_or(1.0, |l| l.scale());
    Detection {
        x: peak.x,
        y: peak.y,
        level: peak.level,
        scale,
        score: peak.score,
    }
}
