//! Row-streaming HOG-Lite extraction.
//!
//! The extractor visits the image top to bottom once. Pixel rows are voted
//! into two live cell-rows; every completed cell-row is finalized, pushed into
//! the block-norm window and, once three rows are available, turns the middle
//! row into one row of descriptors.

use crate::feature::assemble::assemble_row;
use crate::feature::gradient::GradientCellHistogram;
use crate::feature::normalize::{BlockNormAggregator, FloatHistogramNormalizer};
use crate::feature::{feature_grid_size, CellSize, FeatureMap, FeatureSize, FeatureViewMut, BINS};
use crate::image::ImageView;
use crate::trace::{trace_event, trace_span};
use crate::util::HogLiteResult;

/// Reusable extraction state for one cell size.
///
/// All buffers are reset at the start of every [`HogLiteExtractor::extract`]
/// call, so results never depend on previous invocations.
pub struct HogLiteExtractor {
    cell: CellSize,
    gradient: GradientCellHistogram,
    normalizer: FloatHistogramNormalizer,
    blocks: BlockNormAggregator,
    hist_prev: Vec<f32>,
    hist_curr: Vec<f32>,
    denominators: Vec<[f32; 4]>,
}

impl HogLiteExtractor {
    /// Creates an extractor for the given cell size.
    pub fn new(cell: CellSize) -> Self {
        let c = cell.pixels();
        Self {
            cell,
            gradient: GradientCellHistogram::new(c, 3),
            normalizer: FloatHistogramNormalizer::new(c),
            blocks: BlockNormAggregator::new(3),
            hist_prev: Vec::new(),
            hist_curr: Vec::new(),
            denominators: Vec::new(),
        }
    }

    /// Returns the configured cell size.
    pub fn cell(&self) -> CellSize {
        self.cell
    }

    fn reset(&mut self, cells: usize) {
        let c = self.cell.pixels();
        self.gradient = GradientCellHistogram::new(c, cells);
        self.blocks = BlockNormAggregator::new(cells);
        self.hist_prev.clear();
        self.hist_prev.resize(cells * BINS, 0.0);
        self.hist_curr.clear();
        self.hist_curr.resize(cells * BINS, 0.0);
        self.denominators.clear();
        self.denominators.resize(cells - 2, [0.0; 4]);
    }

    /// Finalizes the current cell-row into `hist_curr` and the norm window.
    fn complete_row(&mut self) {
        self.normalizer.finalize(
            self.gradient.current_mut(),
            &mut self.hist_curr,
            self.blocks.push_row(),
        );
        self.gradient.advance();
    }

    /// Emits descriptors for the middle row of the norm window.
    fn emit(&mut self, out: &mut [f32]) {
        self.blocks.denominators(&mut self.denominators);
        assemble_row(&self.hist_prev, &self.denominators, out);
    }

    /// Extracts features into a caller-provided map.
    ///
    /// `dst` must use [`FeatureSize::Full`] and cover
    /// `(width / cell - 2) x (height / cell - 2)` cells. Nothing is written
    /// when validation fails.
    pub fn extract(
        &mut self,
        image: ImageView<'_, u8>,
        dst: &mut FeatureViewMut<'_>,
    ) -> HogLiteResult<()> {
        let width = image.width();
        let height = image.height();
        let (fx, fy) = feature_grid_size(width, height, self.cell)?;
        dst.ensure_shape("feature map", fx, fy, FeatureSize::Full)?;

        let c = self.cell.pixels();
        let _span = trace_span!("extract_features", width = width, height = height, cell = c)
            .entered();

        self.reset(width / c);
        let origin = c / 2;
        let processed_height = (height / c - 1) * c;
        let mut out_row = 0;
        for row in 0..processed_height {
            let y = origin + row;
            self.gradient.load_row(
                image.row_unchecked(y - 1),
                image.row_unchecked(y),
                image.row_unchecked(y + 1),
                origin,
            );
            let row_i = row / c;
            let row_f = row % c;
            self.gradient.accumulate(row_f);
            if row_f == c - 1 {
                self.complete_row();
                if row_i >= 2 {
                    self.emit(dst.row_mut_unchecked(out_row));
                    out_row += 1;
                }
                std::mem::swap(&mut self.hist_prev, &mut self.hist_curr);
            }
        }
        self.complete_row();
        self.emit(dst.row_mut_unchecked(out_row));

        trace_event!("features_extracted", cols = fx, rows = fy);
        Ok(())
    }
}

/// Extracts HOG-Lite features into a new map.
pub fn extract_features(image: ImageView<'_, u8>, cell: CellSize) -> HogLiteResult<FeatureMap> {
    let (fx, fy) = feature_grid_size(image.width(), image.height(), cell)?;
    let mut map = FeatureMap::zeros(fx, fy, FeatureSize::Full)?;
    HogLiteExtractor::new(cell).extract(image, &mut map.view_mut())?;
    Ok(map)
}

/// Extracts HOG-Lite features into a caller-provided map.
pub fn extract_features_into(
    image: ImageView<'_, u8>,
    cell: CellSize,
    dst: &mut FeatureViewMut<'_>,
) -> HogLiteResult<()> {
    HogLiteExtractor::new(cell).extract(image, dst)
}

/// Feature rows produced by one parallel task.
#[cfg(feature = "rayon")]
const ROWS_PER_TASK: usize = 16;

/// Extracts features with row partitions processed in parallel.
///
/// Each partition re-extracts a sub-image with one leading and two trailing
/// cell-rows of halo, so block norms at partition borders see the same
/// neighbourhood as a sequential pass and the output is bit-identical.
#[cfg(feature = "rayon")]
pub fn extract_features_par(
    image: ImageView<'_, u8>,
    cell: CellSize,
) -> HogLiteResult<FeatureMap> {
    use rayon::prelude::*;

    let width = image.width();
    let height = image.height();
    let (fx, fy) = feature_grid_size(width, height, cell)?;
    let c = cell.pixels();
    let _span = trace_span!(
        "extract_features",
        width = width,
        height = height,
        cell = c,
        parallel = true
    )
    .entered();

    let mut map = FeatureMap::zeros(fx, fy, FeatureSize::Full)?;
    let row_len = fx * FeatureSize::Full.channels();
    map.data_mut()
        .par_chunks_mut(ROWS_PER_TASK * row_len)
        .enumerate()
        .try_for_each(|(task, out)| -> HogLiteResult<()> {
            let r0 = task * ROWS_PER_TASK;
            let rows = out.len() / row_len;
            let lead = usize::from(r0 > 0);
            let top = (r0 - lead) * c;
            let sub_height = ((rows + lead + 3) * c).min(height - top);
            let sub = image.roi(0, top, width, sub_height)?;
            let part = extract_features(sub, cell)?;
            out.copy_from_slice(&part.data()[lead * row_len..(lead + rows) * row_len]);
            Ok(())
        })?;

    trace_event!("features_extracted", cols = fx, rows = fy);
    Ok(map)
}
