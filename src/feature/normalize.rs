//! Histogram finalization and block-norm aggregation.

use crate::feature::{BINS, HALF_BINS};

/// Converts completed integer histograms to floats and derives cell energy.
pub(crate) struct FloatHistogramNormalizer {
    scale: f32,
}

impl FloatHistogramNormalizer {
    /// Scale undoes the `(2 * cell)^2` total vote weight.
    pub(crate) fn new(cell: usize) -> Self {
        let weight = (2 * cell * 2 * cell) as f32;
        Self {
            scale: 1.0 / weight,
        }
    }

    /// Finalizes one cell-row and clears the integer buffer for reuse.
    ///
    /// `norms[x]` receives `|h[0..4] + h[4..8]|^2` for cell `x`.
    pub(crate) fn finalize(&self, ints: &mut [i32], hist: &mut [f32], norms: &mut [f32]) {
        for (dst, src) in hist.iter_mut().zip(ints.iter()) {
            *dst = self.scale * *src as f32;
        }
        ints.fill(0);

        for (norm, h) in norms.iter_mut().zip(hist.chunks_exact(BINS)) {
            let mut sum = 0.0f32;
            for k in 0..HALF_BINS {
                let folded = h[k] + h[k + HALF_BINS];
                sum += folded * folded;
            }
            *norm = sum;
        }
    }
}

/// Rolling window of the last three cell-rows' energies.
///
/// `rows[0]` is the oldest row and `rows[2]` the most recent one.
pub(crate) struct BlockNormAggregator {
    rows: [Vec<f32>; 3],
}

impl BlockNormAggregator {
    pub(crate) fn new(cells: usize) -> Self {
        Self {
            rows: [vec![0.0; cells], vec![0.0; cells], vec![0.0; cells]],
        }
    }

    /// Drops the oldest row and returns the slot for the newest one.
    pub(crate) fn push_row(&mut self) -> &mut [f32] {
        self.rows.rotate_left(1);
        &mut self.rows[2]
    }

    /// Computes the four 2x2-block energies around each interior cell.
    ///
    /// Entry `x` belongs to cell `x + 1` of the middle row. The order is
    /// `[lower-right, upper-right, lower-left, upper-left]` blocks.
    pub(crate) fn denominators(&self, out: &mut [[f32; 4]]) {
        let [top, mid, bottom] = &self.rows;
        let upper = |k: usize| (top[k] + mid[k]) + (top[k + 1] + mid[k + 1]);
        let lower = |k: usize| (mid[k] + bottom[k]) + (mid[k + 1] + bottom[k + 1]);
        for (x, dst) in out.iter_mut().enumerate() {
            *dst = [lower(x + 1), upper(x + 1), lower(x), upper(x)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockNormAggregator, FloatHistogramNormalizer};
    use crate::feature::BINS;

    #[test]
    fn finalize_scales_clears_and_folds() {
        let normalizer = FloatHistogramNormalizer::new(4);
        let mut ints = vec![0i32; 2 * BINS];
        ints[0] = 64;
        ints[4] = 64;
        ints[BINS + 1] = 128;
        let mut hist = vec![0.0f32; 2 * BINS];
        let mut norms = vec![0.0f32; 2];
        normalizer.finalize(&mut ints, &mut hist, &mut norms);

        assert!(ints.iter().all(|&v| v == 0));
        assert_eq!(hist[0], 1.0);
        assert_eq!(hist[4], 1.0);
        assert_eq!(hist[BINS + 1], 2.0);
        // Bins 0 and 4 fold into one combined bin before squaring.
        assert_eq!(norms[0], 4.0);
        assert_eq!(norms[1], 4.0);
    }

    #[test]
    fn denominators_sum_overlapping_blocks() {
        let cells = 4;
        let mut agg = BlockNormAggregator::new(cells);
        for scale in [1.0f32, 10.0, 100.0] {
            let row = agg.push_row();
            for (x, v) in row.iter_mut().enumerate() {
                *v = scale * (x as f32 + 1.0);
            }
        }
        let mut out = vec![[0.0f32; 4]; cells - 2];
        agg.denominators(&mut out);

        // Cell 1: upper-left block = rows 0..2, cols 0..2.
        let upper_left = (1.0 + 2.0) + (10.0 + 20.0);
        let lower_left = (10.0 + 20.0) + (100.0 + 200.0);
        let upper_right = (2.0 + 3.0) + (20.0 + 30.0);
        let lower_right = (20.0 + 30.0) + (200.0 + 300.0);
        assert_eq!(out[0], [lower_right, upper_right, lower_left, upper_left]);
    }

    #[test]
    fn push_row_discards_the_oldest_row() {
        let mut agg = BlockNormAggregator::new(3);
        agg.push_row().fill(1.0);
        agg.push_row().fill(2.0);
        agg.push_row().fill(3.0);
        agg.push_row().fill(4.0);
        let mut out = vec![[0.0f32; 4]; 1];
        agg.denominators(&mut out);
        // Rows 2, 3, 4 remain: upper = 2*(2+3), lower = 2*(3+4).
        assert_eq!(out[0], [14.0, 10.0, 14.0, 10.0]);
    }
}
