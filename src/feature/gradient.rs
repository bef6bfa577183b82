//! Gradient binning and bilinear cell voting.
//!
//! Every visited pixel is classified into one of eight signed orientations
//! and votes its magnitude into the four surrounding cells. Horizontal and
//! vertical weights follow the triangular kernels `k0[i] = 2(cell-1-i)+1` and
//! `k1[i] = 2i+1`, which sum to `2 * cell` for every offset `i`.

use crate::feature::BINS;

/// Computes the orientation bin and magnitude for one pixel.
///
/// `left`/`right` are the horizontal neighbours and `up`/`down` the vertical
/// ones. The bin is derived from the dominant axis and the signs of the raw
/// differences, so no trigonometry is needed.
#[inline]
pub(crate) fn orientation_and_magnitude(left: u8, right: u8, up: u8, down: u8) -> (u8, u8) {
    let adx = left.abs_diff(right);
    let ady = up.abs_diff(down);
    let (max, min) = if adx > ady { (adx, ady) } else { (ady, adx) };
    let value = max.saturating_add(((u16::from(min) + 1) >> 1) as u8);

    let mut index = if adx > ady { 0u8 } else { 1u8 };
    if right <= left {
        index = 3 - index;
    }
    if down <= up {
        index = 7 - index;
    }
    (index, value)
}

/// Integer histograms of two consecutive cell-rows under construction.
///
/// `current` is the cell-row being completed; `next` already receives the
/// lower half of the vertical vote from the same pixel rows.
pub(crate) struct GradientCellHistogram {
    cell: usize,
    width: usize,
    k0: Vec<i32>,
    k1: Vec<i32>,
    value: Vec<u8>,
    index: Vec<u8>,
    current: Vec<i32>,
    next: Vec<i32>,
}

impl GradientCellHistogram {
    /// Creates buffers for `cells` histogram cells per row.
    pub(crate) fn new(cell: usize, cells: usize) -> Self {
        let width = (cells - 1) * cell;
        let k0 = (0..cell).map(|i| (2 * (cell - 1 - i) + 1) as i32).collect();
        let k1 = (0..cell).map(|i| (2 * i + 1) as i32).collect();
        Self {
            cell,
            width,
            k0,
            k1,
            value: vec![0; width],
            index: vec![0; width],
            current: vec![0; cells * BINS],
            next: vec![0; cells * BINS],
        }
    }

    /// Number of pixels visited per row.
    pub(crate) fn processed_width(&self) -> usize {
        self.width
    }

    /// Computes orientation and magnitude for one visited row.
    ///
    /// Visited column `p` reads source column `x0 + p`; the caller guarantees
    /// `x0 >= 1` and `x0 + processed_width() < row.len()`.
    pub(crate) fn load_row(&mut self, above: &[u8], row: &[u8], below: &[u8], x0: usize) {
        for p in 0..self.width {
            let x = x0 + p;
            let (index, value) =
                orientation_and_magnitude(row[x - 1], row[x + 1], above[x], below[x]);
            self.index[p] = index;
            self.value[p] = value;
        }
    }

    /// Votes the loaded row into `current` and `next`.
    ///
    /// `row_frac` is the offset of the visited row inside its cell-row.
    pub(crate) fn accumulate(&mut self, row_frac: usize) {
        let ky0 = self.k0[row_frac];
        let ky1 = self.k1[row_frac];
        for p in 0..self.width {
            let value = i32::from(self.value[p]);
            if value == 0 {
                continue;
            }
            let c = p / self.cell;
            let i = p % self.cell;
            let lo = c * BINS + usize::from(self.index[p]);
            let hi = lo + BINS;
            let wx0 = self.k0[i] * value;
            let wx1 = self.k1[i] * value;
            self.current[lo] += ky0 * wx0;
            self.current[hi] += ky0 * wx1;
            self.next[lo] += ky1 * wx0;
            self.next[hi] += ky1 * wx1;
        }
    }

    /// Histogram of the cell-row being completed.
    pub(crate) fn current_mut(&mut self) -> &mut [i32] {
        &mut self.current
    }

    /// Promotes `next` to `current` once the completed row has been consumed.
    ///
    /// The consumer must have cleared `current`; it becomes the new `next`.
    pub(crate) fn advance(&mut self) {
        debug_assert!(self.current.iter().all(|&v| v == 0));
        std::mem::swap(&mut self.current, &mut self.next);
    }

    #[cfg(test)]
    fn total(&self) -> i64 {
        self.current
            .iter()
            .chain(self.next.iter())
            .map(|&v| i64::from(v))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{orientation_and_magnitude, GradientCellHistogram};
    use crate::feature::BINS;

    #[test]
    fn orientation_covers_all_octants() {
        let cases = [
            ((0, 100, 0, 10), 0),
            ((100, 0, 0, 10), 3),
            ((0, 100, 10, 0), 7),
            ((100, 0, 10, 0), 4),
            ((0, 10, 0, 100), 1),
            ((10, 0, 0, 100), 2),
            ((0, 10, 100, 0), 6),
            ((10, 0, 100, 0), 5),
        ];
        for ((l, r, u, d), expected) in cases {
            let (index, _) = orientation_and_magnitude(l, r, u, d);
            assert_eq!(index, expected, "neighbours {l} {r} {u} {d}");
        }
    }

    #[test]
    fn magnitude_adds_rounded_half_of_minor_axis() {
        let (_, value) = orientation_and_magnitude(0, 100, 0, 11);
        assert_eq!(value, 106);
        let (_, value) = orientation_and_magnitude(0, 255, 0, 255);
        assert_eq!(value, 255);
        let (_, value) = orientation_and_magnitude(7, 7, 9, 9);
        assert_eq!(value, 0);
    }

    #[test]
    fn single_vote_preserves_energy() {
        for cell in [4usize, 8] {
            let cells = 4;
            let mut hist = GradientCellHistogram::new(cell, cells);
            for p in [0, cell / 2, cell + 1, hist.processed_width() - 1] {
                for row_frac in 0..cell {
                    hist.value.fill(0);
                    hist.current.fill(0);
                    hist.next.fill(0);
                    hist.value[p] = 200;
                    hist.index[p] = 3;
                    hist.accumulate(row_frac);

                    let scale = (2 * cell * 2 * cell) as i64;
                    assert_eq!(hist.total(), 200 * scale);
                    let touched = hist
                        .current
                        .iter()
                        .chain(hist.next.iter())
                        .enumerate()
                        .filter(|(_, &v)| v != 0)
                        .count();
                    assert_eq!(touched, 4);
                }
            }
        }
    }

    #[test]
    fn votes_land_in_the_two_neighbouring_cells() {
        let cell = 8;
        let mut hist = GradientCellHistogram::new(cell, 4);
        let p = cell + 2;
        hist.value[p] = 10;
        hist.index[p] = 5;
        hist.accumulate(0);

        let k0 = (2 * (cell - 1 - 2) + 1) as i32;
        let k1 = 5;
        let ky0 = 15;
        let ky1 = 1;
        assert_eq!(hist.current[BINS + 5], ky0 * k0 * 10);
        assert_eq!(hist.current[2 * BINS + 5], ky0 * k1 * 10);
        assert_eq!(hist.next[BINS + 5], ky1 * k0 * 10);
        assert_eq!(hist.next[2 * BINS + 5], ky1 * k1 * 10);
    }

    #[test]
    fn advance_swaps_row_roles() {
        let mut hist = GradientCellHistogram::new(4, 3);
        hist.value[1] = 1;
        hist.index[1] = 0;
        hist.accumulate(3);
        let pending: i32 = hist.next.iter().sum();
        hist.current_mut().fill(0);
        hist.advance();
        assert_eq!(hist.current.iter().sum::<i32>(), pending);
        assert!(hist.next.iter().all(|&v| v == 0));
    }

    #[test]
    fn load_row_uses_offset_neighbours() {
        let mut hist = GradientCellHistogram::new(4, 3);
        let width = 12;
        let above = vec![0u8; width];
        let below = vec![0u8; width];
        let mut row = vec![0u8; width];
        row[5] = 80;
        hist.load_row(&above, &row, &below, 2);
        // Source column 4 and 6 see the step at 5; visited columns are offset by 2.
        assert_eq!(hist.value[2], 80);
        assert_eq!(hist.value[4], 80);
        assert_eq!(hist.value[3], 0);
    }
}
