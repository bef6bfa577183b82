//! Top-K tracking for score-map peaks.

use std::cmp::Ordering;

/// Score-map position that passed the detection threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Column in the score map.
    pub x: usize,
    /// Row in the score map.
    pub y: usize,
    /// Filter response at the peak.
    pub score: f32,
    /// Pyramid level the score map belongs to.
    pub level: usize,
}

fn peak_cmp_desc(a: &Peak, b: &Peak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.level.cmp(&b.level))
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts peaks by descending score with deterministic tie-breaking.
pub(crate) fn sort_peaks_desc(peaks: &mut [Peak]) {
    peaks.sort_by(peak_cmp_desc);
}

/// Top-K container with O(k) insertion cost.
pub struct TopK<T> {
    k: usize,
    items: Vec<T>,
}

impl TopK<Peak> {
    /// Creates a new Top-K collector.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k.min(1024)),
        }
    }

    /// Pushes a peak, evicting the lowest score if at capacity.
    pub fn push(&mut self, peak: Peak) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(peak);
            return;
        }

        let mut worst_idx = 0usize;
        for (idx, item) in self.items.iter().enumerate().skip(1) {
            if peak_cmp_desc(item, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if peak_cmp_desc(&peak, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = peak;
        }
    }

    /// Returns peaks sorted by descending score.
    pub fn into_sorted_desc(mut self) -> Vec<Peak> {
        sort_peaks_desc(&mut self.items);
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::{Peak, TopK};

    fn peak(x: usize, score: f32, level: usize) -> Peak {
        Peak {
            x,
            y: 0,
            score,
            level,
        }
    }

    #[test]
    fn keeps_best_k_in_order() {
        let mut topk = TopK::new(2);
        topk.push(peak(0, 0.1, 0));
        topk.push(peak(1, 0.9, 0));
        topk.push(peak(2, 0.5, 0));
        topk.push(peak(3, 0.2, 0));
        let kept = topk.into_sorted_desc();
        assert_eq!(kept.iter().map(|p| p.x).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn ties_prefer_lower_level_then_position() {
        let mut topk = TopK::new(3);
        topk.push(peak(5, 1.0, 1));
        topk.push(peak(7, 1.0, 0));
        topk.push(peak(2, 1.0, 0));
        let kept = topk.into_sorted_desc();
        assert_eq!(
            kept.iter().map(|p| (p.level, p.x)).collect::<Vec<_>>(),
            vec![(0, 2), (0, 7), (1, 5)]
        );
    }
}
