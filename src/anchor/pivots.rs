use std::collections::VecDeque;

use super::structs::{ConfirmedPivots, Pivot};

#[derive(Debug, Clone, Copy)]
struct PivotSample {
    bar: u64,
    high: f64,
    low: f64,
    aux: f64,
}

/// Rolling pivot detector.
///
/// A bar is a pivot high when its high is strictly above the `left` preceding highs and at
/// least as high as the `right` following ones (so a plateau yields one pivot, its first
/// bar). Confirmation happens `right` bars after the pivot.
#[derive(Debug, Clone)]
pub struct PivotTracker {
    left: usize,
    right: usize,
    window: VecDeque<PivotSample>,
}

impl PivotTracker {
    pub fn new(left: usize, right: usize) -> Self {
        let left = left.max(1);
        let right = right.max(1);
        Self {
            left,
            right,
            window: VecDeque::with_capacity(left + right + 1),
        }
    }

    /// Bars between a pivot and its confirmation
    pub fn confirmation_lag(&self) -> u64 {
        self.right as u64
    }

    /// Push one bar and report any pivot confirmed by it
    pub fn update(&mut self, bar: u64, high: f64, low: f64, aux: f64) -> ConfirmedPivots {
        if self.window.len() == self.left + self.right + 1 {
            self.window.pop_front();
        }
        self.window.push_back(PivotSample { bar, high, low, aux });

        if self.window.len() < self.left + self.right + 1 {
            return ConfirmedPivots::default();
        }

        let center = self.window[self.left];
        let (before, after) = (self.window.range(..self.left), self.window.range(self.left + 1..));

        let is_high = before.clone().all(|s| center.high > s.high) && after.clone().all(|s| center.high >= s.high);
        let is_low = before.clone().all(|s| center.low < s.low) && after.clone().all(|s| center.low <= s.low);

        ConfirmedPivots {
            high: is_high.then_some(Pivot {
                bar: center.bar,
                value: center.high,
                aux: center.aux,
            }),
            low: is_low.then_some(Pivot {
                bar: center.bar,
                value: center.low,
                aux: center.aux,
            }),
        }
    }
}
