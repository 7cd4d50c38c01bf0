use super::pivots::PivotTracker;
use super::structs::TrendState;

/// Higher-high/higher-low vs lower-high/lower-low classifier over any high/low series.
///
/// The state only moves when both the latest pivot-high comparison and the latest
/// pivot-low comparison agree; a mixed sequence keeps the previous state.
#[derive(Debug, Clone)]
pub struct StructureClassifier {
    pivots: PivotTracker,
    last_high: Option<f64>,
    last_low: Option<f64>,
    higher_high: Option<bool>,
    higher_low: Option<bool>,
    state: TrendState,
}

impl StructureClassifier {
    pub fn new(left: usize, right: usize) -> Self {
        Self {
            pivots: PivotTracker::new(left, right),
            last_high: None,
            last_low: None,
            higher_high: None,
            higher_low: None,
            state: TrendState::Neutral,
        }
    }

    pub fn state(&self) -> TrendState {
        self.state
    }

    /// Feed one bar of the series and return the resulting state
    pub fn update(&mut self, bar: u64, high: f64, low: f64) -> TrendState {
        let confirmed = self.pivots.update(bar, high, low, 0.0);

        if let Some(pivot) = confirmed.high {
            if let Some(prev) = self.last_high {
                self.higher_high = Some(pivot.value > prev);
            }
            self.last_high = Some(pivot.value);
        }
        if let Some(pivot) = confirmed.low {
            if let Some(prev) = self.last_low {
                self.higher_low = Some(pivot.value > prev);
            }
            self.last_low = Some(pivot.value);
        }

        match (self.higher_high, self.higher_low) {
            (Some(true), Some(true)) => self.state = TrendState::Bullish,
            (Some(false), Some(false)) => self.state = TrendState::Bearish,
            _ => {}
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Zig-zag with a pivot every other bar when left = right = 1
    fn zigzag(levels: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut bars = Vec::new();
        for &(peak, trough) in levels {
            bars.push((peak, peak - 1.0));
            bars.push((trough + 1.0, trough));
        }
        bars
    }

    fn run(classifier: &mut StructureClassifier, bars: &[(f64, f64)]) -> Vec<TrendState> {
        bars.iter()
            .enumerate()
            .map(|(i, &(h, l))| classifier.update(i as u64, h, l))
            .collect()
    }

    #[test]
    fn test_neutral_until_two_pivots_each_side() {
        let mut classifier = StructureClassifier::new(1, 1);
        let states = run(&mut classifier, &zigzag(&[(10.0, 5.0), (12.0, 6.0)]));
        assert!(states.iter().all(|s| *s == TrendState::Neutral));
    }

    #[test]
    fn test_rising_sequence_turns_bullish() {
        let mut classifier = StructureClassifier::new(1, 1);
        run(&mut classifier, &zigzag(&[(10.0, 5.0), (12.0, 6.0), (14.0, 7.0), (16.0, 8.0)]));
        assert_eq!(classifier.state(), TrendState::Bullish);
    }

    #[test]
    fn test_falling_sequence_after_rise_turns_bearish() {
        let mut classifier = StructureClassifier::new(1, 1);
        let bars = zigzag(&[
            (10.0, 5.0),
            (12.0, 6.0),
            (14.0, 7.0),
            (16.0, 8.0),
            (13.0, 4.0),
            (11.0, 3.0),
            (9.0, 2.0),
        ]);
        let states = run(&mut classifier, &bars);
        assert!(states.contains(&TrendState::Bullish));
        assert_eq!(classifier.state(), TrendState::Bearish);
    }

    #[test]
    fn test_mixed_structure_keeps_state() {
        let mut classifier = StructureClassifier::new(1, 1);
        // Expanding range: higher highs with lower lows
        run(&mut classifier, &zigzag(&[(10.0, 5.0), (12.0, 4.0), (14.0, 3.0), (16.0, 2.0)]));
        assert_eq!(classifier.state(), TrendState::Neutral);
    }
}
