use tracing::{debug, info, warn};

use super::errors::ConfigError;
use super::structs::{BarOutput, ProfilerConfig};
use crate::accumulator::{HistoricalRecord, LiveProfile, ProfileAccumulator};
use crate::anchor::AnchorDetector;
use crate::history::{HistoryStore, RenderWindowFilter, RenderableRecord};
use crate::market_data::{Bar, DeltaInfo};
use crate::volume_profile::{SplitEstimator, VolumeAllocator};

/// Bar-synchronous driving loop: split estimation, cumulative delta, anchor detection,
/// accumulation and history, one bar at a time.
///
/// Only closed bars advance state. An unclosed bar is evaluated against a copy of the live
/// profile, so it may be re-evaluated any number of times as it updates.
#[derive(Debug, Clone)]
pub struct ProfileEngine {
    config: ProfilerConfig,
    split: SplitEstimator,
    detector: AnchorDetector,
    accumulator: ProfileAccumulator,
    history: HistoryStore,
    filter: RenderWindowFilter,
    next_bar_index: u64,
    cumulative_delta: f64,
    bars_skipped: u64,
}

impl ProfileEngine {
    pub fn new(config: ProfilerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let detector = AnchorDetector::new(config.anchor_mode, config.pivot_left_bars, config.pivot_right_bars);
        let allocator = VolumeAllocator::new(config.allocation_model, config.quadrature_steps, config.density_shape());
        let accumulator = ProfileAccumulator::new(config.accumulator_config(), allocator, detector.lag());

        info!(
            "🚀 Profile engine started: mode={}, buckets={}, allocation={:?}, split={:?}, lag={}",
            config.anchor_mode,
            config.bucket_count,
            config.allocation_model,
            config.split_model,
            detector.lag()
        );

        Ok(Self {
            split: SplitEstimator::new(config.split_model, config.split_trend_period),
            history: HistoryStore::new(config.history_capacity),
            filter: RenderWindowFilter::new(config.render_lookback, config.max_lookback, config.safety_margin),
            detector,
            accumulator,
            config,
            next_bar_index: 0,
            cumulative_delta: 0.0,
            bars_skipped: 0,
        })
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn accumulator(&self) -> &ProfileAccumulator {
        &self.accumulator
    }

    pub fn detector(&self) -> &AnchorDetector {
        &self.detector
    }

    /// Number of closed bars processed
    pub fn bar_count(&self) -> u64 {
        self.next_bar_index
    }

    pub fn bars_skipped(&self) -> u64 {
        self.bars_skipped
    }

    pub fn cumulative_delta(&self) -> f64 {
        self.cumulative_delta
    }

    /// Evaluate one bar. Bars rejected by validation are skipped and yield `None`.
    pub fn evaluate(&mut self, bar: &Bar) -> Option<BarOutput> {
        if let Err(reason) = bar.validate() {
            warn!("Skipping invalid bar: {}", reason);
            self.bars_skipped += 1;
            return None;
        }

        let bar_index = self.next_bar_index;
        let buy_fraction = self.split.buy_fraction(bar);
        let delta = self.bar_delta(bar, buy_fraction);

        if !bar.is_closed {
            return Some(BarOutput {
                bar_index,
                is_closed: false,
                reset: None,
                finalized: None,
                live: self.accumulator.preview(bar_index, bar, buy_fraction, &delta),
            });
        }

        let reset = self.detector.on_bar(bar_index, &bar.price_info(), &delta);
        let finalized = reset.and_then(|event| self.accumulator.finalize(&event));

        if let Some(record) = &finalized {
            self.history.append(record.clone());
            self.history.evict_if_over_capacity();
            debug_assert!(self.history.verify_index_table().is_ok());
        }

        self.accumulator.merge(bar_index, bar, buy_fraction, &delta);
        self.split.commit(bar);
        self.cumulative_delta = delta.close;
        self.next_bar_index += 1;

        Some(BarOutput {
            bar_index,
            is_closed: true,
            reset,
            finalized,
            live: self.accumulator.live_view(bar_index),
        })
    }

    /// Evaluate a batch of bars, keeping outputs for the bars that were not skipped
    pub fn evaluate_all<'a>(&mut self, bars: impl IntoIterator<Item = &'a Bar>) -> Vec<BarOutput> {
        bars.into_iter().filter_map(|bar| self.evaluate(bar)).collect()
    }

    /// Cumulative delta path through the bar: sub-bar deltas when present, otherwise the
    /// estimated buy/sell imbalance as a single step.
    fn bar_delta(&self, bar: &Bar, buy_fraction: f64) -> DeltaInfo {
        if bar.sub_bars.is_empty() {
            let step = bar.volume * (2.0 * buy_fraction.clamp(0.0, 1.0) - 1.0);
            DeltaInfo::from_steps(self.cumulative_delta, [step])
        } else {
            DeltaInfo::from_steps(self.cumulative_delta, bar.sub_bars.iter().map(|s| s.delta()))
        }
    }

    /// Developing profile as of the last closed bar
    pub fn live_profile(&self) -> LiveProfile {
        self.accumulator.live_view(self.current_position())
    }

    /// Stored records, oldest first
    pub fn records(&self) -> Vec<HistoricalRecord> {
        self.history.records()
    }

    /// Records the render window allows at the current position
    pub fn render(&self) -> Vec<RenderableRecord> {
        let selected = self.filter.select(&self.history, self.current_position());
        debug!("Render selected {} of {} records", selected.len(), self.history.len());
        selected
    }

    fn current_position(&self) -> u64 {
        self.next_bar_index.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorMode;
    use crate::market_data::SubBarSample;

    fn bar(i: i64, close: f64) -> Bar {
        Bar::new(i * 60_000, close - 0.5, close + 1.0, close - 1.0, close, 100.0)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ProfilerConfig {
            render_lookback: 10_000,
            ..ProfilerConfig::default()
        };
        assert!(ProfileEngine::new(config).is_err());
    }

    #[test]
    fn test_closed_bars_advance_index() {
        let mut engine = ProfileEngine::new(ProfilerConfig::default()).unwrap();
        let first = engine.evaluate(&bar(0, 100.0)).unwrap();
        let second = engine.evaluate(&bar(1, 101.0)).unwrap();

        assert_eq!(first.bar_index, 0);
        assert_eq!(second.bar_index, 1);
        assert_eq!(engine.bar_count(), 2);
        assert_eq!(second.live.boundary.start_bar, 0);
        assert_eq!(second.live.boundary.end_bar, 1);
        assert!((second.live.total_volume - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_unclosed_bar_reevaluation_is_idempotent() {
        let mut engine = ProfileEngine::new(ProfilerConfig::default()).unwrap();
        engine.evaluate(&bar(0, 100.0));

        let live = bar(1, 101.0).unclosed();
        let outputs: Vec<BarOutput> = (0..5).filter_map(|_| engine.evaluate(&live)).collect();

        assert!(outputs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(outputs[0].bar_index, 1);
        assert_eq!(engine.bar_count(), 1);
        assert!((engine.accumulator().profile().total_volume() - 100.0).abs() < 1e-9);

        let closed = engine.evaluate(&bar(1, 101.0)).unwrap();
        assert_eq!(closed.bar_index, 1);
        assert_eq!(closed.live.snapshot, outputs[0].live.snapshot);
    }

    #[test]
    fn test_invalid_bar_is_skipped() {
        let mut engine = ProfileEngine::new(ProfilerConfig::default()).unwrap();
        let broken = Bar::new(0, 10.0, 9.0, 11.0, 10.0, 1.0);
        assert!(engine.evaluate(&broken).is_none());
        assert_eq!(engine.bars_skipped(), 1);
        assert_eq!(engine.bar_count(), 0);
    }

    #[test]
    fn test_cumulative_delta_from_sub_bars() {
        let mut engine = ProfileEngine::new(ProfilerConfig::default()).unwrap();
        let with_samples = bar(0, 100.0).with_sub_bars(vec![
            SubBarSample::new(30.0, 10.0, 100.0, 99.5),
            SubBarSample::new(5.0, 45.0, 100.5, 99.0),
        ]);
        engine.evaluate(&with_samples);
        assert!((engine.cumulative_delta() - (-20.0)).abs() < 1e-9);

        let extrema = engine.accumulator().profile().delta_extrema().unwrap();
        assert_eq!(extrema.max, 20.0);
        assert_eq!(extrema.min, -20.0);
    }

    #[test]
    fn test_classic_split_delta_follows_candle_colour() {
        let mut engine = ProfileEngine::new(ProfilerConfig::default()).unwrap();
        engine.evaluate(&bar(0, 100.0));
        assert_eq!(engine.cumulative_delta(), 100.0);
    }

    #[test]
    fn test_swing_engine_reports_lag() {
        let config = ProfilerConfig {
            anchor_mode: AnchorMode::Swing,
            pivot_right_bars: 3,
            ..ProfilerConfig::default()
        };
        let engine = ProfileEngine::new(config).unwrap();
        assert_eq!(engine.detector().lag(), 3);
        assert!(engine.render().is_empty());
    }
}
