use std::collections::VecDeque;

use tracing::{debug, info};

use super::structs::{AccumulatorConfig, Boundary, HistoricalRecord, LiveProfile};
use crate::anchor::ResetEvent;
use crate::market_data::{Bar, DeltaInfo};
use crate::volume_profile::{BucketedProfile, PeakZone, VolumeAllocator};

/// Closed bar kept for replay into a lag-shifted profile
#[derive(Debug, Clone)]
struct ReplayEntry {
    bar_index: u64,
    bar: Bar,
    buy_fraction: f64,
    delta: DeltaInfo,
}

/// Owns the live profile of the current accumulation phase.
///
/// Boundary bookkeeping:
/// - the live profile is anchored at `anchor_bar - anchor_lag`
/// - on reset the completed profile spans `[previous anchor - previous lag, reset bar - 1]`
/// - with a non-zero lag the last `lag` closed bars are replayed into the new profile, so
///   lagged records overlap their predecessor by `lag` bars
#[derive(Debug, Clone)]
pub struct ProfileAccumulator {
    config: AccumulatorConfig,
    allocator: VolumeAllocator,
    profile: BucketedProfile,
    anchor_bar: u64,
    anchor_lag: u64,
    last_closed_bar: Option<u64>,
    replay: VecDeque<ReplayEntry>,
    replay_capacity: usize,
    peaks: Vec<PeakZone>,
    reference_range: Option<f64>,
}

impl ProfileAccumulator {
    /// `replay_capacity` is the largest lag a reset may carry
    pub fn new(config: AccumulatorConfig, allocator: VolumeAllocator, replay_capacity: u64) -> Self {
        Self {
            profile: BucketedProfile::new(config.bucket_count),
            reference_range: config.reference_range,
            config,
            allocator,
            anchor_bar: 0,
            anchor_lag: 0,
            last_closed_bar: None,
            replay: VecDeque::with_capacity(replay_capacity as usize),
            replay_capacity: replay_capacity as usize,
            peaks: Vec::new(),
        }
    }

    pub fn profile(&self) -> &BucketedProfile {
        &self.profile
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    pub fn anchor_bar(&self) -> u64 {
        self.anchor_bar
    }

    pub fn anchor_lag(&self) -> u64 {
        self.anchor_lag
    }

    /// Candidate peak zones of the live profile, refreshed after every merge
    pub fn peaks(&self) -> &[PeakZone] {
        &self.peaks
    }

    /// `(anchor bar - lag, current bar)`, recomputed from stored state on every call
    pub fn live_boundary(&self, current_bar: u64) -> Boundary {
        Boundary {
            start_bar: self.anchor_bar.saturating_sub(self.anchor_lag),
            end_bar: current_bar,
        }
    }

    /// Merge one closed bar into the live profile
    pub fn merge(&mut self, bar_index: u64, bar: &Bar, buy_fraction: f64, delta: &DeltaInfo) {
        apply_bar(
            &mut self.profile,
            &self.allocator,
            &self.config,
            self.reference_range,
            bar,
            buy_fraction,
            delta,
        );
        self.peaks = self.profile.peak_zones(self.config.peak_threshold_pct);
        self.last_closed_bar = Some(bar_index);

        if self.replay_capacity > 0 {
            if self.replay.len() == self.replay_capacity {
                self.replay.pop_front();
            }
            self.replay.push_back(ReplayEntry {
                bar_index,
                bar: bar.clone(),
                buy_fraction,
                delta: *delta,
            });
        }

        debug!(
            "Merged bar {} into profile anchored at {} (volume={:.4}, buckets={})",
            bar_index,
            self.anchor_bar,
            self.profile.total_volume(),
            self.profile.bucket_count()
        );
    }

    /// Live view after merging an unclosed bar into a copy of the profile.
    ///
    /// The stored profile is untouched, so repeated calls with successive updates of the same
    /// bar never double count.
    pub fn preview(&self, current_bar: u64, bar: &Bar, buy_fraction: f64, delta: &DeltaInfo) -> LiveProfile {
        let mut profile = self.profile.clone();
        apply_bar(
            &mut profile,
            &self.allocator,
            &self.config,
            self.reference_range,
            bar,
            buy_fraction,
            delta,
        );
        self.view_of(&profile, current_bar)
    }

    /// Live view of the stored profile
    pub fn live_view(&self, current_bar: u64) -> LiveProfile {
        self.view_of(&self.profile, current_bar)
    }

    fn view_of(&self, profile: &BucketedProfile, current_bar: u64) -> LiveProfile {
        LiveProfile {
            boundary: self.live_boundary(current_bar),
            snapshot: profile.snapshot(self.config.value_area_pct),
            peaks: profile.peak_ranges(self.config.peak_threshold_pct),
            total_volume: profile.total_volume(),
            bucket_count: profile.bucket_count(),
        }
    }

    /// Close the current phase and start a new one anchored at the reset.
    ///
    /// Returns `None` when no closed bar was merged since the current anchor, which leaves
    /// nothing to record.
    pub fn finalize(&mut self, reset: &ResetEvent) -> Option<HistoricalRecord> {
        let start_bar = self.anchor_bar.saturating_sub(self.anchor_lag);
        let has_bars = self.last_closed_bar.is_some_and(|last| last >= self.anchor_bar);

        let record = if has_bars && reset.bar > start_bar {
            Some(HistoricalRecord {
                start_bar,
                end_bar: reset.bar - 1,
                peaks: self.profile.peak_ranges(self.config.peak_threshold_pct),
                summary: self.profile.summary(self.config.value_area_pct),
            })
        } else {
            None
        };

        if let Some(record) = &record {
            info!(
                "📊 Finalized profile [{}, {}]: volume={:.4}, peaks={}",
                record.start_bar,
                record.end_bar,
                record.summary.total_volume,
                record.peaks.len()
            );
        }

        self.rotate(reset);
        record
    }

    fn rotate(&mut self, reset: &ResetEvent) {
        if self.config.dynamic_bucket_sizing && self.config.reference_range.is_none() && self.profile.range() > 0.0 {
            self.reference_range = Some(self.profile.range());
        }

        self.profile = BucketedProfile::new(self.config.bucket_count);
        self.anchor_bar = reset.bar;
        self.anchor_lag = reset.lag;

        let boundary = reset.boundary_bar();
        let replayed: Vec<ReplayEntry> = self
            .replay
            .iter()
            .filter(|entry| entry.bar_index >= boundary && entry.bar_index < reset.bar)
            .cloned()
            .collect();

        for entry in &replayed {
            apply_bar(
                &mut self.profile,
                &self.allocator,
                &self.config,
                self.reference_range,
                &entry.bar,
                entry.buy_fraction,
                &entry.delta,
            );
        }
        if !replayed.is_empty() {
            debug!("Replayed {} lagged bars from bar {}", replayed.len(), boundary);
        }
        self.peaks = self.profile.peak_zones(self.config.peak_threshold_pct);
    }
}

/// Allocate a bar on the grid covering it, merge, and rescale the bucket count when dynamic
/// sizing has a reference range.
fn apply_bar(
    profile: &mut BucketedProfile,
    allocator: &VolumeAllocator,
    config: &AccumulatorConfig,
    reference_range: Option<f64>,
    bar: &Bar,
    buy_fraction: f64,
    delta: &DeltaInfo,
) {
    let (low, high) = bar.price_span();
    let grid = profile.covering_grid(low, high);
    let contribution = allocator.allocate(bar, buy_fraction, &grid);
    profile.merge(&contribution);
    profile.record_delta(delta.low, delta.high);

    if !config.dynamic_bucket_sizing {
        return;
    }
    if let Some(reference) = reference_range.filter(|r| *r > 0.0) {
        let scaled = (config.bucket_count as f64 * profile.range() / reference).round() as usize;
        profile.resize_buckets(scaled.clamp(config.min_buckets, config.max_buckets));
    }
}
