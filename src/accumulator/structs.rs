use serde::{Deserialize, Serialize};

use crate::common::constants::{
    DEFAULT_BUCKET_COUNT, DEFAULT_MAX_BUCKETS, DEFAULT_MIN_BUCKETS, DEFAULT_PEAK_THRESHOLD_PCT,
    DEFAULT_VALUE_AREA_PCT,
};
use crate::volume_profile::{PeakRange, ProfileSnapshot, ProfileSummary};

/// Layout and statistics settings for the live profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorConfig {
    pub bucket_count: usize,
    pub dynamic_bucket_sizing: bool,
    pub min_buckets: usize,
    pub max_buckets: usize,
    /// Fixed reference range for dynamic sizing; falls back to the last finalized range
    pub reference_range: Option<f64>,
    pub value_area_pct: f64,
    pub peak_threshold_pct: f64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            dynamic_bucket_sizing: false,
            min_buckets: DEFAULT_MIN_BUCKETS,
            max_buckets: DEFAULT_MAX_BUCKETS,
            reference_range: None,
            value_area_pct: DEFAULT_VALUE_AREA_PCT,
            peak_threshold_pct: DEFAULT_PEAK_THRESHOLD_PCT,
        }
    }
}

/// Inclusive bar span covered by a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub start_bar: u64,
    pub end_bar: u64,
}

/// A completed accumulation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub start_bar: u64,
    pub end_bar: u64,
    pub peaks: Vec<PeakRange>,
    pub summary: ProfileSummary,
}

impl HistoricalRecord {
    pub fn boundary(&self) -> Boundary {
        Boundary {
            start_bar: self.start_bar,
            end_bar: self.end_bar,
        }
    }

    pub fn bar_count(&self) -> u64 {
        self.end_bar.saturating_sub(self.start_bar) + 1
    }
}

/// Developing profile state as of the bar just evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveProfile {
    pub boundary: Boundary,
    pub snapshot: Option<ProfileSnapshot>,
    pub peaks: Vec<PeakRange>,
    pub total_volume: f64,
    pub bucket_count: usize,
}
