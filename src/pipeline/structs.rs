use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use crate::accumulator::{AccumulatorConfig, HistoricalRecord, LiveProfile};
use crate::anchor::{AnchorMode, ResetEvent};
use crate::common::constants::*;
use crate::volume_profile::{AllocationModel, DensityShape, SplitModel};

/// Engine configuration, usually read from the `[profiler]` table of `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub bucket_count: usize,
    pub dynamic_bucket_sizing: bool,
    pub min_buckets: usize,
    pub max_buckets: usize,
    pub reference_range: Option<f64>,
    pub value_area_pct: f64,
    pub allocation_model: AllocationModel,
    pub split_model: SplitModel,
    /// PDF integration steps per bucket
    pub quadrature_steps: usize,
    pub pdf_scale: f64,
    pub pdf_tail_weight: f64,
    pub pdf_skew_gain: f64,
    pub split_trend_period: u32,
    pub anchor_mode: AnchorMode,
    pub pivot_left_bars: usize,
    /// Also the boundary lag in Swing mode
    pub pivot_right_bars: usize,
    pub peak_threshold_pct: f64,
    pub history_capacity: usize,
    pub render_lookback: u64,
    pub max_lookback: u64,
    pub safety_margin: u64,
    pub bar_interval_secs: Option<u64>,
    pub sub_bar_interval_secs: Option<u64>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            dynamic_bucket_sizing: false,
            min_buckets: DEFAULT_MIN_BUCKETS,
            max_buckets: DEFAULT_MAX_BUCKETS,
            reference_range: None,
            value_area_pct: DEFAULT_VALUE_AREA_PCT,
            allocation_model: AllocationModel::Classic,
            split_model: SplitModel::Classic,
            quadrature_steps: DEFAULT_QUADRATURE_STEPS,
            pdf_scale: DEFAULT_PDF_SCALE,
            pdf_tail_weight: DEFAULT_PDF_TAIL_WEIGHT,
            pdf_skew_gain: DEFAULT_PDF_SKEW_GAIN,
            split_trend_period: DEFAULT_SPLIT_TREND_PERIOD,
            anchor_mode: AnchorMode::Structure,
            pivot_left_bars: DEFAULT_PIVOT_LEFT_BARS,
            pivot_right_bars: DEFAULT_PIVOT_RIGHT_BARS,
            peak_threshold_pct: DEFAULT_PEAK_THRESHOLD_PCT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            render_lookback: DEFAULT_RENDER_LOOKBACK,
            max_lookback: DEFAULT_MAX_LOOKBACK,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            bar_interval_secs: None,
            sub_bar_interval_secs: None,
        }
    }
}

impl ProfilerConfig {
    /// Parse a standalone TOML document holding the profiler fields at top level
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProfilerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for consistency and reasonable values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_count < 2 {
            return Err(ConfigError::invalid(
                "bucket_count",
                format!("must be at least 2, got {}", self.bucket_count),
            ));
        }

        if self.dynamic_bucket_sizing {
            if self.min_buckets < 1 || self.min_buckets > self.max_buckets {
                return Err(ConfigError::invalid(
                    "min_buckets",
                    format!("must be in [1, max_buckets={}], got {}", self.max_buckets, self.min_buckets),
                ));
            }
            if self.bucket_count < self.min_buckets || self.bucket_count > self.max_buckets {
                return Err(ConfigError::invalid(
                    "bucket_count",
                    format!(
                        "must lie within [{}, {}] when dynamic sizing is enabled, got {}",
                        self.min_buckets, self.max_buckets, self.bucket_count
                    ),
                ));
            }
        }

        if let Some(reference) = self.reference_range {
            if !(reference.is_finite() && reference > 0.0) {
                return Err(ConfigError::invalid("reference_range", format!("must be positive, got {}", reference)));
            }
        }

        if !(self.value_area_pct > 0.0 && self.value_area_pct <= 1.0) {
            return Err(ConfigError::invalid(
                "value_area_pct",
                format!("must be in (0, 1], got {}", self.value_area_pct),
            ));
        }

        if self.quadrature_steps < 1 {
            return Err(ConfigError::invalid("quadrature_steps", "must be at least 1"));
        }

        if !(self.pdf_scale.is_finite() && self.pdf_scale > 0.0) {
            return Err(ConfigError::invalid("pdf_scale", format!("must be positive, got {}", self.pdf_scale)));
        }
        if !(self.pdf_tail_weight.is_finite() && self.pdf_tail_weight > 0.0) {
            return Err(ConfigError::invalid(
                "pdf_tail_weight",
                format!("must be positive, got {}", self.pdf_tail_weight),
            ));
        }
        if !self.pdf_skew_gain.is_finite() {
            return Err(ConfigError::invalid("pdf_skew_gain", "must be finite"));
        }

        if self.split_trend_period < 1 {
            return Err(ConfigError::invalid("split_trend_period", "must be at least 1"));
        }

        if self.pivot_left_bars < 1 || self.pivot_right_bars < 1 {
            return Err(ConfigError::invalid("pivot_left_bars/pivot_right_bars", "must be at least 1"));
        }

        if !(MIN_PEAK_THRESHOLD_PCT..=MAX_PEAK_THRESHOLD_PCT).contains(&self.peak_threshold_pct) {
            return Err(ConfigError::invalid(
                "peak_threshold_pct",
                format!(
                    "must be between {} and {}, got {}",
                    MIN_PEAK_THRESHOLD_PCT, MAX_PEAK_THRESHOLD_PCT, self.peak_threshold_pct
                ),
            ));
        }

        if self.history_capacity < 1 {
            return Err(ConfigError::invalid("history_capacity", "must be at least 1"));
        }

        if self.safety_margin >= self.max_lookback || self.render_lookback >= self.max_lookback - self.safety_margin {
            return Err(ConfigError::RenderWindow {
                render_lookback: self.render_lookback,
                max_lookback: self.max_lookback,
                safety_margin: self.safety_margin,
            });
        }

        if let (Some(bar_secs), Some(sub_bar_secs)) = (self.bar_interval_secs, self.sub_bar_interval_secs) {
            if sub_bar_secs >= bar_secs {
                return Err(ConfigError::SubBarInterval { sub_bar_secs, bar_secs });
            }
        }

        Ok(())
    }

    pub fn accumulator_config(&self) -> AccumulatorConfig {
        AccumulatorConfig {
            bucket_count: self.bucket_count,
            dynamic_bucket_sizing: self.dynamic_bucket_sizing,
            min_buckets: self.min_buckets,
            max_buckets: self.max_buckets,
            reference_range: self.reference_range,
            value_area_pct: self.value_area_pct,
            peak_threshold_pct: self.peak_threshold_pct,
        }
    }

    pub fn density_shape(&self) -> DensityShape {
        DensityShape {
            scale: self.pdf_scale,
            tail_weight: self.pdf_tail_weight,
            skew_gain: self.pdf_skew_gain,
        }
    }
}

/// Result of evaluating one bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarOutput {
    /// Position of the bar among closed bars; an unclosed bar shares the index it will get
    /// once it closes
    pub bar_index: u64,
    pub is_closed: bool,
    pub reset: Option<ResetEvent>,
    pub finalized: Option<HistoricalRecord>,
    pub live: LiveProfile,
}
