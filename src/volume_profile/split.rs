use serde::{Deserialize, Serialize};

use crate::common::constants::{SPLIT_BODY_WEIGHT, SPLIT_TREND_WEIGHT, SPLIT_WICK_WEIGHT};
use crate::market_data::Bar;
use super::structs::SplitModel;

/// Incremental EMA seeded with an SMA over the first `period` values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalEma {
    pub period: u32,
    /// Smoothing factor (2 / (period + 1))
    pub alpha: f64,
    pub current_value: Option<f64>,
    count: u32,
    sum: f64,
}

impl IncrementalEma {
    pub fn new(period: u32) -> Self {
        let period = period.max(1);
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            current_value: None,
            count: 0,
            sum: 0.0,
        }
    }

    /// Add a new value and return the updated EMA once warmed up
    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.count = self.count.saturating_add(1);

        if self.count <= self.period {
            self.sum += value;
            if self.count == self.period {
                let sma = self.sum / self.period as f64;
                self.current_value = Some(sma);
            }
        } else if let Some(prev) = self.current_value {
            self.current_value = Some(self.alpha * value + (1.0 - self.alpha) * prev);
        }

        self.current_value
    }

    pub fn value(&self) -> Option<f64> {
        self.current_value
    }

    pub fn is_ready(&self) -> bool {
        self.current_value.is_some()
    }
}

/// Estimates which share of a bar's volume was buying.
///
/// `buy_fraction` is read-only so an unclosed bar can be estimated any number of times;
/// `commit` advances the trend state and must only see closed bars.
#[derive(Debug, Clone)]
pub enum SplitEstimator {
    Classic,
    Dynamic { trend: IncrementalEma },
}

impl SplitEstimator {
    pub fn new(model: SplitModel, trend_period: u32) -> Self {
        match model {
            SplitModel::Classic => SplitEstimator::Classic,
            SplitModel::Dynamic => SplitEstimator::Dynamic {
                trend: IncrementalEma::new(trend_period),
            },
        }
    }

    pub fn model(&self) -> SplitModel {
        match self {
            SplitEstimator::Classic => SplitModel::Classic,
            SplitEstimator::Dynamic { .. } => SplitModel::Dynamic,
        }
    }

    /// Buy share of the bar's volume in `[0, 1]`
    pub fn buy_fraction(&self, bar: &Bar) -> f64 {
        match self {
            SplitEstimator::Classic => {
                if bar.is_bullish() {
                    1.0
                } else {
                    0.0
                }
            }
            SplitEstimator::Dynamic { trend } => dynamic_buy_fraction(bar, trend.value()),
        }
    }

    pub fn commit(&mut self, bar: &Bar) {
        if let SplitEstimator::Dynamic { trend } = self {
            trend.update(bar.close);
        }
    }
}

/// Blend body direction, wick asymmetry and close-vs-EMA trend into a buy share.
///
/// Each term lies in [-1, 1]; the weighted blend maps linearly onto [0, 1]. Degenerate bars
/// split evenly.
fn dynamic_buy_fraction(bar: &Bar, trend_value: Option<f64>) -> f64 {
    let range = bar.range();
    if range <= 0.0 {
        return 0.5;
    }

    let body = (bar.close - bar.open) / range;
    let upper_wick = bar.high - bar.open.max(bar.close);
    let lower_wick = bar.open.min(bar.close) - bar.low;
    let wick = (lower_wick - upper_wick) / range;
    let trend = trend_value
        .map(|ema| ((bar.close - ema) / range).tanh())
        .unwrap_or(0.0);

    let weight_sum = SPLIT_BODY_WEIGHT + SPLIT_WICK_WEIGHT + SPLIT_TREND_WEIGHT;
    let score = (SPLIT_BODY_WEIGHT * body + SPLIT_WICK_WEIGHT * wick + SPLIT_TREND_WEIGHT * trend) / weight_sum;

    (0.5 + 0.5 * score).clamp(0.0, 1.0)
}
