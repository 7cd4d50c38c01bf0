use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::float_utils::all_finite;

pub type TimestampMS = i64;

/// Finer-resolution sample aggregated from a shorter interval than the bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubBarSample {
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub range_high: f64,
    pub range_low: f64,
}

impl SubBarSample {
    pub fn new(buy_volume: f64, sell_volume: f64, range_high: f64, range_low: f64) -> Self {
        Self {
            buy_volume,
            sell_volume,
            range_high,
            range_low,
        }
    }

    pub fn volume(&self) -> f64 {
        self.buy_volume + self.sell_volume
    }

    pub fn delta(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }

    pub fn is_valid(&self) -> bool {
        all_finite(&[self.buy_volume, self.sell_volume, self.range_high, self.range_low])
            && self.buy_volume >= 0.0
            && self.sell_volume >= 0.0
            && self.range_high >= self.range_low
    }
}

/// One price/volume bar, optionally carrying intra-bar samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// False while the bar is still receiving updates
    pub is_closed: bool,
    #[serde(default)]
    pub sub_bars: Vec<SubBarSample>,
}

impl Bar {
    pub fn new(open_time: TimestampMS, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            is_closed: true,
            sub_bars: Vec::new(),
        }
    }

    /// Same bar marked as still developing
    pub fn unclosed(mut self) -> Self {
        self.is_closed = false;
        self
    }

    pub fn with_sub_bars(mut self, sub_bars: Vec<SubBarSample>) -> Self {
        self.sub_bars = sub_bars;
        self
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_degenerate(&self) -> bool {
        self.high <= self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Open time as a UTC timestamp; `None` when out of chrono's range
    pub fn open_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.open_time)
    }

    /// Low/high covering the bar and any sub-bar sample ranges
    pub fn price_span(&self) -> (f64, f64) {
        self.sub_bars
            .iter()
            .fold((self.low, self.high), |(low, high), s| (low.min(s.range_low), high.max(s.range_high)))
    }

    pub fn price_info(&self) -> PriceInfo {
        PriceInfo {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }

    /// Reject bars that cannot be allocated: non-finite values, inverted ranges, negative volume
    pub fn validate(&self) -> Result<(), String> {
        if !all_finite(&[self.open, self.high, self.low, self.close, self.volume]) {
            return Err(format!("bar at {} has non-finite values", self.open_time));
        }
        if self.high < self.low {
            return Err(format!(
                "bar at {} has high {} below low {}",
                self.open_time, self.high, self.low
            ));
        }
        if self.open > self.high || self.open < self.low || self.close > self.high || self.close < self.low {
            return Err(format!(
                "bar at {} has open/close outside [{}, {}]",
                self.open_time, self.low, self.high
            ));
        }
        if self.volume < 0.0 {
            return Err(format!("bar at {} has negative volume {}", self.open_time, self.volume));
        }
        if let Some(bad) = self.sub_bars.iter().find(|s| !s.is_valid()) {
            return Err(format!("bar at {} has invalid sub-bar sample {:?}", self.open_time, bad));
        }
        Ok(())
    }
}

/// Price view of a bar handed to anchor detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Cumulative order-flow delta over one bar
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeltaInfo {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl DeltaInfo {
    /// Delta bar that starts at `start` and applies each signed step in order
    pub fn from_steps(start: f64, steps: impl IntoIterator<Item = f64>) -> Self {
        let mut info = Self {
            open: start,
            high: start,
            low: start,
            close: start,
        };
        for step in steps {
            info.close += step;
            info.high = info.high.max(info.close);
            info.low = info.low.min(info.close);
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_span_covers_sub_bars() {
        let bar = Bar::new(0, 10.0, 12.0, 9.0, 11.0, 500.0);
        assert_eq!(bar.price_span(), (9.0, 12.0));

        let bar = bar.with_sub_bars(vec![
            SubBarSample::new(100.0, 50.0, 11.0, 10.0),
            SubBarSample::new(20.0, 30.0, 12.0, 11.0),
        ]);
        assert_eq!(bar.price_span(), (9.0, 12.0));

        let wide = bar.with_sub_bars(vec![SubBarSample::new(1.0, 1.0, 12.5, 8.5)]);
        assert_eq!(wide.price_span(), (8.5, 12.5));
    }

    #[test]
    fn test_open_datetime() {
        let bar = Bar::new(1_700_000_000_000, 1.0, 1.0, 1.0, 1.0, 1.0);
        let opened = bar.open_datetime().unwrap();
        assert_eq!(opened.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let bar = Bar::new(0, 10.0, 9.0, 11.0, 10.0, 1.0);
        assert!(bar.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let bar = Bar::new(0, 10.0, f64::NAN, 9.0, 10.0, 1.0);
        assert!(bar.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_sub_bar() {
        let bar = Bar::new(0, 10.0, 11.0, 9.0, 10.0, 1.0)
            .with_sub_bars(vec![SubBarSample::new(-1.0, 0.0, 10.0, 9.0)]);
        assert!(bar.validate().is_err());
    }

    #[test]
    fn test_degenerate_bar_is_valid() {
        let bar = Bar::new(0, 10.0, 10.0, 10.0, 10.0, 100.0);
        assert!(bar.validate().is_ok());
        assert!(bar.is_degenerate());
    }

    #[test]
    fn test_delta_info_tracks_intrabar_extremes() {
        let info = DeltaInfo::from_steps(100.0, [50.0, -80.0, 10.0]);
        assert_eq!(info.open, 100.0);
        assert_eq!(info.high, 150.0);
        assert_eq!(info.low, 70.0);
        assert_eq!(info.close, 80.0);
    }
}
