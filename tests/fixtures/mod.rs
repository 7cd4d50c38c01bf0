#![allow(dead_code)]

use anchored_profile::anchor::{ResetEvent, ResetTrigger, TrendState};
use anchored_profile::market_data::{Bar, SubBarSample};
use anchored_profile::pipeline::ProfilerConfig;
use anchored_profile::volume_profile::{PeakRange, ProfileSummary};
use anchored_profile::accumulator::HistoricalRecord;

/// Create a one-minute bar centred on `price`, closing above its open
pub fn create_sample_bar(index: u64, price: f64, volume: f64) -> Bar {
    Bar::new(
        index as i64 * 60_000,
        price - 0.25,
        price + 1.0,
        price - 1.0,
        price + 0.5,
        volume,
    )
}

/// Sine-wave price path with swings large enough to produce pivots and trend changes
pub fn create_wave_bars(count: u64, period: f64, amplitude: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let phase = i as f64 * std::f64::consts::TAU / period;
            let drift = (i as f64 / (period * 2.0)).sin() * amplitude * 0.5;
            let price = 100.0 + amplitude * phase.sin() + drift;
            let volume = 100.0 + (i % 13) as f64 * 10.0;
            create_sample_bar(i, price, volume)
        })
        .collect()
}

/// Runs of bullish and bearish candles. Within each phase the up/down run lengths are
/// lopsided, so cumulative delta under the candle-colour split climbs in one phase and falls
/// in the next, alternating its swing structure.
pub fn create_delta_cycle_bars(phases: usize, cycles_per_phase: usize) -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut price = 100.0;
    for phase in 0..phases {
        let (up, down) = if phase % 2 == 0 { (8, 5) } else { (5, 8) };
        for _ in 0..cycles_per_phase {
            for bullish in std::iter::repeat(true).take(up).chain(std::iter::repeat(false).take(down)) {
                let close = if bullish { price + 0.5 } else { price - 0.5 };
                let index = bars.len() as i64;
                bars.push(Bar::new(
                    index * 60_000,
                    price,
                    price.max(close) + 0.25,
                    price.min(close) - 0.25,
                    close,
                    100.0,
                ));
                price = close;
            }
        }
    }
    bars
}

/// Bar carrying intra-bar samples split across its range
pub fn create_bar_with_samples(index: u64, price: f64) -> Bar {
    create_sample_bar(index, price, 0.0).with_sub_bars(vec![
        SubBarSample::new(40.0, 10.0, price, price - 1.0),
        SubBarSample::new(15.0, 35.0, price + 1.0, price),
    ])
}

pub fn create_reset(bar: u64, lag: u64) -> ResetEvent {
    ResetEvent {
        bar,
        lag,
        trigger: ResetTrigger::TrendFlip {
            from: TrendState::Bullish,
            to: TrendState::Bearish,
        },
    }
}

pub fn create_record(start_bar: u64, end_bar: u64, peak_count: usize) -> HistoricalRecord {
    HistoricalRecord {
        start_bar,
        end_bar,
        peaks: (0..peak_count)
            .map(|p| PeakRange {
                low: start_bar as f64 + p as f64 * 2.0,
                high: start_bar as f64 + p as f64 * 2.0 + 1.0,
            })
            .collect(),
        summary: ProfileSummary::default(),
    }
}

/// Small pivot windows so short synthetic series produce resets
pub fn create_test_config() -> ProfilerConfig {
    ProfilerConfig {
        pivot_left_bars: 2,
        pivot_right_bars: 2,
        bucket_count: 12,
        ..ProfilerConfig::default()
    }
}
