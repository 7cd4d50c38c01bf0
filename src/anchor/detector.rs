use tracing::{debug, info};

use super::classifier::StructureClassifier;
use super::pivots::PivotTracker;
use super::structs::{AnchorMode, AnchorPhase, AnchorState, Baseline, ResetEvent, ResetTrigger, TrendState};
use crate::market_data::{DeltaInfo, PriceInfo};

/// Impulse baseline over confirmed price pivots.
///
/// A pivot high pulls the baseline down to the cumulative delta at the pivot bar, a pivot
/// low pushes it up. Any change of an established baseline is a reset.
#[derive(Debug, Clone)]
pub struct SwingPolicy {
    pivots: PivotTracker,
    baseline: Option<f64>,
}

impl SwingPolicy {
    pub fn new(left: usize, right: usize) -> Self {
        Self {
            pivots: PivotTracker::new(left, right),
            baseline: None,
        }
    }

    pub fn lag(&self) -> u64 {
        self.pivots.confirmation_lag()
    }

    fn observe(&mut self, bar: u64, price: &PriceInfo, delta: &DeltaInfo) -> Option<ResetTrigger> {
        // The pivot's delta is where cumulative delta closed on the pivot bar; the min/max
        // rule below supplies the extreme across pivots.
        let confirmed = self.pivots.update(bar, price.high, price.low, delta.close);
        let before = self.baseline;
        let mut next = before;

        if let Some(pivot) = confirmed.high {
            next = Some(next.map_or(pivot.aux, |b| b.min(pivot.aux)));
        }
        if let Some(pivot) = confirmed.low {
            next = Some(next.map_or(pivot.aux, |b| b.max(pivot.aux)));
        }
        self.baseline = next;

        match (before, next) {
            (Some(from), Some(to)) if from != to => Some(ResetTrigger::ImpulseShift { from, to }),
            _ => None,
        }
    }
}

/// Closed set of anchoring policies
#[derive(Debug, Clone)]
pub enum AnchorPolicy {
    Swing(SwingPolicy),
    Structure(StructureClassifier),
    Delta(StructureClassifier),
}

impl AnchorPolicy {
    pub fn new(mode: AnchorMode, left: usize, right: usize) -> Self {
        match mode {
            AnchorMode::Swing => AnchorPolicy::Swing(SwingPolicy::new(left, right)),
            AnchorMode::Structure => AnchorPolicy::Structure(StructureClassifier::new(left, right)),
            AnchorMode::Delta => AnchorPolicy::Delta(StructureClassifier::new(left, right)),
        }
    }

    pub fn mode(&self) -> AnchorMode {
        match self {
            AnchorPolicy::Swing(_) => AnchorMode::Swing,
            AnchorPolicy::Structure(_) => AnchorMode::Structure,
            AnchorPolicy::Delta(_) => AnchorMode::Delta,
        }
    }

    /// Boundary lag carried by every reset from this policy
    pub fn lag(&self) -> u64 {
        match self {
            AnchorPolicy::Swing(policy) => policy.lag(),
            AnchorPolicy::Structure(_) | AnchorPolicy::Delta(_) => 0,
        }
    }

    fn baseline(&self) -> Baseline {
        match self {
            AnchorPolicy::Swing(policy) => Baseline::Impulse(policy.baseline),
            AnchorPolicy::Structure(c) | AnchorPolicy::Delta(c) => Baseline::Trend(c.state()),
        }
    }

    fn observe(&mut self, bar: u64, price: &PriceInfo, delta: &DeltaInfo) -> Option<ResetTrigger> {
        match self {
            AnchorPolicy::Swing(policy) => policy.observe(bar, price, delta),
            AnchorPolicy::Structure(classifier) => trend_flip(classifier, bar, price.high, price.low),
            AnchorPolicy::Delta(classifier) => trend_flip(classifier, bar, delta.high, delta.low),
        }
    }
}

/// Leaving Neutral establishes the first trend and opens no new phase, since there is no
/// prior phase to close. Only a Bullish/Bearish flip is a reset.
fn trend_flip(classifier: &mut StructureClassifier, bar: u64, high: f64, low: f64) -> Option<ResetTrigger> {
    let from = classifier.state();
    let to = classifier.update(bar, high, low);
    match (from, to) {
        (TrendState::Bullish, TrendState::Bearish) | (TrendState::Bearish, TrendState::Bullish) => {
            Some(ResetTrigger::TrendFlip { from, to })
        }
        _ => None,
    }
}

/// Decides where accumulation phases begin. Fed closed bars only, in order.
#[derive(Debug, Clone)]
pub struct AnchorDetector {
    policy: AnchorPolicy,
    state: AnchorState,
}

impl AnchorDetector {
    pub fn new(mode: AnchorMode, pivot_left: usize, pivot_right: usize) -> Self {
        let policy = AnchorPolicy::new(mode, pivot_left, pivot_right);
        let state = AnchorState {
            mode,
            baseline: policy.baseline(),
            phase: AnchorPhase::Accumulating,
            last_reset_bar: None,
            is_first_reset: true,
            delay: policy.lag(),
        };
        Self { policy, state }
    }

    pub fn state(&self) -> &AnchorState {
        &self.state
    }

    pub fn mode(&self) -> AnchorMode {
        self.policy.mode()
    }

    pub fn lag(&self) -> u64 {
        self.state.delay
    }

    /// Observe one closed bar and report whether a new phase begins on it
    pub fn on_bar(&mut self, bar_index: u64, price: &PriceInfo, delta: &DeltaInfo) -> Option<ResetEvent> {
        let trigger = self.policy.observe(bar_index, price, delta);
        self.state.baseline = self.policy.baseline();

        let Some(trigger) = trigger else {
            self.state.phase = AnchorPhase::Accumulating;
            return None;
        };

        let event = ResetEvent {
            bar: bar_index,
            lag: self.state.delay,
            trigger,
        };

        if self.state.is_first_reset {
            info!("⚓ First {} reset at bar {} (lag {})", self.state.mode, bar_index, event.lag);
            self.state.is_first_reset = false;
        } else {
            debug!("⚓ {} reset at bar {}: {:?}", self.state.mode, bar_index, trigger);
        }
        self.state.last_reset_bar = Some(bar_index);
        self.state.phase = AnchorPhase::Resetting;

        Some(event)
    }
}
