use serde::{Deserialize, Serialize};

/// Policy deciding when the current accumulation phase ends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AnchorMode {
    /// Impulse baseline over confirmed price pivots; boundaries are shifted back by the
    /// pivot confirmation lag
    Swing,
    /// Pivot-sequence trend classifier over price highs/lows, zero lag
    #[default]
    Structure,
    /// Pivot-sequence trend classifier over cumulative delta, zero lag
    Delta,
}

impl std::fmt::Display for AnchorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorMode::Swing => write!(f, "Swing"),
            AnchorMode::Structure => write!(f, "Structure"),
            AnchorMode::Delta => write!(f, "Delta"),
        }
    }
}

impl std::str::FromStr for AnchorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swing" => Ok(Self::Swing),
            "structure" => Ok(Self::Structure),
            "delta" => Ok(Self::Delta),
            _ => Err(format!("Invalid anchor mode: {}. Valid options: Swing, Structure, Delta", s)),
        }
    }
}

/// Trend classification from the last two pivot highs and lows
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TrendState {
    /// Not enough pivots yet
    #[default]
    Neutral,
    /// Higher high and higher low
    Bullish,
    /// Lower high and lower low
    Bearish,
}

/// A confirmed local extreme. `bar` is the bar of the extreme itself, not the bar on which
/// it was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub bar: u64,
    pub value: f64,
    /// Auxiliary series value at the pivot bar (cumulative delta for Swing mode)
    pub aux: f64,
}

/// Pivots confirmed on one update; both can fire on a single wide bar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfirmedPivots {
    pub high: Option<Pivot>,
    pub low: Option<Pivot>,
}

/// Mode-dependent baseline tracked by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Baseline {
    Impulse(Option<f64>),
    Trend(TrendState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorPhase {
    Accumulating,
    /// A reset fired on the most recent bar
    Resetting,
}

/// Why a reset fired
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResetTrigger {
    ImpulseShift { from: f64, to: f64 },
    TrendFlip { from: TrendState, to: TrendState },
}

/// Emitted when a new accumulation phase begins at `bar`.
///
/// `lag` is the number of bars between the true anchor and its confirmation; the new phase
/// boundary is `bar - lag`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResetEvent {
    pub bar: u64,
    pub lag: u64,
    pub trigger: ResetTrigger,
}

impl ResetEvent {
    /// Bar the new phase is anchored to once the confirmation lag is taken back
    pub fn boundary_bar(&self) -> u64 {
        self.bar.saturating_sub(self.lag)
    }
}

/// Detector bookkeeping, mutated only by the anchor detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorState {
    pub mode: AnchorMode,
    pub baseline: Baseline,
    pub phase: AnchorPhase,
    pub last_reset_bar: Option<u64>,
    pub is_first_reset: bool,
    /// Confirmation lag applied to boundaries: pivot right bars for Swing, zero otherwise
    pub delay: u64,
}
