/// Anchor detection: decides on which closed bar a new accumulation phase begins
pub mod classifier;
pub mod detector;
pub mod pivots;
pub mod structs;

pub use classifier::StructureClassifier;
pub use detector::{AnchorDetector, AnchorPolicy, SwingPolicy};
pub use pivots::PivotTracker;
pub use structs::{
    AnchorMode, AnchorPhase, AnchorState, Baseline, ConfirmedPivots, Pivot, ResetEvent, ResetTrigger, TrendState,
};
