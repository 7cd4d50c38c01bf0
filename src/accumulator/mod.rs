/// Profile Accumulator Module
///
/// Owns the developing profile between anchor resets and turns each completed phase into a
/// `HistoricalRecord` with lag-aware boundaries.
pub mod continuity;
pub mod profile_accumulator;
pub mod structs;

pub use continuity::verify_boundary_continuity;
pub use profile_accumulator::ProfileAccumulator;
pub use structs::{AccumulatorConfig, Boundary, HistoricalRecord, LiveProfile};
