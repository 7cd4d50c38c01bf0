use thiserror::Error;

/// Broken internal invariants. These indicate programming bugs; verifiers return them so
/// tests can assert they never occur.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Volume conservation violated: expected={expected}, actual={actual}")]
    VolumeConservation { expected: f64, actual: f64 },
    #[error("Bucket partition broken at bucket {index}: {detail}")]
    BucketPartition { index: usize, detail: String },
    #[error("Peak index misaligned for record {record}: expected start {expected}, found {actual}")]
    PeakIndexMisaligned { record: usize, expected: usize, actual: usize },
    #[error("Peak table covers {covered} entries but flattened storage holds {stored}")]
    PeakTableLength { covered: usize, stored: usize },
    #[error("Record {index} ends at bar {end} but next record starts at bar {next_start}")]
    BoundaryDiscontinuity { index: usize, end: u64, next_start: u64 },
    #[error("History holds {size} records, capacity is {capacity}")]
    CapacityExceeded { size: usize, capacity: usize },
}
