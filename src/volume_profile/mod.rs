/// Volume Profile Module
///
/// Bucketed volume distributions for one accumulation phase: allocation of bar volume into
/// price buckets, POC/value-area/VWAP statistics, peak-zone detection and invariant checks.
pub mod allocator;
pub mod calculator;
pub mod peaks;
pub mod split;
pub mod structs;
pub mod validation;

pub use allocator::{DensityShape, SkewDensity, VolumeAllocator};
pub use calculator::{rebin, BucketedProfile};
pub use peaks::detect_peak_zones;
pub use split::{IncrementalEma, SplitEstimator};
pub use structs::{
    AllocationModel, Bucket, BucketGrid, DeltaExtrema, PeakRange, PeakZone, ProfileContribution,
    ProfileSnapshot, ProfileSummary, SplitModel, ValueArea,
};
pub use validation::{verify_partition, verify_volume_conservation};
