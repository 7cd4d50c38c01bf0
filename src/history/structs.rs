use serde::{Deserialize, Serialize};

use crate::volume_profile::{PeakRange, ProfileSummary};

/// Stored record metadata; peaks live in the store's flattened peak buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub start_bar: u64,
    pub end_bar: u64,
    /// Offset of this record's first peak in the flattened buffer
    pub peak_start: usize,
    pub peak_count: usize,
    pub summary: ProfileSummary,
}

/// A record cleared for rendering, with offsets back from the current bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderableRecord {
    /// Position in the store at selection time (0 = oldest)
    pub index: usize,
    pub start_bar: u64,
    pub end_bar: u64,
    pub start_offset: u64,
    pub end_offset: u64,
    /// Start offset was cut down to the safe reference depth
    pub clipped: bool,
    pub peaks: Vec<PeakRange>,
    pub summary: ProfileSummary,
}
