use super::calculator::BucketedProfile;
use super::structs::{PeakRange, PeakZone};

/// Maximal runs of consecutive buckets whose volume is at least `threshold_pct` of the
/// largest bucket. The boundary is inclusive: a bucket exactly at the threshold belongs to
/// the zone.
pub fn detect_peak_zones(volumes: &[f64], threshold_pct: f64) -> Vec<PeakZone> {
    let max_volume = volumes.iter().copied().fold(0.0, f64::max);
    if max_volume <= 0.0 {
        return Vec::new();
    }
    let threshold = threshold_pct * max_volume;

    let mut zones = Vec::new();
    let mut run_start: Option<usize> = None;

    for (row, &volume) in volumes.iter().enumerate() {
        match (volume >= threshold, run_start) {
            (true, None) => run_start = Some(row),
            (false, Some(start)) => {
                zones.push(PeakZone { start_row: start, end_row: row - 1 });
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        zones.push(PeakZone { start_row: start, end_row: volumes.len() - 1 });
    }

    zones
}

impl BucketedProfile {
    /// Peak zones as bucket-index ranges on the current grid
    pub fn peak_zones(&self, threshold_pct: f64) -> Vec<PeakZone> {
        detect_peak_zones(&self.bucket_volumes(), threshold_pct)
    }

    /// Peak zones resolved to absolute prices, safe to keep after the grid changes
    pub fn peak_ranges(&self, threshold_pct: f64) -> Vec<PeakRange> {
        self.peak_zones(threshold_pct)
            .into_iter()
            .filter_map(|zone| {
                let (low, _) = self.get_bucket_bounds(zone.start_row)?;
                let (_, high) = self.get_bucket_bounds(zone.end_row)?;
                Some(PeakRange { low, high })
            })
            .collect()
    }
}
