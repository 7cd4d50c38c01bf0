use tracing::debug;

use crate::common::constants::VOLUME_EPSILON;
use crate::common::float_utils::overlap;
use super::structs::{
    Bucket, BucketGrid, DeltaExtrema, ProfileContribution, ProfileSnapshot, ProfileSummary,
    ValueArea,
};

/// Resizable bucketed volume distribution for one accumulation phase.
///
/// The grid is unset until the first non-empty merge; afterwards the buckets always partition
/// `[range_low, range_high]` evenly and their volumes sum to everything merged so far.
#[derive(Debug, Clone)]
pub struct BucketedProfile {
    grid: Option<BucketGrid>,
    bucket_count: usize,
    buckets: Vec<Bucket>,
    delta_extrema: Option<DeltaExtrema>,
    bars_merged: u32,
}

impl BucketedProfile {
    /// Create an empty profile with `bucket_count` buckets
    pub fn new(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            grid: None,
            bucket_count,
            buckets: vec![Bucket::default(); bucket_count],
            delta_extrema: None,
            bars_merged: 0,
        }
    }

    /// Build a profile directly from per-bucket volumes (all counted as buy volume)
    pub fn from_bucket_volumes(range_low: f64, range_high: f64, volumes: &[f64]) -> Self {
        let grid = BucketGrid::new(range_low, range_high, volumes.len());
        let mut buckets = vec![Bucket::default(); grid.count];
        for (bucket, &volume) in buckets.iter_mut().zip(volumes) {
            bucket.buy = volume;
        }
        Self {
            grid: Some(grid),
            bucket_count: grid.count,
            buckets,
            delta_extrema: None,
            bars_merged: 0,
        }
    }

    pub fn grid(&self) -> Option<BucketGrid> {
        self.grid
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket_volumes(&self) -> Vec<f64> {
        self.buckets.iter().map(Bucket::total).collect()
    }

    pub fn range_low(&self) -> Option<f64> {
        self.grid.map(|g| g.low)
    }

    pub fn range_high(&self) -> Option<f64> {
        self.grid.map(|g| g.high)
    }

    /// Width of the price range, zero before the first merge
    pub fn range(&self) -> f64 {
        self.grid.map(|g| g.high - g.low).unwrap_or(0.0)
    }

    pub fn bars_merged(&self) -> u32 {
        self.bars_merged
    }

    pub fn delta_extrema(&self) -> Option<DeltaExtrema> {
        self.delta_extrema
    }

    /// Fold one bar's cumulative delta low/high into the phase extrema
    pub fn record_delta(&mut self, low: f64, high: f64) {
        self.delta_extrema = Some(DeltaExtrema::include(self.delta_extrema, low, high));
    }

    pub fn total_volume(&self) -> f64 {
        self.buckets.iter().map(Bucket::total).sum()
    }

    pub fn buy_volume(&self) -> f64 {
        self.buckets.iter().map(|b| b.buy).sum()
    }

    pub fn sell_volume(&self) -> f64 {
        self.buckets.iter().map(|b| b.sell).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_volume() <= 0.0
    }

    /// `[low, high)` price bounds of bucket `index`
    pub fn get_bucket_bounds(&self, index: usize) -> Option<(f64, f64)> {
        self.grid.and_then(|g| g.bounds(index))
    }

    /// Grid the profile would have after `ensure_range(low, high)`
    pub fn covering_grid(&self, low: f64, high: f64) -> BucketGrid {
        match self.grid {
            None => BucketGrid::new(low, high, self.bucket_count),
            Some(grid) if grid.contains_range(low, high) => grid,
            Some(grid) => BucketGrid::new(grid.low.min(low), grid.high.max(high), self.bucket_count),
        }
    }

    /// Widen the grid to cover `[low, high]`, redistributing existing volume proportionally
    pub fn ensure_range(&mut self, low: f64, high: f64) {
        match self.grid {
            None => {
                self.grid = Some(BucketGrid::new(low, high, self.bucket_count));
            }
            Some(grid) if grid.contains_range(low, high) => {}
            Some(grid) => {
                let target = self.covering_grid(low, high);
                self.buckets = rebin(&grid, &self.buckets, &target);
                self.grid = Some(target);
                debug!(
                    "Profile range widened to [{:.4}, {:.4}] over {} buckets",
                    target.low, target.high, target.count
                );
            }
        }
    }

    /// Change the bucket count, redistributing volume across the new boundaries
    pub fn resize_buckets(&mut self, count: usize) {
        let count = count.max(1);
        if count == self.bucket_count {
            return;
        }
        match self.grid {
            Some(grid) => {
                let target = BucketGrid::new(grid.low, grid.high, count);
                self.buckets = rebin(&grid, &self.buckets, &target);
                self.grid = Some(target);
            }
            None => {
                self.buckets = vec![Bucket::default(); count];
            }
        }
        debug!("Profile resized from {} to {} buckets", self.bucket_count, count);
        self.bucket_count = count;
    }

    /// Merge per-bucket buy/sell contributions laid out on `contribution.grid`.
    ///
    /// The profile range grows to include the contribution's range; contributions on a
    /// different grid are redistributed by price overlap before being added.
    pub fn merge(&mut self, contribution: &ProfileContribution) {
        if contribution.is_empty() {
            return;
        }

        let source = contribution.grid;
        self.ensure_range(source.low, source.high);
        let Some(grid) = self.grid else {
            return;
        };

        if grid == source && contribution.buckets.len() == self.buckets.len() {
            for (bucket, incoming) in self.buckets.iter_mut().zip(&contribution.buckets) {
                bucket.add(incoming);
            }
        } else {
            let rebinned = rebin(&source, &contribution.buckets, &grid);
            for (bucket, incoming) in self.buckets.iter_mut().zip(&rebinned) {
                bucket.add(incoming);
            }
        }

        self.bars_merged += 1;
    }

    /// Point of control: bucket with the greatest total volume, lowest price on ties
    pub fn get_poc(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, bucket) in self.buckets.iter().enumerate() {
            let volume = bucket.total();
            if volume <= 0.0 {
                continue;
            }
            match best {
                Some((_, best_volume)) if volume <= best_volume => {}
                _ => best = Some((index, volume)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Smallest contiguous range holding at least `pct` of volume, grown from the POC one
    /// bucket at a time toward the side with more volume (upward on ties)
    pub fn get_value_area(&self, pct: f64) -> Option<ValueArea> {
        let grid = self.grid?;
        let poc = self.get_poc()?;
        let total = self.total_volume();
        let target = total * pct.clamp(0.0, 1.0);
        let tolerance = VOLUME_EPSILON * total.max(1.0);
        let last = self.buckets.len() - 1;

        let (mut low, mut high) = (poc, poc);
        let mut volume = self.buckets[poc].total();

        while volume + tolerance < target {
            let up = (high < last).then(|| self.buckets[high + 1].total());
            let down = (low > 0).then(|| self.buckets[low - 1].total());
            match (up, down) {
                (Some(up_volume), Some(down_volume)) if up_volume >= down_volume => {
                    high += 1;
                    volume += up_volume;
                }
                (_, Some(down_volume)) => {
                    low -= 1;
                    volume += down_volume;
                }
                (Some(up_volume), None) => {
                    high += 1;
                    volume += up_volume;
                }
                (None, None) => break,
            }
        }

        let (low_price, _) = grid.bounds(low)?;
        let (_, high_price) = grid.bounds(high)?;
        Some(ValueArea {
            low_index: low,
            high_index: high,
            low: low_price,
            high: high_price,
            volume,
            volume_fraction: if total > 0.0 { volume / total } else { 0.0 },
        })
    }

    /// Volume-weighted mean of bucket midpoints
    pub fn get_vwap(&self) -> Option<f64> {
        let grid = self.grid?;
        let total = self.total_volume();
        if total <= 0.0 {
            return None;
        }
        let weighted: f64 = self
            .buckets
            .iter()
            .enumerate()
            .filter_map(|(i, b)| grid.midpoint(i).map(|mid| mid * b.total()))
            .sum();
        Some(weighted / total)
    }

    /// Volume-weighted standard deviation of bucket midpoints around the VWAP
    pub fn get_std_dev(&self) -> Option<f64> {
        let grid = self.grid?;
        let vwap = self.get_vwap()?;
        let total = self.total_volume();
        let variance: f64 = self
            .buckets
            .iter()
            .enumerate()
            .filter_map(|(i, b)| grid.midpoint(i).map(|mid| b.total() * (mid - vwap).powi(2)))
            .sum::<f64>()
            / total;
        Some(variance.max(0.0).sqrt())
    }

    /// POC/value-area/VWAP/dispersion view; `None` while the profile holds no volume
    pub fn snapshot(&self, value_area_pct: f64) -> Option<ProfileSnapshot> {
        let grid = self.grid?;
        let poc = grid.midpoint(self.get_poc()?)?;
        let value_area = self.get_value_area(value_area_pct)?;
        Some(ProfileSnapshot {
            poc,
            value_area_high: value_area.high,
            value_area_low: value_area.low,
            vwap: self.get_vwap()?,
            std_dev: self.get_std_dev()?,
        })
    }

    pub fn summary(&self, value_area_pct: f64) -> ProfileSummary {
        ProfileSummary {
            range_low: self.range_low().unwrap_or(0.0),
            range_high: self.range_high().unwrap_or(0.0),
            bucket_count: self.bucket_count,
            total_volume: self.total_volume(),
            buy_volume: self.buy_volume(),
            sell_volume: self.sell_volume(),
            snapshot: self.snapshot(value_area_pct),
            delta_extrema: self.delta_extrema,
        }
    }
}

/// Redistribute bucket volumes from `source` onto `target` in proportion to price overlap.
///
/// Every source bucket's volume lands somewhere on the target grid; buckets with no overlap
/// (degenerate grids) go to the target bucket containing their midpoint.
pub fn rebin(source: &BucketGrid, buckets: &[Bucket], target: &BucketGrid) -> Vec<Bucket> {
    let mut out = vec![Bucket::default(); target.count];

    for (index, bucket) in buckets.iter().enumerate() {
        if bucket.buy == 0.0 && bucket.sell == 0.0 {
            continue;
        }
        let Some((low, high)) = source.bounds(index) else {
            continue;
        };

        if high <= low || target.is_degenerate() {
            out[target.index_of((low + high) / 2.0)].add(bucket);
            continue;
        }

        let spans: Vec<(usize, f64)> = (target.index_of(low)..=target.index_of(high))
            .filter_map(|j| target.bounds(j).map(|(t_low, t_high)| (j, overlap(low, high, t_low, t_high))))
            .filter(|(_, width)| *width > 0.0)
            .collect();
        let covered: f64 = spans.iter().map(|(_, width)| width).sum();

        if covered <= 0.0 {
            out[target.index_of((low + high) / 2.0)].add(bucket);
            continue;
        }
        for (j, width) in spans {
            out[j].add(&bucket.scaled(width / covered));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution_at(grid: BucketGrid, entries: &[(usize, f64, f64)]) -> ProfileContribution {
        let mut contribution = ProfileContribution::empty(grid);
        for &(index, buy, sell) in entries {
            contribution.add(index, buy, sell);
        }
        contribution
    }

    #[test]
    fn test_new_profile_is_empty() {
        let profile = BucketedProfile::new(24);
        assert!(profile.is_empty());
        assert_eq!(profile.bucket_count(), 24);
        assert!(profile.grid().is_none());
        assert!(profile.get_poc().is_none());
        assert!(profile.snapshot(0.7).is_none());
    }

    #[test]
    fn test_merge_same_grid_adds_elementwise() {
        let grid = BucketGrid::new(100.0, 110.0, 10);
        let mut profile = BucketedProfile::new(10);
        profile.merge(&contribution_at(grid, &[(2, 100.0, 50.0)]));
        profile.merge(&contribution_at(grid, &[(2, 10.0, 0.0), (7, 0.0, 40.0)]));

        assert_eq!(profile.bars_merged(), 2);
        assert_eq!(profile.buckets()[2].buy, 110.0);
        assert_eq!(profile.buckets()[2].sell, 50.0);
        assert_eq!(profile.buckets()[7].sell, 40.0);
        assert!((profile.total_volume() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_volume_merge_is_noop() {
        let mut profile = BucketedProfile::new(10);
        profile.merge(&ProfileContribution::empty(BucketGrid::new(1.0, 2.0, 10)));
        assert!(profile.grid().is_none());
        assert_eq!(profile.bars_merged(), 0);
    }

    #[test]
    fn test_range_growth_conserves_volume() {
        let mut profile = BucketedProfile::new(10);
        profile.merge(&contribution_at(BucketGrid::new(100.0, 110.0, 10), &[(0, 100.0, 0.0), (9, 0.0, 300.0)]));
        profile.ensure_range(90.0, 130.0);

        let grid = profile.grid().unwrap();
        assert_eq!(grid.low, 90.0);
        assert_eq!(grid.high, 130.0);
        assert!((profile.total_volume() - 400.0).abs() < 1e-9);
        assert!((profile.buy_volume() - 100.0).abs() < 1e-9);
        assert!((profile.sell_volume() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_redistributes_proportionally() {
        let mut profile = BucketedProfile::from_bucket_volumes(0.0, 4.0, &[40.0, 0.0, 0.0, 80.0]);
        profile.resize_buckets(2);
        assert_eq!(profile.bucket_volumes(), vec![40.0, 80.0]);

        profile.resize_buckets(8);
        let volumes = profile.bucket_volumes();
        assert_eq!(volumes.len(), 8);
        assert!((volumes[0] - 10.0).abs() < 1e-9);
        assert!((volumes[7] - 20.0).abs() < 1e-9);
        assert!((profile.total_volume() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_profile_then_widen() {
        let mut profile = BucketedProfile::new(4);
        profile.merge(&contribution_at(BucketGrid::new(50.0, 50.0, 4), &[(0, 10.0, 0.0)]));
        assert_eq!(profile.range(), 0.0);

        profile.ensure_range(48.0, 52.0);
        assert!((profile.total_volume() - 10.0).abs() < 1e-9);
        // Single price 50.0 sits at the start of bucket 2 on [48, 52] with 4 buckets
        assert_eq!(profile.get_poc(), Some(2));
    }

    #[test]
    fn test_poc_tie_breaks_to_lowest_price() {
        let profile = BucketedProfile::from_bucket_volumes(0.0, 5.0, &[10.0, 50.0, 20.0, 50.0, 5.0]);
        assert_eq!(profile.get_poc(), Some(1));
    }

    #[test]
    fn test_value_area_grows_toward_larger_side() {
        let profile = BucketedProfile::from_bucket_volumes(
            0.0, 7.0, &[5.0, 10.0, 20.0, 40.0, 15.0, 5.0, 5.0],
        );
        // total 100, target 70: POC 40 -> +20 (down) -> +15 (up) = 75
        let va = profile.get_value_area(0.70).unwrap();
        assert_eq!((va.low_index, va.high_index), (2, 4));
        assert!((va.volume - 75.0).abs() < 1e-9);
        assert!((va.volume_fraction - 0.75).abs() < 1e-9);
        assert_eq!(va.low, 2.0);
        assert_eq!(va.high, 5.0);
    }

    #[test]
    fn test_value_area_prefers_upward_on_tie() {
        let profile = BucketedProfile::from_bucket_volumes(0.0, 3.0, &[10.0, 30.0, 10.0]);
        let va = profile.get_value_area(0.70).unwrap();
        assert_eq!((va.low_index, va.high_index), (1, 2));
    }

    #[test]
    fn test_value_area_full_profile() {
        let profile = BucketedProfile::from_bucket_volumes(0.0, 10.0, &[1000.0; 10]);
        let va = profile.get_value_area(1.0).unwrap();
        assert_eq!((va.low_index, va.high_index), (0, 9));
        assert!((va.volume_fraction - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vwap_and_std_dev() {
        let profile = BucketedProfile::from_bucket_volumes(0.0, 4.0, &[10.0, 0.0, 0.0, 10.0]);
        // midpoints 0.5 and 3.5
        assert!((profile.get_vwap().unwrap() - 2.0).abs() < 1e-12);
        assert!((profile.get_std_dev().unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_single_bucket() {
        let profile = BucketedProfile::from_bucket_volumes(100.0, 104.0, &[0.0, 500.0, 0.0, 0.0]);
        let snapshot = profile.snapshot(0.7).unwrap();
        assert_eq!(snapshot.poc, 101.5);
        assert_eq!(snapshot.value_area_low, 101.0);
        assert_eq!(snapshot.value_area_high, 102.0);
        assert_eq!(snapshot.vwap, 101.5);
        assert_eq!(snapshot.std_dev, 0.0);
    }

    #[test]
    fn test_summary_carries_delta_extrema() {
        let mut profile = BucketedProfile::from_bucket_volumes(0.0, 2.0, &[1.0, 2.0]);
        profile.record_delta(-10.0, 4.0);
        profile.record_delta(-3.0, 12.0);
        let summary = profile.summary(0.7);
        assert_eq!(summary.delta_extrema, Some(DeltaExtrema { min: -10.0, max: 12.0 }));
        assert_eq!(summary.bucket_count, 2);
        assert!((summary.total_volume - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_get_bucket_bounds_out_of_range() {
        let profile = BucketedProfile::from_bucket_volumes(0.0, 2.0, &[1.0, 2.0]);
        assert_eq!(profile.get_bucket_bounds(1), Some((1.0, 2.0)));
        assert_eq!(profile.get_bucket_bounds(2), None);
    }
}
