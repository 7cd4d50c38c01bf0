use serde::{Deserialize, Serialize};

/// Volume allocation methods for bar data
///
/// - Classic: all bar volume lands in the bucket containing the close
/// - Pdf: volume follows a skewed density integrated over every spanned bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AllocationModel {
    /// Assign all volume to the closing price bucket.
    ///
    /// Sub-bar samples carry no close, so in this mode each sample is spread uniformly
    /// over its own range instead.
    #[default]
    Classic,
    /// Distribute volume over the bar range with a four-parameter sinh-arcsinh density
    /// (location, scale, skew, tail weight) integrated per bucket.
    Pdf,
}

/// Buy/sell split estimation for bars without intra-bar order flow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SplitModel {
    /// Candle colour decides: close >= open is all buy, otherwise all sell
    #[default]
    Classic,
    /// Continuous estimate from body direction, wick asymmetry and short-term trend
    Dynamic,
}

/// Buy and sell volume held by one price bucket
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bucket {
    pub buy: f64,
    pub sell: f64,
}

impl Bucket {
    pub fn total(&self) -> f64 {
        self.buy + self.sell
    }

    pub fn delta(&self) -> f64 {
        self.buy - self.sell
    }

    pub fn add(&mut self, other: &Bucket) {
        self.buy += other.buy;
        self.sell += other.sell;
    }

    pub fn scaled(&self, factor: f64) -> Bucket {
        Bucket {
            buy: self.buy * factor,
            sell: self.sell * factor,
        }
    }
}

/// Even partition of `[low, high]` into `count` buckets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketGrid {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

impl BucketGrid {
    pub fn new(low: f64, high: f64, count: usize) -> Self {
        Self {
            low,
            high,
            count: count.max(1),
        }
    }

    /// Bucket width; zero for a degenerate single-price grid
    pub fn step(&self) -> f64 {
        ((self.high - self.low) / self.count as f64).max(0.0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.step() <= 0.0
    }

    /// Bucket containing `price`; the top edge belongs to the last bucket
    pub fn index_of(&self, price: f64) -> usize {
        let step = self.step();
        if step <= 0.0 {
            return 0;
        }
        let raw = ((price - self.low) / step).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.count - 1)
        }
    }

    /// `[low, high)` price bounds of bucket `index`
    pub fn bounds(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.count {
            return None;
        }
        let step = self.step();
        let low = self.low + index as f64 * step;
        let high = if index + 1 == self.count {
            self.high
        } else {
            self.low + (index + 1) as f64 * step
        };
        Some((low, high))
    }

    pub fn midpoint(&self, index: usize) -> Option<f64> {
        self.bounds(index).map(|(low, high)| (low + high) / 2.0)
    }

    pub fn contains_range(&self, low: f64, high: f64) -> bool {
        low >= self.low && high <= self.high
    }
}

/// Per-bucket buy/sell volume produced by the allocator on a given grid
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileContribution {
    pub grid: BucketGrid,
    pub buckets: Vec<Bucket>,
}

impl ProfileContribution {
    pub fn empty(grid: BucketGrid) -> Self {
        Self {
            grid,
            buckets: vec![Bucket::default(); grid.count],
        }
    }

    pub fn total_volume(&self) -> f64 {
        self.buckets.iter().map(Bucket::total).sum()
    }

    pub fn delta(&self) -> f64 {
        self.buckets.iter().map(Bucket::delta).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_volume() <= 0.0
    }

    /// Add `weight`-scaled buy/sell volume to a bucket
    pub fn add(&mut self, index: usize, buy: f64, sell: f64) {
        if let Some(bucket) = self.buckets.get_mut(index) {
            bucket.buy += buy;
            bucket.sell += sell;
        }
    }
}

/// Value area as an inclusive bucket range plus its price bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    pub low_index: usize,
    pub high_index: usize,
    /// Lower bound of the lowest bucket in the area
    pub low: f64,
    /// Upper bound of the highest bucket in the area
    pub high: f64,
    /// Total volume within value area
    pub volume: f64,
    /// Fraction of profile volume inside the area (0..=1)
    pub volume_fraction: f64,
}

/// Contiguous run of buckets at or above the peak threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakZone {
    pub start_row: usize,
    pub end_row: usize,
}

/// Peak zone resolved to absolute prices, stable across later bucket changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakRange {
    pub low: f64,
    pub high: f64,
}

/// Min/max cumulative delta observed during a profile's phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaExtrema {
    pub min: f64,
    pub max: f64,
}

impl DeltaExtrema {
    pub fn include(current: Option<DeltaExtrema>, low: f64, high: f64) -> DeltaExtrema {
        match current {
            Some(extrema) => DeltaExtrema {
                min: extrema.min.min(low),
                max: extrema.max.max(high),
            },
            None => DeltaExtrema { min: low, max: high },
        }
    }
}

/// Per-bar statistics of the developing profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Midpoint price of the point-of-control bucket
    pub poc: f64,
    pub value_area_high: f64,
    pub value_area_low: f64,
    pub vwap: f64,
    pub std_dev: f64,
}

/// Statistics frozen into a historical record at finalize
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub range_low: f64,
    pub range_high: f64,
    pub bucket_count: usize,
    pub total_volume: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub snapshot: Option<ProfileSnapshot>,
    pub delta_extrema: Option<DeltaExtrema>,
}
