/// Default values shared by configuration and engine components
// Profile layout
pub const DEFAULT_BUCKET_COUNT: usize = 24;
pub const DEFAULT_MIN_BUCKETS: usize = 8;
pub const DEFAULT_MAX_BUCKETS: usize = 96;
pub const DEFAULT_VALUE_AREA_PCT: f64 = 0.70;

// PDF allocation
pub const DEFAULT_QUADRATURE_STEPS: usize = 20;
pub const DEFAULT_PDF_SCALE: f64 = 0.25;
pub const DEFAULT_PDF_TAIL_WEIGHT: f64 = 1.0;
pub const DEFAULT_PDF_SKEW_GAIN: f64 = 1.5;

// Dynamic buy/sell split
pub const DEFAULT_SPLIT_TREND_PERIOD: u32 = 14;
pub const SPLIT_BODY_WEIGHT: f64 = 0.5;
pub const SPLIT_WICK_WEIGHT: f64 = 0.3;
pub const SPLIT_TREND_WEIGHT: f64 = 0.2;

// Anchor detection
pub const DEFAULT_PIVOT_LEFT_BARS: usize = 5;
pub const DEFAULT_PIVOT_RIGHT_BARS: usize = 5;

// Peak zones
pub const DEFAULT_PEAK_THRESHOLD_PCT: f64 = 0.50;
pub const MIN_PEAK_THRESHOLD_PCT: f64 = 0.10;
pub const MAX_PEAK_THRESHOLD_PCT: f64 = 0.90;

// History and rendering
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
pub const DEFAULT_RENDER_LOOKBACK: u64 = 1000;
pub const DEFAULT_MAX_LOOKBACK: u64 = 5000;
pub const DEFAULT_SAFETY_MARGIN: u64 = 100;

// Float comparisons
pub const VOLUME_EPSILON: f64 = 1e-9;
