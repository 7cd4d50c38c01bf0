/// Market Data Module
///
/// Bar and sub-bar sample types consumed by the profile engine, the per-bar price/delta
/// views handed to anchor detection, and a CSV loader for offline runs.
pub mod errors;
pub mod loader;
pub mod structs;

pub use errors::MarketDataError;
pub use loader::{load_bars_from_csv, read_bars};
pub use structs::{Bar, DeltaInfo, PriceInfo, SubBarSample, TimestampMS};
