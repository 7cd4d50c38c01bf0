use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::errors::MarketDataError;
use super::structs::{Bar, TimestampMS};

/// One CSV row: `open_time,open,high,low,close,volume[,closed]`
#[derive(Debug, Deserialize)]
struct BarRow {
    open_time: TimestampMS,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    closed: Option<bool>,
}

impl From<BarRow> for Bar {
    fn from(row: BarRow) -> Self {
        let mut bar = Bar::new(row.open_time, row.open, row.high, row.low, row.close, row.volume);
        bar.is_closed = row.closed.unwrap_or(true);
        bar
    }
}

/// Read bars from any CSV source with a header row.
///
/// Rows that parse but fail [`Bar::validate`] are skipped with a warning; malformed or
/// out-of-order rows abort the read since the rest of the stream can no longer be trusted.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, MarketDataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars: Vec<Bar> = Vec::new();
    let mut skipped = 0usize;

    for (row_index, record) in csv_reader.deserialize::<BarRow>().enumerate() {
        let bar: Bar = record?.into();
        // Unclosed rows may repeat their open_time as intra-bar updates
        if let Some(previous) = bars.last() {
            let repeats_update = !previous.is_closed && bar.open_time == previous.open_time;
            if bar.open_time <= previous.open_time && !repeats_update {
                return Err(MarketDataError::Validation(format!(
                    "row {} open_time {} is not after previous bar {}",
                    row_index + 1,
                    bar.open_time,
                    previous.open_time
                )));
            }
        }
        match bar.validate() {
            Ok(()) => bars.push(bar),
            Err(reason) => {
                skipped += 1;
                warn!("Skipping CSV row {}: {}", row_index + 1, reason);
            }
        }
    }

    if bars.is_empty() {
        return Err(MarketDataError::NoData("CSV contained no valid bars".to_string()));
    }

    debug!("Parsed {} bars ({} rows skipped)", bars.len(), skipped);
    Ok(bars)
}

/// Load bars from a CSV file on disk
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, MarketDataError> {
    info!("📂 Loading bars from {}", path.display());
    let file = std::fs::File::open(path)?;
    let bars = read_bars(std::io::BufReader::new(file))?;
    info!("✅ Loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}
