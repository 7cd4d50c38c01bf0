use anchored_profile::accumulator::LiveProfile;
use anchored_profile::history::RenderableRecord;
use anchored_profile::logging::{init_logging, LoggingConfig};
use anchored_profile::market_data::load_bars_from_csv;
use anchored_profile::pipeline::{ProfileEngine, ProfilerConfig};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Input configuration from config.toml
#[derive(Debug, Clone, Deserialize)]
struct InputConfig {
    pub bars_csv: PathBuf,
}

/// Top-level layout of config.toml
#[derive(Debug, Clone, Deserialize)]
struct TomlConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub profiler: ProfilerConfig,
}

impl TomlConfig {
    /// Load configuration from a TOML file
    fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config_content = std::fs::read_to_string(path)?;
        let toml_config: TomlConfig = toml::from_str(&config_content)?;
        Ok(toml_config)
    }
}

/// Final document printed after the last bar
#[derive(Debug, Serialize)]
struct RunReport {
    bars_processed: u64,
    bars_skipped: u64,
    records_retained: usize,
    developing: LiveProfile,
    render: Vec<RenderableRecord>,
}

fn run(config: TomlConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bars = load_bars_from_csv(&config.input.bars_csv)?;
    if let (Some(first), Some(last)) = (
        bars.first().and_then(|b| b.open_datetime()),
        bars.last().and_then(|b| b.open_datetime()),
    ) {
        info!("📅 Bar span: {} → {}", first, last);
    }

    let mut engine = ProfileEngine::new(config.profiler)?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for bar in &bars {
        let Some(output) = engine.evaluate(bar) else {
            continue;
        };
        if let Some(record) = &output.finalized {
            debug!("Finalized bars {}..={} ({} bars)", record.start_bar, record.end_bar, record.bar_count());
            serde_json::to_writer(&mut out, record)?;
            writeln!(out)?;
        }
    }

    let report = RunReport {
        bars_processed: engine.bar_count(),
        bars_skipped: engine.bars_skipped(),
        records_retained: engine.history().len(),
        developing: engine.live_profile(),
        render: engine.render(),
    };
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    out.flush()?;

    info!(
        bars = report.bars_processed,
        skipped = report.bars_skipped,
        records = report.records_retained,
        rendered = report.render.len(),
        "✅ Run complete"
    );
    Ok(())
}

fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());

    let config = match TomlConfig::from_toml(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(config.logging.clone()) {
        eprintln!("⚠️ Failed to initialize logging: {}", e);
    }

    if config.profiler.dynamic_bucket_sizing && config.profiler.reference_range.is_none() {
        warn!("Dynamic bucket sizing without reference_range: the first profile keeps its base bucket count");
    }

    info!("🚀 Starting anchored profile run from {}", config_path);
    if let Err(e) = run(config) {
        error!("❌ Run failed: {}", e);
        std::process::exit(1);
    }
}
