//! Bar loading for the runner.
//!
//! Two sources:
//! 1. A date-indexed CSV file. The first column is the timestamp whatever its
//!    header; the remaining headers are matched case-insensitively and must
//!    include `open,high,low,close,volume`. Extra columns are ignored.
//! 2. `--synthetic`: a deterministic random walk seeded from the symbol.
//!    Synthetic data is a developer-only mode and is tagged in every result.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use stratlab_core::domain::Bar;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("row {row}: cannot parse timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: cannot parse {column} value '{value}'")]
    BadValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: timestamp is not after the previous row")]
    Unordered { row: usize },

    #[error("no bars in {source_name}")]
    Empty { source_name: String },
}

/// Where a bar series came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic,
}

/// Bars for one symbol plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over every bar field, for result fingerprints.
    pub dataset_hash: String,
}

impl LoadedData {
    pub fn from_bars(symbol: impl Into<String>, bars: Vec<Bar>, source: DataSource) -> Self {
        let dataset_hash = dataset_hash(&bars);
        Self {
            symbol: symbol.into(),
            bars,
            source,
            dataset_hash,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

const REQUIRED: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Load a CSV file of bars for `symbol`.
pub fn load_csv(path: &Path, symbol: &str) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = parse_csv(file).map_err(|err| match err {
        LoadError::Empty { .. } => LoadError::Empty {
            source_name: path.display().to_string(),
        },
        other => other,
    })?;
    info!(symbol, path = %path.display(), bars = bars.len(), "loaded bars from csv");
    Ok(LoadedData::from_bars(symbol, bars, DataSource::Csv(path.to_path_buf())))
}

/// Parse bars from any CSV reader. Row numbers in errors are 1-based data rows.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let mut columns = [0usize; 5];
    for (slot, name) in columns.iter_mut().zip(REQUIRED) {
        *slot = headers
            .iter()
            .skip(1)
            .position(|h| h == name)
            .map(|p| p + 1)
            .ok_or_else(|| LoadError::MissingColumn {
                column: name.to_string(),
            })?;
    }

    let mut bars: Vec<Bar> = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let raw_ts = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;

        let mut values = [0.0f64; 5];
        for ((value, &col), name) in values.iter_mut().zip(&columns).zip(REQUIRED) {
            let raw = record.get(col).unwrap_or_default();
            *value = raw.parse::<f64>().map_err(|_| LoadError::BadValue {
                row,
                column: name.to_string(),
                value: raw.to_string(),
            })?;
        }

        if bars.last().is_some_and(|prev| timestamp <= prev.timestamp) {
            return Err(LoadError::Unordered { row });
        }
        let [open, high, low, close, volume] = values;
        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            source_name: "csv input".into(),
        });
    }
    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        warn!(insane, "bars with inconsistent OHLC values");
    }
    Ok(bars)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    const DATE: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
    DATETIME
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE.iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Compute a deterministic BLAKE3 hash over all bar data.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `count` weekday bars of a random walk from 100.0, seeded from
/// the symbol so the same symbol always yields the same series.
pub fn synthetic_bars(symbol: &str, start: NaiveDate, count: usize) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut current = start;

    while bars.len() < count {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        if let Some(timestamp) = current.and_hms_opt(0, 0, 0) {
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Synthetic bars wrapped with provenance.
pub fn load_synthetic(symbol: &str, start: NaiveDate, count: usize) -> LoadedData {
    warn!(symbol, "generating synthetic data; results will be tagged as synthetic");
    LoadedData::from_bars(symbol, synthetic_bars(symbol, start, count), DataSource::Synthetic)
}
