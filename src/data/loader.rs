use crate::data::table::{PriceTable, TimeTable};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    symbol: String,
    close: Option<f64>,
}

//accepts rfc3339 timestamps or plain yyyy-mm-dd dates (midnight utc)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .context(format!("Unrecognized timestamp '{}'", raw))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context(format!("Invalid date '{}'", raw))?;
    Ok(midnight.and_utc())
}

//loads a long-format price csv (timestamp,symbol,close) into a price table
pub fn load_prices_csv<P: AsRef<Path>>(path: P) -> Result<PriceTable> {
    let path = path.as_ref();
    info!("Loading prices from {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.context(format!("Failed to parse CSV record at line {}", index + 2))?;

        let timestamp = parse_timestamp(&record.timestamp).context(format!(
            "Failed to parse timestamp '{}' at line {}",
            record.timestamp,
            index + 2
        ))?;

        //empty close cells are missing observations, not errors
        match record.close {
            Some(close) if close.is_finite() => rows.push((timestamp, record.symbol, close)),
            _ => {
                debug!("No close for {} at line {}", record.symbol, index + 2);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a close price", skipped);
    }

    let table = TimeTable::from_long_rows(rows);
    info!(
        "Loaded {} timestamps x {} instruments",
        table.len(),
        table.width()
    );

    Ok(table)
}

//writes a table in wide format: timestamp column, then one column per instrument
pub fn write_table_csv<P: AsRef<Path>>(table: &TimeTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .context(format!("Failed to create CSV file: {:?}", path))?;

    let mut header = vec!["timestamp".to_string()];
    header.extend(table.ids().map(str::to_string));
    writer.write_record(&header)?;

    for (row, timestamp) in table.index().iter().enumerate() {
        let mut record = vec![timestamp.to_rfc3339()];
        record.extend(
            table
                .row(row)
                .into_iter()
                .map(|(_, value)| value.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
