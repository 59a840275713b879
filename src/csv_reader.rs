// CSV input and output for date-keyed datasets

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, WriterBuilder};
use indexmap::IndexMap;
use std::io::{self, Read, Write};

use crate::dataset::Dataset;

#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn read_csv_from_stdin() -> Result<CsvData> {
    read_csv(io::stdin())
}

pub fn read_csv<R: Read>(source: R) -> Result<CsvData> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(anyhow!("CSV must contain at least one data row"));
    }

    Ok(CsvData { headers, rows })
}

/// Parse a date key. Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` (optional fraction) and RFC 3339.
pub fn parse_date(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Convert raw CSV into a dataset. The first column is the date key, every
/// other column is a numeric series.
pub fn to_dataset(data: &CsvData) -> Result<Dataset> {
    if data.headers.len() < 2 {
        return Err(anyhow!(
            "CSV needs a date column and at least one series column (found {} columns)",
            data.headers.len()
        ));
    }

    let mut dates = Vec::with_capacity(data.rows.len());
    let mut columns: IndexMap<String, Vec<f64>> = IndexMap::new();
    for name in &data.headers[1..] {
        if columns.contains_key(name) {
            return Err(anyhow!("Duplicate series column '{}'", name));
        }
        columns.insert(name.clone(), Vec::with_capacity(data.rows.len()));
    }

    for (row_idx, row) in data.rows.iter().enumerate() {
        if row.len() != data.headers.len() {
            return Err(anyhow!(
                "Row {} has {} columns, expected {}",
                row_idx + 1,
                row.len(),
                data.headers.len()
            ));
        }

        let date = parse_date(&row[0]).ok_or_else(|| {
            anyhow!(
                "Failed to parse date '{}' in column '{}' at row {}",
                row[0],
                data.headers[0],
                row_idx + 1
            )
        })?;
        dates.push(date);

        for (value_str, (name, values)) in row[1..].iter().zip(columns.iter_mut()) {
            let value = value_str.parse::<f64>().with_context(|| {
                format!(
                    "Failed to parse value '{}' as number in column '{}' at row {}",
                    value_str,
                    name,
                    row_idx + 1
                )
            })?;
            values.push(value);
        }
    }

    Dataset::new(dates, columns).context("Invalid dataset")
}

/// Write a dataset back out as CSV with a leading `Date` column.
pub fn write_dataset<W: Write>(dataset: &Dataset, sink: W) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(sink);

    let names = dataset.series_names();
    let mut header = vec!["Date".to_string()];
    header.extend(names.iter().cloned());
    writer.write_record(&header).context("Failed to write CSV header")?;

    for (idx, date) in dataset.dates().iter().enumerate() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        for name in &names {
            let value = dataset.value(name, idx).unwrap_or(f64::NAN);
            record.push(value.to_string());
        }
        writer.write_record(&record).context("Failed to write CSV record")?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
