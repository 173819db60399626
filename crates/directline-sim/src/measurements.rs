//! Measurement file reader
//!
//! Expects a `;`-separated file with a header row. Column `PV` holds the
//! surplus generation, columns `V1`..`Vn` the consumption of each consumer.
//! Other columns (such as an exported index) are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Generation and consumption per tick
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries {
    /// Consumer column names in consumer index order
    pub labels: Vec<String>,
    /// Generation per row
    pub generation: Vec<f64>,
    /// Consumption per row, one value per consumer
    pub consumption: Vec<Vec<f64>>,
}

impl MeasurementSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.generation.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.generation.is_empty()
    }

    #[inline]
    pub fn consumer_count(&self) -> usize {
        self.labels.len()
    }
}

/// Read a measurement file from disk
pub fn load(path: &Path) -> Result<MeasurementSeries> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read(file).with_context(|| format!("reading {}", path.display()))
}

/// Read measurements from any reader
pub fn read<R: Read>(reader: R) -> Result<MeasurementSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let pv_column = headers
        .iter()
        .position(|h| h == "PV")
        .context("missing PV column")?;

    let mut consumer_columns: Vec<(u32, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(col, h)| {
            h.strip_prefix('V')
                .and_then(|n| n.parse::<u32>().ok())
                .map(|n| (n, col))
        })
        .collect();
    if consumer_columns.is_empty() {
        bail!("no consumer columns (V1..Vn) found");
    }
    consumer_columns.sort_unstable();

    let labels = consumer_columns
        .iter()
        .map(|&(_, col)| headers[col].to_string())
        .collect();

    let mut generation = Vec::new();
    let mut consumption = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("row {}", row + 1))?;
        generation.push(parse_field(&record, pv_column, row)?);
        let values = consumer_columns
            .iter()
            .map(|&(_, col)| parse_field(&record, col, row))
            .collect::<Result<Vec<f64>>>()?;
        consumption.push(values);
    }

    Ok(MeasurementSeries {
        labels,
        generation,
        consumption,
    })
}

fn parse_field(record: &csv::StringRecord, col: usize, row: usize) -> Result<f64> {
    let raw = record
        .get(col)
        .with_context(|| format!("row {}: missing column {}", row + 1, col))?;
    raw.parse::<f64>()
        .with_context(|| format!("row {}: invalid number {:?}", row + 1, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_columns_in_consumer_order() {
        let data = "idx;V2;PV;V1\n0;1.5;10;2.0\n1;0;3.25;4\n";
        let series = read(data.as_bytes()).unwrap();

        assert_eq!(series.labels, vec!["V1", "V2"]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.generation, vec![10.0, 3.25]);
        assert_eq!(series.consumption, vec![vec![2.0, 1.5], vec![4.0, 0.0]]);
    }

    #[test]
    fn test_missing_pv_column() {
        let err = read("V1;V2\n1;2\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("PV"));
    }

    #[test]
    fn test_invalid_number() {
        let err = read("PV;V1\n1;abc\n".as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("abc"));
    }
}
