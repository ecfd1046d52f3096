use crate::core::models::histogram::{Histogram, HistogramSet};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistogramWriteError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct BinRow<'a> {
    name: &'a str,
    bin: usize,
    low: f64,
    high: f64,
    content: f64,
    sumw2: f64,
}

/// Writes every histogram of `set` as CSV rows `name,bin,low,high,content,sumw2`.
///
/// Bins are numbered from `1`; bin `0` holds the underflow and bin `n + 1`
/// the overflow, whose open edges are written as `-inf` / `inf`. Flow bins do
/// not track squared weights and report `0`.
pub fn write_csv<W: Write>(set: &HistogramSet, writer: W) -> Result<(), HistogramWriteError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for histogram in set.iter() {
        for row in rows(histogram) {
            csv_writer.serialize(row)?;
        }
    }
    csv_writer.flush().map_err(|e| HistogramWriteError::Csv(e.into()))?;
    Ok(())
}

/// Writes `set` to `path`, creating or truncating the file.
pub fn write_to_path(set: &HistogramSet, path: &Path) -> Result<(), HistogramWriteError> {
    let file = File::create(path).map_err(|e| HistogramWriteError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_csv(set, file)
}

fn rows(histogram: &Histogram) -> impl Iterator<Item = BinRow<'_>> {
    let binning = histogram.binning;
    let n = binning.n_bins;
    let name = histogram.name.as_str();

    let underflow = BinRow {
        name,
        bin: 0,
        low: f64::NEG_INFINITY,
        high: binning.low,
        content: histogram.underflow,
        sumw2: 0.0,
    };
    let overflow = BinRow {
        name,
        bin: n + 1,
        low: binning.high,
        high: f64::INFINITY,
        content: histogram.overflow,
        sumw2: 0.0,
    };
    let bins = (0..n).map(move |i| {
        let (low, high) = binning.edges(i);
        BinRow {
            name,
            bin: i + 1,
            low,
            high,
            content: histogram.contents[i],
            sumw2: histogram.sumw2[i],
        }
    });

    std::iter::once(underflow)
        .chain(bins)
        .chain(std::iter::once(overflow))
}
