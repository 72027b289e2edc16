//! Input/Output operations module.
//!
//! Reads variant and file metadata documents (JSON, optionally gzip
//! compressed) and writes encoded documents and batch reports.

use crate::pipeline::BatchReport;
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Opens `path` for reading, decompressing `.gz` files transparently.
pub fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    if is_gzip(path) {
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Reads one JSON value (typically an array of documents) from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = open_reader(path)?;
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

/// Writes `value` as pretty-printed JSON to `path`, gzip compressed when the
/// path ends in `.gz`. The gzip trailer is written before returning.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    if is_gzip(path) {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer_pretty(&mut encoder, value)
            .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
        writer = encoder
            .finish()
            .with_context(|| format!("Failed to finish gzip stream {}", path.display()))?;
    } else {
        serde_json::to_writer_pretty(&mut writer, value)
            .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Writes the per-chromosome batch summary as CSV.
pub fn write_report_csv(report: &BatchReport, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer.write_record([
        "chromosome",
        "selected",
        "encoded",
        "failed",
        "files_encoded",
        "files_skipped",
        "elapsed_seconds",
    ])?;

    for summary in &report.chromosomes {
        writer.write_record(&[
            summary.chromosome.clone(),
            summary.selected.to_string(),
            summary.encoded.to_string(),
            summary.failed.to_string(),
            summary.files_encoded.to_string(),
            summary.files_skipped.to_string(),
            format!("{:.6}", summary.elapsed_seconds),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
