//! Batch driver: selects variants per chromosome range and encodes the
//! sample documents of every (variant, file) pair.
//!
//! Lookup data is passed in by shared reference and never mutated, so each
//! variant is encoded independently and variants run in parallel.

use crate::bitmap::SampleUniverse;
use crate::config::EncoderConfig;
use crate::documents::{EncodedVariant, FileEntry, FileSamples, VariantDocument};
use crate::error::BitmapError;
use crate::genotype::{encode_sample_doc, DefaultPolicy};
use crate::lookup::{ChromosomeRange, FileSampleCount, SampleCountLookup};
use crate::pipeline::report::{BatchReport, ChromosomeSummary, FileTally};
use crate::utils::{parallel_process, ParallelError};
use log::{debug, info, warn};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Variant {variant}, file {file}: {source}")]
    Encoding {
        variant: String,
        file: String,
        #[source]
        source: BitmapError,
    },

    #[error("Variant {variant}: no file metadata for fid={fid}, sid={sid}")]
    UnknownFile {
        variant: String,
        fid: String,
        sid: String,
    },

    #[error("Parallel processing error: {0}")]
    Parallel(#[from] ParallelError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Documents produced by [`run_batch`]. `unencoded[i]` is the input of `encoded[i]`.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub unencoded: Vec<VariantDocument>,
    pub encoded: Vec<EncodedVariant>,
    pub report: BatchReport,
}

/// Variants of `range`'s chromosome whose start lies within the range and
/// that carry at least one sample document, in input order.
pub fn select_variants<'a>(
    variants: &'a [VariantDocument],
    range: &ChromosomeRange,
    limit: Option<usize>,
) -> Vec<&'a VariantDocument> {
    variants
        .iter()
        .filter(|doc| range.contains(&doc.chromosome, doc.start) && doc.has_samples())
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

fn passthrough(file: &FileEntry) -> FileEntry<FileSamples> {
    FileEntry {
        fid: file.fid.clone(),
        sid: file.sid.clone(),
        samp: file.samp.clone().map(FileSamples::Raw),
        extra: file.extra.clone(),
    }
}

/// Encodes one file entry. Returns `None` when the entry cannot be encoded
/// and is passed through unchanged.
fn encode_file(
    variant: &VariantDocument,
    file: &FileEntry,
    lookup: &SampleCountLookup,
    policy: DefaultPolicy,
) -> Result<Option<FileEntry<FileSamples>>, BatchError> {
    let Some((fid, sid)) = file.file_key() else {
        return Ok(None);
    };
    let Some(samples) = &file.samp else {
        return Ok(None);
    };

    let num_samples = match lookup.get(fid, sid) {
        Some(FileSampleCount::Known(n)) => n,
        Some(FileSampleCount::Unavailable) => {
            debug!("{}: file {}/{} has no sample count", variant.display_id(), fid, sid);
            return Ok(None);
        }
        None => {
            return Err(BatchError::UnknownFile {
                variant: variant.display_id(),
                fid: fid.to_string(),
                sid: sid.to_string(),
            })
        }
    };

    let encoded = SampleUniverse::new(num_samples)
        .and_then(|universe| encode_sample_doc(samples, universe, policy))
        .map_err(|source| BatchError::Encoding {
            variant: variant.display_id(),
            file: format!("{}/{}", fid, sid),
            source,
        })?;

    Ok(Some(FileEntry {
        fid: file.fid.clone(),
        sid: file.sid.clone(),
        samp: Some(FileSamples::Encoded(encoded)),
        extra: file.extra.clone(),
    }))
}

/// Builds the encoded form of `variant`, leaving the input untouched.
pub fn encode_variant(
    variant: &VariantDocument,
    lookup: &SampleCountLookup,
    policy: DefaultPolicy,
) -> Result<(EncodedVariant, FileTally), BatchError> {
    let mut tally = FileTally::default();
    let mut files = Vec::with_capacity(variant.files.len());

    for file in &variant.files {
        match encode_file(variant, file, lookup, policy)? {
            Some(encoded) => {
                tally.encoded += 1;
                files.push(encoded);
            }
            None => {
                tally.skipped += 1;
                files.push(passthrough(file));
            }
        }
    }

    let encoded = VariantDocument {
        chromosome: variant.chromosome.clone(),
        start: variant.start,
        files,
        extra: variant.extra.clone(),
    };
    Ok((encoded, tally))
}

/// Encodes the selected variants of every configured chromosome range.
pub fn run_batch(
    variants: &[VariantDocument],
    lookup: &SampleCountLookup,
    config: &EncoderConfig,
) -> Result<BatchOutput, BatchError> {
    config.validate()?;
    let parallel = config.parallel_config();
    let policy = config.default_policy;
    let batch_start = Instant::now();
    let mut output = BatchOutput::default();

    info!(
        "Encoding {} variants against {} file entries over {} chromosome ranges",
        variants.len(),
        lookup.len(),
        config.chromosome_ranges.len()
    );

    for range in &config.chromosome_ranges {
        let range_start = Instant::now();
        let selected = select_variants(variants, range, config.per_chromosome_limit);
        debug!(
            "chr{} [{}, {}]: {} variants selected",
            range.id,
            range.min_start,
            range.max_start,
            selected.len()
        );

        let results = parallel_process(
            &selected,
            |variant| encode_variant(variant, lookup, policy),
            &parallel,
        )?;

        let mut summary = ChromosomeSummary::new(&range.id, selected.len());
        for (variant, result) in selected.iter().zip(results) {
            match result {
                Some((encoded, tally)) => {
                    summary.record(tally);
                    output.unencoded.push((*variant).clone());
                    output.encoded.push(encoded);
                }
                None => summary.failed += 1,
            }
        }
        summary.elapsed_seconds = range_start.elapsed().as_secs_f64();

        if summary.failed > 0 {
            warn!(
                "chr{}: {} of {} variants failed to encode",
                range.id, summary.failed, summary.selected
            );
        }
        output.report.chromosomes.push(summary);
    }

    output.report.elapsed_seconds = batch_start.elapsed().as_secs_f64();
    info!(
        "Encoded {} of {} selected variants in {:.2}s",
        output.report.total_encoded(),
        output.report.total_selected(),
        output.report.elapsed_seconds
    );
    Ok(output)
}
