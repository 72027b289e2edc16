use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use genotype_bitmap::config::EncoderConfig;
use genotype_bitmap::documents::{FileMetadata, VariantDocument};
use genotype_bitmap::io::{read_json, write_json, write_report_csv};
use genotype_bitmap::lookup::SampleCountLookup;
use genotype_bitmap::pipeline::{generate_report, run_batch};
use genotype_bitmap::{decode, encode, DefaultPolicy, EncodedBitmap, SampleSet};
use itertools::Itertools;
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Encode per-file genotype sample lists as nibble bitmaps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode the sample documents of a collection of variant documents
    EncodeBatch {
        /// JSON array of variant documents (.json or .json.gz)
        #[arg(short, long)]
        variants: PathBuf,

        /// JSON array of file metadata documents (.json or .json.gz)
        #[arg(short, long)]
        files: PathBuf,

        /// Directory for the encoded documents and the report
        #[arg(short, long, default_value = "encoded")]
        output_dir: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of threads to use
        #[arg(short, long)]
        threads: Option<usize>,

        /// Maximum variants per chromosome
        #[arg(long, conflicts_with = "no_limit")]
        limit: Option<usize>,

        /// Encode every matching variant
        #[arg(long)]
        no_limit: bool,

        /// Keep the raw "def" entry instead of encoding the default genotype
        #[arg(long)]
        omit_default: bool,

        /// Skip variants that fail to encode instead of aborting
        #[arg(long)]
        continue_on_error: bool,

        /// Write gzip-compressed JSON
        #[arg(long)]
        gzip: bool,
    },

    /// Encode a single sample set
    Encode {
        /// Number of samples in the file
        #[arg(short, long, allow_negative_numbers = true)]
        num_samples: i64,

        /// Comma-separated sample indices
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        samples: Vec<i64>,
    },

    /// Decode a single bitmap
    Decode {
        /// Number of samples in the file
        #[arg(short, long, allow_negative_numbers = true)]
        num_samples: i64,

        /// Bitmap as hex digits, one per nibble
        #[arg(long, conflicts_with = "nibbles", required_unless_present = "nibbles")]
        hex: Option<String>,

        /// Bitmap as comma-separated nibble values
        #[arg(long, value_delimiter = ',')]
        nibbles: Vec<u64>,
    },

    /// Print the chromosome ranges used for variant selection
    Ranges {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<EncoderConfig> {
    match path {
        Some(path) => EncoderConfig::from_json_file(path),
        None => Ok(EncoderConfig::default()),
    }
}

/// Main entry point for CLI
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::EncodeBatch {
            variants,
            files,
            output_dir,
            config,
            threads,
            limit,
            no_limit,
            omit_default,
            continue_on_error,
            gzip,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if no_limit {
                config.per_chromosome_limit = None;
            } else if limit.is_some() {
                config.per_chromosome_limit = limit;
            }
            if omit_default {
                config.default_policy = DefaultPolicy::Omit;
            }
            config.continue_on_error |= continue_on_error;
            info!("Configuration: {:?}", config);

            let file_docs: Vec<FileMetadata> = read_json(&files)?;
            let lookup = SampleCountLookup::from_file_docs(&file_docs);
            info!("Loaded metadata for {} files", lookup.len());

            let variant_docs: Vec<VariantDocument> = read_json(&variants)?;
            info!("Loaded {} variant documents", variant_docs.len());

            let output = run_batch(&variant_docs, &lookup, &config)?;

            fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            let extension = if gzip { "json.gz" } else { "json" };
            write_json(
                &output.unencoded,
                &output_dir.join(format!("sample_unenc.{}", extension)),
            )?;
            write_json(
                &output.encoded,
                &output_dir.join(format!("sample_enc.{}", extension)),
            )?;
            write_report_csv(&output.report, &output_dir.join("report.csv"))?;
            info!("Wrote results to {}", output_dir.display());

            println!("{}", generate_report(&output.report));
            Ok(())
        }
        Commands::Encode {
            num_samples,
            samples,
        } => {
            let samples: SampleSet = samples.into_iter().collect();
            let bitmap = encode(&samples, num_samples)?;
            println!("nibbles: {}", serde_json::to_string(&bitmap)?);
            println!("hex:     {}", bitmap);
            Ok(())
        }
        Commands::Decode {
            num_samples,
            hex,
            nibbles,
        } => {
            let bitmap = match hex {
                Some(hex) => EncodedBitmap::from_hex(&hex)?,
                None if !nibbles.is_empty() => EncodedBitmap::from_nibbles(nibbles)?,
                None => bail!("one of --hex or --nibbles is required"),
            };
            let samples = decode(&bitmap, num_samples)?;
            println!("{}", samples.iter().join(","));
            Ok(())
        }
        Commands::Ranges { config } => {
            let config = load_config(config.as_ref())?;
            println!("{:<6} {:>12} {:>12} {:>12}", "chr", "minStart", "maxStart", "numEntries");
            for range in &config.chromosome_ranges {
                println!(
                    "{:<6} {:>12} {:>12} {:>12}",
                    range.id, range.min_start, range.max_start, range.num_entries
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_encode_batch_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let variants = dir.path().join("variants.json");
        let files = dir.path().join("files.json");
        fs::write(
            &variants,
            r#"[{"chr": "1", "start": 20000, "files": [{"fid": "f1", "sid": "s1", "samp": {"def": "0|0", "0|1": [4, 5]}}]}]"#,
        )
        .unwrap();
        fs::write(
            &files,
            r#"[{"fid": "f1", "sid": "s1", "st": {"nSamp": 6}, "samp": {}}]"#,
        )
        .unwrap();
        let output_dir = dir.path().join("out");

        let cli = Cli::try_parse_from([
            "genotype-bitmap",
            "encode-batch",
            "--variants",
            variants.to_str().unwrap(),
            "--files",
            files.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
            "--threads",
            "1",
        ])
        .unwrap();
        run_cli(cli).unwrap();

        let encoded: serde_json::Value = read_json(&output_dir.join("sample_enc.json")).unwrap();
        assert_eq!(
            encoded[0]["files"][0]["samp"],
            serde_json::json!({"0|1": [0, 12], "0|0": [15, 0]})
        );
        assert!(output_dir.join("sample_unenc.json").exists());
        assert!(output_dir.join("report.csv").exists());
    }

    #[test]
    fn test_encode_batch_continues_past_malformed_sample_doc() {
        let dir = tempfile::tempdir().unwrap();
        let variants = dir.path().join("variants.json");
        let files = dir.path().join("files.json");
        fs::write(
            &variants,
            r#"[
                {"chr": "1", "start": 20000, "files": [{"fid": "f1", "sid": "s1", "samp": {"0|1": [4, 5]}}]},
                {"chr": "1", "start": 20001, "files": [{"fid": "f1", "sid": "s1", "samp": {"def": 5}}]},
                {"chr": "1", "start": 20002, "files": [{"fid": "f1", "sid": "s1", "samp": {"0|1": null}}]}
            ]"#,
        )
        .unwrap();
        fs::write(
            &files,
            r#"[{"fid": "f1", "sid": "s1", "st": {"nSamp": 6}, "samp": {}}]"#,
        )
        .unwrap();
        let output_dir = dir.path().join("out");

        let cli = Cli::try_parse_from([
            "genotype-bitmap",
            "encode-batch",
            "--variants",
            variants.to_str().unwrap(),
            "--files",
            files.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
            "--threads",
            "1",
            "--continue-on-error",
        ])
        .unwrap();
        run_cli(cli).unwrap();

        let encoded: Vec<serde_json::Value> =
            read_json(&output_dir.join("sample_enc.json")).unwrap();
        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0]["start"], 20000);
    }
}
