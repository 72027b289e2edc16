use serde::{Deserialize, Serialize};

/// What happened to the file entries of one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTally {
    pub encoded: usize,
    pub skipped: usize,
}

/// Batch counters for one chromosome range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeSummary {
    pub chromosome: String,
    pub selected: usize,
    pub encoded: usize,
    pub failed: usize,
    pub files_encoded: usize,
    pub files_skipped: usize,
    pub elapsed_seconds: f64,
}

impl ChromosomeSummary {
    pub fn new(chromosome: &str, selected: usize) -> Self {
        ChromosomeSummary {
            chromosome: chromosome.to_string(),
            selected,
            encoded: 0,
            failed: 0,
            files_encoded: 0,
            files_skipped: 0,
            elapsed_seconds: 0.0,
        }
    }

    pub fn record(&mut self, tally: FileTally) {
        self.encoded += 1;
        self.files_encoded += tally.encoded;
        self.files_skipped += tally.skipped;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub chromosomes: Vec<ChromosomeSummary>,
    pub elapsed_seconds: f64,
}

impl BatchReport {
    pub fn total_selected(&self) -> usize {
        self.chromosomes.iter().map(|c| c.selected).sum()
    }

    pub fn total_encoded(&self) -> usize {
        self.chromosomes.iter().map(|c| c.encoded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.chromosomes.iter().map(|c| c.failed).sum()
    }
}

/// Generate a plain-text summary of a batch
pub fn generate_report(report: &BatchReport) -> String {
    let mut text = String::new();

    text.push_str("Genotype Bitmap Encoding Report\n");
    text.push_str("===============================\n");
    text.push_str(&format!(
        "Variants: {} selected, {} encoded, {} failed\n",
        report.total_selected(),
        report.total_encoded(),
        report.total_failed()
    ));
    text.push_str(&format!("Elapsed: {:.2} seconds\n\n", report.elapsed_seconds));

    for summary in report.chromosomes.iter().filter(|c| c.selected > 0) {
        text.push_str(&format!(
            "chr{:<3} {:>6} encoded {:>4} failed {:>7} files ({} skipped) in {:.3}s\n",
            summary.chromosome,
            summary.encoded,
            summary.failed,
            summary.files_encoded,
            summary.files_skipped,
            summary.elapsed_seconds
        ));
    }

    text
}
