pub mod batch;
pub mod report;

pub use batch::{encode_variant, run_batch, select_variants, BatchError, BatchOutput};
pub use report::{generate_report, BatchReport, ChromosomeSummary, FileTally};
