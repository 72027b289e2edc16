//! Error types for the bitmap codec and genotype resolution.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitmapError {
    #[error("Invalid sample count: {0} (must be >= 0)")]
    InvalidSampleCount(i64),

    #[error("Sample index {index} outside [0, {num_samples})")]
    InvalidRange { index: i64, num_samples: usize },

    #[error("Malformed bitmap: {0}")]
    MalformedBitmap(String),

    #[error("Invalid nibble value {value} at position {position}")]
    InvalidNibble { position: usize, value: u64 },

    #[error("Invalid hex digit '{digit}' at position {position}")]
    InvalidHex { position: usize, digit: char },

    #[error("Sample {index} assigned to both '{first}' and '{second}'")]
    NonDisjointAssignment {
        index: i64,
        first: String,
        second: String,
    },

    #[error("Default genotype '{0}' is also an explicit genotype label")]
    DefaultLabelConflict(String),

    #[error("Malformed sample document entry '{key}': {reason}")]
    MalformedSampleDoc { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, BitmapError>;
