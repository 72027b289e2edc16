//! Sparse genotype bitmap encoding for per-file variant sample documents.
//!
//! For one variant observed in one file, the samples are partitioned by
//! genotype. Each genotype's samples are packed into a nibble bitmap
//! ([`bitmap`]), and the samples of the default genotype, which documents
//! leave implicit, are derived by complement ([`genotype`]). The batch driver
//! in [`pipeline`] applies this to whole collections of variant documents.

pub mod bitmap;
pub mod config;
pub mod documents;
pub mod error;
pub mod genotype;
pub mod io;
pub mod lookup;
pub mod pipeline;
pub mod utils;

pub use bitmap::{decode, encode, EncodedBitmap, SampleSet, SampleUniverse};
pub use error::{BitmapError, Result};
pub use genotype::{resolve_and_encode_all, resolve_default, DefaultPolicy, GenotypeAssignment};
