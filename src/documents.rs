//! Serde models of the variant and file documents handled by the batch driver.
//!
//! Only the fields the encoder reads are typed; everything else is carried
//! through untouched in the flattened `extra` maps.

use crate::genotype::{EncodedSampleDoc, SampleDoc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A variant with its per-file genotype calls. `S` is the sample document
/// type: raw index lists on input, bitmaps on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDocument<S = SampleDoc> {
    #[serde(rename = "chr")]
    pub chromosome: String,
    pub start: i64,
    #[serde(default)]
    pub files: Vec<FileEntry<S>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sample document of an output file entry. Entries the encoder could not
/// process keep their raw form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FileSamples {
    Encoded(EncodedSampleDoc),
    Raw(SampleDoc),
}

pub type EncodedVariant = VariantDocument<FileSamples>;

/// The calls of one variant within one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry<S = SampleDoc> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samp: Option<S>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<S> VariantDocument<S> {
    /// Whether any file entry carries a sample document.
    pub fn has_samples(&self) -> bool {
        self.files.iter().any(|file| file.samp.is_some())
    }

    /// The document `_id` when present, otherwise `chr:start`.
    pub fn display_id(&self) -> String {
        match self.extra.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => format!("{}:{}", self.chromosome, self.start),
        }
    }
}

impl<S> FileEntry<S> {
    pub fn file_key(&self) -> Option<(&str, &str)> {
        match (&self.fid, &self.sid) {
            (Some(fid), Some(sid)) => Some((fid.as_str(), sid.as_str())),
            _ => None,
        }
    }
}

/// Per-file metadata: identifiers, statistics and the sample name map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub fid: String,
    pub sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub st: Option<FileStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samp: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    #[serde(rename = "nSamp")]
    pub num_samples: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
