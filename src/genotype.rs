//! Genotype partitions of the samples of one file, and their encoded form.
//!
//! A raw sample document lists, per genotype label, the indices of the
//! samples carrying that genotype. The most common genotype is not listed:
//! the reserved `"def"` key names it and its samples are everything not
//! claimed by an explicit label.

use crate::bitmap::{EncodedBitmap, SampleSet, SampleUniverse};
use crate::error::{BitmapError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved sample document key naming the default genotype.
pub const DEFAULT_KEY: &str = "def";

/// One value of a raw sample document. Values of any other shape are kept
/// as `Other` so that they fail per file entry, not per document batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleEntry {
    Indices(Vec<i64>),
    Label(String),
    Other(Value),
}

/// Raw sample document, `label -> sample indices` plus the `"def"` entry.
pub type SampleDoc = IndexMap<String, SampleEntry>;

/// One value of an encoded sample document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedEntry {
    Bitmap(EncodedBitmap),
    Label(String),
}

pub type EncodedSampleDoc = IndexMap<String, EncodedEntry>;

/// Whether the derived default genotype set is written to the encoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// Replace the `"def"` entry with the encoded default set under the
    /// default genotype's name.
    #[default]
    Encode,
    /// Validate and compute the default set but keep the raw `"def"` entry.
    Omit,
}

/// Partition of one file's samples by genotype, for one variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenotypeAssignment {
    explicit: IndexMap<String, SampleSet>,
    default_genotype: Option<String>,
}

impl GenotypeAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_genotype(mut self, genotype: impl Into<String>) -> Self {
        self.default_genotype = Some(genotype.into());
        self
    }

    /// Adds an explicit genotype label. Re-inserting a label replaces its set.
    pub fn insert(&mut self, label: impl Into<String>, samples: SampleSet) {
        self.explicit.insert(label.into(), samples);
    }

    /// Builds an assignment from a raw sample document.
    pub fn from_sample_doc(doc: &SampleDoc) -> Result<Self> {
        let mut assignment = GenotypeAssignment::new();
        for (key, entry) in doc {
            match (key.as_str(), entry) {
                (DEFAULT_KEY, SampleEntry::Label(genotype)) => {
                    assignment.default_genotype = Some(genotype.clone());
                }
                (DEFAULT_KEY, _) => {
                    return Err(BitmapError::MalformedSampleDoc {
                        key: key.clone(),
                        reason: "expected the default genotype name".to_string(),
                    });
                }
                (_, SampleEntry::Indices(indices)) => {
                    assignment.insert(key.clone(), indices.iter().copied().collect());
                }
                (_, _) => {
                    return Err(BitmapError::MalformedSampleDoc {
                        key: key.clone(),
                        reason: "expected an array of sample indices".to_string(),
                    });
                }
            }
        }
        Ok(assignment)
    }

    pub fn explicit(&self) -> &IndexMap<String, SampleSet> {
        &self.explicit
    }

    pub fn default_genotype(&self) -> Option<&str> {
        self.default_genotype.as_deref()
    }

    /// Label under which the default set is emitted.
    pub fn default_label(&self) -> &str {
        self.default_genotype.as_deref().unwrap_or(DEFAULT_KEY)
    }

    /// Samples not claimed by any explicit label.
    ///
    /// Fails if an explicit index lies outside the universe or is claimed by
    /// two labels, since either would corrupt the complement.
    pub fn resolve_default(&self, universe: SampleUniverse) -> Result<SampleSet> {
        let mut owner: Vec<Option<&str>> = vec![None; universe.num_samples()];
        for (label, samples) in &self.explicit {
            for &index in samples {
                if !universe.contains(index) {
                    return Err(BitmapError::InvalidRange {
                        index,
                        num_samples: universe.num_samples(),
                    });
                }
                let slot = &mut owner[index as usize];
                if let Some(first) = *slot {
                    return Err(BitmapError::NonDisjointAssignment {
                        index,
                        first: first.to_string(),
                        second: label.clone(),
                    });
                }
                *slot = Some(label.as_str());
            }
        }

        Ok(owner
            .iter()
            .enumerate()
            .filter(|(_, label)| label.is_none())
            .map(|(index, _)| index as i64)
            .collect())
    }

    /// Encodes every explicit label, then the derived default set under
    /// [`GenotypeAssignment::default_label`]. The default label is always
    /// present, even when its set is empty.
    pub fn encode_all(&self, universe: SampleUniverse) -> Result<IndexMap<String, EncodedBitmap>> {
        let default_label = self.default_label();
        if self.explicit.contains_key(default_label) {
            return Err(BitmapError::DefaultLabelConflict(default_label.to_string()));
        }

        let default_set = self.resolve_default(universe)?;
        let mut encoded = IndexMap::with_capacity(self.explicit.len() + 1);
        for (label, samples) in &self.explicit {
            encoded.insert(label.clone(), universe.encode(samples)?);
        }
        encoded.insert(default_label.to_string(), universe.encode(&default_set)?);
        Ok(encoded)
    }
}

/// Complement of the union of the explicit sets within `[0, num_samples)`.
pub fn resolve_default(assignment: &GenotypeAssignment, num_samples: i64) -> Result<SampleSet> {
    assignment.resolve_default(SampleUniverse::new(num_samples)?)
}

/// Encodes every label of `assignment`, including the derived default.
pub fn resolve_and_encode_all(
    assignment: &GenotypeAssignment,
    num_samples: i64,
) -> Result<IndexMap<String, EncodedBitmap>> {
    assignment.encode_all(SampleUniverse::new(num_samples)?)
}

/// Encodes a raw sample document. Labels keep their document order; under
/// [`DefaultPolicy::Encode`] the default genotype is appended last.
pub fn encode_sample_doc(
    doc: &SampleDoc,
    universe: SampleUniverse,
    policy: DefaultPolicy,
) -> Result<EncodedSampleDoc> {
    let assignment = GenotypeAssignment::from_sample_doc(doc)?;
    match policy {
        DefaultPolicy::Encode => Ok(assignment
            .encode_all(universe)?
            .into_iter()
            .map(|(label, bitmap)| (label, EncodedEntry::Bitmap(bitmap)))
            .collect()),
        DefaultPolicy::Omit => {
            assignment.resolve_default(universe)?;
            // every key other than "def" is an explicit label by now
            doc.keys()
                .map(|key| -> Result<(String, EncodedEntry)> {
                    let encoded = match assignment.explicit.get(key) {
                        Some(samples) => EncodedEntry::Bitmap(universe.encode(samples)?),
                        None => EncodedEntry::Label(assignment.default_label().to_string()),
                    };
                    Ok((key.clone(), encoded))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(indices: &[i64]) -> SampleSet {
        indices.iter().copied().collect()
    }

    fn het_hom() -> GenotypeAssignment {
        let mut assignment = GenotypeAssignment::new();
        assignment.insert("het", set(&[0, 2]));
        assignment.insert("hom", set(&[4]));
        assignment
    }

    #[test]
    fn test_resolve_default_complement() {
        let default = resolve_default(&het_hom(), 5).unwrap();
        assert_eq!(default, set(&[1, 3]));
    }

    #[test]
    fn test_complement_covers_universe_disjointly() {
        let mut assignment = GenotypeAssignment::new();
        assignment.insert("0|1", set(&[1, 7, 8]));
        assignment.insert("1|1", set(&[3]));
        assignment.insert("1|0", set(&[0, 10]));
        let universe = SampleUniverse::from_count(11);

        let default = assignment.resolve_default(universe).unwrap();
        let mut union = default.clone();
        let mut total = default.len();
        for samples in assignment.explicit().values() {
            assert!(samples.is_disjoint(&default));
            total += samples.len();
            union.extend(samples);
        }
        assert_eq!(union, universe.all());
        assert_eq!(total, 11);
    }

    #[test]
    fn test_overlap_is_reported() {
        let mut assignment = GenotypeAssignment::new();
        assignment.insert("a", set(&[0, 1]));
        assignment.insert("b", set(&[1, 2]));

        assert_eq!(
            resolve_default(&assignment, 3),
            Err(BitmapError::NonDisjointAssignment {
                index: 1,
                first: "a".to_string(),
                second: "b".to_string(),
            })
        );
        assert!(resolve_and_encode_all(&assignment, 3).is_err());
    }

    #[test]
    fn test_explicit_index_out_of_range() {
        let mut assignment = GenotypeAssignment::new();
        assignment.insert("a", set(&[3]));
        assert!(matches!(
            resolve_default(&assignment, 3),
            Err(BitmapError::InvalidRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_encode_all_scenario() {
        let encoded = resolve_and_encode_all(&het_hom().with_default_genotype("0|0"), 5).unwrap();
        let labels: Vec<&str> = encoded.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["het", "hom", "0|0"]);
        assert_eq!(encoded["het"].nibbles(), &[10, 0]);
        assert_eq!(encoded["hom"].nibbles(), &[0, 8]);
        assert_eq!(encoded["0|0"].nibbles(), &[5, 0]);
    }

    #[test]
    fn test_default_label_present_when_empty() {
        let mut assignment = GenotypeAssignment::new();
        assignment.insert("1|1", set(&[0, 1, 2, 3]));
        let encoded = resolve_and_encode_all(&assignment, 4).unwrap();
        assert_eq!(encoded[DEFAULT_KEY].nibbles(), &[0]);
    }

    #[test]
    fn test_default_label_conflict() {
        let assignment = het_hom().with_default_genotype("het");
        assert_eq!(
            resolve_and_encode_all(&assignment, 5),
            Err(BitmapError::DefaultLabelConflict("het".to_string()))
        );
    }

    #[test]
    fn test_from_sample_doc() {
        let doc: SampleDoc =
            serde_json::from_value(json!({"0|1": [0, 2], "def": "0|0", "1|1": [4]})).unwrap();
        let assignment = GenotypeAssignment::from_sample_doc(&doc).unwrap();
        assert_eq!(assignment.default_genotype(), Some("0|0"));
        assert_eq!(assignment.explicit()["0|1"], set(&[0, 2]));
        assert_eq!(assignment.explicit()["1|1"], set(&[4]));
    }

    #[test]
    fn test_malformed_sample_doc() {
        let doc: SampleDoc = serde_json::from_value(json!({"def": [1]})).unwrap();
        assert!(matches!(
            GenotypeAssignment::from_sample_doc(&doc),
            Err(BitmapError::MalformedSampleDoc { .. })
        ));

        let doc: SampleDoc = serde_json::from_value(json!({"0|1": "x"})).unwrap();
        assert!(matches!(
            GenotypeAssignment::from_sample_doc(&doc),
            Err(BitmapError::MalformedSampleDoc { .. })
        ));
    }

    #[test]
    fn test_unexpected_value_shapes_parse_then_fail() {
        for value in [
            json!({"0|1": [1.5]}),
            json!({"0|1": null}),
            json!({"0|1": {"a": 1}}),
            json!({"def": 5}),
        ] {
            let doc: SampleDoc = serde_json::from_value(value.clone()).unwrap();
            assert!(
                matches!(
                    GenotypeAssignment::from_sample_doc(&doc),
                    Err(BitmapError::MalformedSampleDoc { .. })
                ),
                "{}",
                value
            );
        }
    }

    #[test]
    fn test_encode_sample_doc_policies() {
        let doc: SampleDoc =
            serde_json::from_value(json!({"0|1": [0, 2], "def": "0|0", "1|1": [4]})).unwrap();
        let universe = SampleUniverse::from_count(5);

        let encoded = encode_sample_doc(&doc, universe, DefaultPolicy::Encode).unwrap();
        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!({"0|1": [10, 0], "1|1": [0, 8], "0|0": [5, 0]})
        );

        let omitted = encode_sample_doc(&doc, universe, DefaultPolicy::Omit).unwrap();
        assert_eq!(
            serde_json::to_value(&omitted).unwrap(),
            json!({"0|1": [10, 0], "def": "0|0", "1|1": [0, 8]})
        );
    }

    #[test]
    fn test_omit_policy_still_validates() {
        let doc: SampleDoc =
            serde_json::from_value(json!({"a": [0, 1], "b": [1], "def": "0|0"})).unwrap();
        let result = encode_sample_doc(&doc, SampleUniverse::from_count(3), DefaultPolicy::Omit);
        assert!(matches!(
            result,
            Err(BitmapError::NonDisjointAssignment { index: 1, .. })
        ));
    }
}
