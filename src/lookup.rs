//! Read-only lookup data used by the batch driver: per-file sample counts and
//! the chromosome start ranges that bound variant selection.

use crate::documents::FileMetadata;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the file metadata says about one `(fid, sid)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSampleCount {
    Known(i64),
    /// The file document lacks sample statistics or a sample name map; its
    /// calls cannot be encoded.
    Unavailable,
}

/// Sample counts keyed by `fid`, then `sid`, built once per batch. Lookups
/// borrow the caller's keys.
#[derive(Debug, Clone, Default)]
pub struct SampleCountLookup {
    entries: HashMap<String, HashMap<String, FileSampleCount>>,
}

impl SampleCountLookup {
    pub fn from_file_docs<'a, I>(docs: I) -> Self
    where
        I: IntoIterator<Item = &'a FileMetadata>,
    {
        let mut lookup = SampleCountLookup::default();
        for doc in docs {
            let count = match (&doc.st, &doc.samp) {
                (Some(st), Some(_)) => FileSampleCount::Known(st.num_samples),
                _ => {
                    debug!("File {}/{} has no sample statistics", doc.fid, doc.sid);
                    FileSampleCount::Unavailable
                }
            };
            if lookup.insert(&doc.fid, &doc.sid, count).is_some() {
                warn!("Duplicate file metadata for {}/{}; keeping the last", doc.fid, doc.sid);
            }
        }
        lookup
    }

    /// Returns the previous count for the pair, if any.
    pub fn insert(
        &mut self,
        fid: &str,
        sid: &str,
        count: FileSampleCount,
    ) -> Option<FileSampleCount> {
        self.entries
            .entry(fid.to_string())
            .or_default()
            .insert(sid.to_string(), count)
    }

    pub fn get(&self, fid: &str, sid: &str) -> Option<FileSampleCount> {
        self.entries.get(fid)?.get(sid).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Start-position bounds of the variants stored for one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromosomeRange {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "minStart")]
    pub min_start: i64,
    #[serde(rename = "maxStart")]
    pub max_start: i64,
    #[serde(rename = "numEntries", default)]
    pub num_entries: u64,
}

impl ChromosomeRange {
    pub fn new(id: &str, min_start: i64, max_start: i64, num_entries: u64) -> Self {
        ChromosomeRange {
            id: id.to_string(),
            min_start,
            max_start,
            num_entries,
        }
    }

    pub fn contains(&self, chromosome: &str, start: i64) -> bool {
        self.id == chromosome && (self.min_start..=self.max_start).contains(&start)
    }
}

/// Variant start ranges of the GRCh37 variant collection.
pub fn grch37_ranges() -> Vec<ChromosomeRange> {
    [
        ("1", 10020, 249240605, 12422239),
        ("2", 10133, 243189190, 13217397),
        ("3", 60069, 197962381, 10891260),
        ("4", 10006, 191044268, 10427984),
        ("5", 10043, 180905164, 9742153),
        ("6", 61932, 171054104, 9340928),
        ("7", 10010, 159128653, 8803393),
        ("8", 10059, 146303974, 8458842),
        ("9", 10024, 141153428, 6749462),
        ("10", 60222, 135524743, 7416994),
        ("11", 61248, 134946509, 7690584),
        ("12", 60076, 133841815, 7347630),
        ("13", 19020013, 115109865, 5212835),
        ("14", 19000005, 107289456, 4989875),
        ("15", 20000003, 102521368, 4607392),
        ("16", 60008, 90294709, 5234679),
        ("17", 47, 81195128, 4652428),
        ("18", 10005, 78017157, 4146560),
        ("19", 60360, 59118925, 3821659),
        ("20", 60039, 62965384, 3512381),
        ("21", 9411199, 48119868, 2082680),
        ("22", 16050036, 51244515, 2172028),
        ("X", 60003, 155260479, 5893713),
        ("Y", 10003, 59363485, 504508),
    ]
    .into_iter()
    .map(|(id, min_start, max_start, num_entries)| {
        ChromosomeRange::new(id, min_start, max_start, num_entries)
    })
    .collect()
}
