//! Nibble bitmap codec for sample membership.
//!
//! A sample set over `[0, num_samples)` is packed four samples per nibble in
//! ascending index order. Within a nibble the lowest sample index takes the
//! most significant bit (value 8), so indices `4k..4k+4` map to the bit
//! values `8, 4, 2, 1`. When `num_samples` is not a multiple of four the final
//! nibble is padded with zero bits on its least significant side: a sample
//! keeps the same bit value it would have in a full group.

use crate::error::{BitmapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sample indices as they appear in documents. Signed so that negative
/// indices surface as range errors instead of parse failures.
pub type SampleSet = BTreeSet<i64>;

const SAMPLES_PER_NIBBLE: usize = 4;
const NIBBLE_HIGH_BIT: u8 = 0b1000;

/// The valid index range `[0, num_samples)` for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleUniverse {
    num_samples: usize,
}

impl SampleUniverse {
    /// Creates a universe from a sample count read from a document.
    pub fn new(num_samples: i64) -> Result<Self> {
        usize::try_from(num_samples)
            .map(Self::from_count)
            .map_err(|_| BitmapError::InvalidSampleCount(num_samples))
    }

    pub fn from_count(num_samples: usize) -> Self {
        SampleUniverse { num_samples }
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of nibbles in an encoded bitmap, `ceil(num_samples / 4)`.
    pub fn nibble_len(&self) -> usize {
        self.num_samples.div_ceil(SAMPLES_PER_NIBBLE)
    }

    /// Number of padding bits at the tail of the final nibble.
    pub fn padding_bits(&self) -> usize {
        (SAMPLES_PER_NIBBLE - self.num_samples % SAMPLES_PER_NIBBLE) % SAMPLES_PER_NIBBLE
    }

    pub fn contains(&self, index: i64) -> bool {
        self.checked_index(index).is_ok()
    }

    /// Every index in the universe.
    pub fn all(&self) -> SampleSet {
        (0..self.num_samples as i64).collect()
    }

    fn checked_index(&self, index: i64) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.num_samples)
            .ok_or(BitmapError::InvalidRange {
                index,
                num_samples: self.num_samples,
            })
    }

    /// Packs `samples` into a nibble bitmap.
    ///
    /// Every index must lie in `[0, num_samples)`; an out-of-range index is an
    /// error rather than being dropped.
    pub fn encode(&self, samples: &SampleSet) -> Result<EncodedBitmap> {
        let mut nibbles = vec![0u8; self.nibble_len()];
        for &index in samples {
            let i = self.checked_index(index)?;
            nibbles[i / SAMPLES_PER_NIBBLE] |= NIBBLE_HIGH_BIT >> (i % SAMPLES_PER_NIBBLE);
        }
        Ok(EncodedBitmap(nibbles))
    }

    /// Recovers the sample set from a bitmap produced by [`SampleUniverse::encode`].
    ///
    /// The tail padding bits of the final nibble are discarded, whatever
    /// their value.
    pub fn decode(&self, bitmap: &EncodedBitmap) -> Result<SampleSet> {
        if bitmap.len() != self.nibble_len() {
            return Err(BitmapError::MalformedBitmap(format!(
                "expected {} nibbles for {} samples, found {}",
                self.nibble_len(),
                self.num_samples,
                bitmap.len()
            )));
        }

        let mut samples = SampleSet::new();
        for (group, &nibble) in bitmap.nibbles().iter().enumerate() {
            for offset in 0..SAMPLES_PER_NIBBLE {
                let index = group * SAMPLES_PER_NIBBLE + offset;
                if index < self.num_samples && nibble & (NIBBLE_HIGH_BIT >> offset) != 0 {
                    samples.insert(index as i64);
                }
            }
        }
        Ok(samples)
    }
}

/// Packed membership of one sample set: one nibble (0..=15) per four samples.
///
/// Serialized as a JSON array of integers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u8>")]
pub struct EncodedBitmap(Vec<u8>);

impl EncodedBitmap {
    /// Wraps raw nibble values, rejecting anything above 15.
    pub fn from_nibbles<I>(values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<u64>,
    {
        values
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                let value = value.into();
                u8::try_from(value)
                    .ok()
                    .filter(|&n| n <= 0xf)
                    .ok_or(BitmapError::InvalidNibble { position, value })
            })
            .collect::<Result<Vec<u8>>>()
            .map(EncodedBitmap)
    }

    /// Parses the lowercase or uppercase hex text form, one digit per nibble.
    pub fn from_hex(text: &str) -> Result<Self> {
        text.chars()
            .enumerate()
            .map(|(position, digit)| {
                digit
                    .to_digit(16)
                    .map(|n| n as u8)
                    .ok_or(BitmapError::InvalidHex { position, digit })
            })
            .collect::<Result<Vec<u8>>>()
            .map(EncodedBitmap)
    }

    /// Hex text form, one lowercase digit per nibble.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|n| format!("{:x}", n)).collect()
    }

    pub fn nibbles(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of samples marked present.
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|n| n.count_ones() as usize).sum()
    }
}

impl TryFrom<Vec<u64>> for EncodedBitmap {
    type Error = BitmapError;

    fn try_from(values: Vec<u64>) -> Result<Self> {
        EncodedBitmap::from_nibbles(values)
    }
}

impl From<EncodedBitmap> for Vec<u8> {
    fn from(bitmap: EncodedBitmap) -> Self {
        bitmap.0
    }
}

impl fmt::Display for EncodedBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Encodes `samples` over `[0, num_samples)`.
pub fn encode(samples: &SampleSet, num_samples: i64) -> Result<EncodedBitmap> {
    SampleUniverse::new(num_samples)?.encode(samples)
}

/// Decodes a bitmap previously produced by [`encode`] with the same `num_samples`.
pub fn decode(bitmap: &EncodedBitmap, num_samples: i64) -> Result<SampleSet> {
    SampleUniverse::new(num_samples)?.decode(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn set(indices: &[i64]) -> SampleSet {
        indices.iter().copied().collect()
    }

    #[test]
    fn test_full_group_bit_order() {
        // bits 1,0,1,1 read in index order
        let bitmap = encode(&set(&[0, 2, 3]), 4).unwrap();
        assert_eq!(bitmap.nibbles(), &[11]);
    }

    #[test]
    fn test_partial_group_pads_on_tail() {
        assert_eq!(encode(&set(&[]), 6).unwrap().nibbles(), &[0, 0]);
        assert_eq!(encode(&set(&[4, 5]), 6).unwrap().nibbles(), &[0, 12]);
    }

    #[test]
    fn test_five_sample_scenario() {
        assert_eq!(encode(&set(&[0, 2]), 5).unwrap().nibbles(), &[10, 0]);
        assert_eq!(encode(&set(&[4]), 5).unwrap().nibbles(), &[0, 8]);
        assert_eq!(encode(&set(&[1, 3]), 5).unwrap().nibbles(), &[5, 0]);
    }

    #[test]
    fn test_empty_universe() {
        let bitmap = encode(&set(&[]), 0).unwrap();
        assert!(bitmap.is_empty());
        assert_eq!(decode(&bitmap, 0).unwrap(), set(&[]));

        assert_eq!(
            encode(&set(&[0]), 0),
            Err(BitmapError::InvalidRange {
                index: 0,
                num_samples: 0
            })
        );
    }

    #[test]
    fn test_out_of_range_indices() {
        assert!(matches!(
            encode(&set(&[5]), 5),
            Err(BitmapError::InvalidRange { index: 5, .. })
        ));
        assert!(matches!(
            encode(&set(&[-1, 2]), 5),
            Err(BitmapError::InvalidRange { index: -1, .. })
        ));
    }

    #[test]
    fn test_negative_sample_count() {
        assert_eq!(
            encode(&set(&[]), -3),
            Err(BitmapError::InvalidSampleCount(-3))
        );
        assert_eq!(
            decode(&EncodedBitmap::default(), -1),
            Err(BitmapError::InvalidSampleCount(-1))
        );
    }

    #[test]
    fn test_length_is_ceil_quarter() {
        for n in 0..40i64 {
            let bitmap = encode(&set(&[]), n).unwrap();
            assert_eq!(bitmap.len(), ((n + 3) / 4) as usize, "n = {}", n);
        }
    }

    #[test]
    fn test_decode_discards_padding() {
        let bitmap = EncodedBitmap::from_nibbles([0u8, 12]).unwrap();
        assert_eq!(decode(&bitmap, 6).unwrap(), set(&[4, 5]));
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let bitmap = EncodedBitmap::from_nibbles([0u8, 0, 0]).unwrap();
        assert!(matches!(
            decode(&bitmap, 6),
            Err(BitmapError::MalformedBitmap(_))
        ));
    }

    #[test]
    fn test_decode_ignores_set_padding_bits() {
        // 0011 in the last nibble of a 6-sample bitmap sits in the padding
        let bitmap = EncodedBitmap::from_nibbles([0u8, 3]).unwrap();
        assert_eq!(decode(&bitmap, 6).unwrap(), set(&[]));

        let bitmap = EncodedBitmap::from_nibbles([8u8, 15]).unwrap();
        assert_eq!(decode(&bitmap, 5).unwrap(), set(&[0, 4]));
    }

    #[test]
    fn test_nibble_validation() {
        assert_eq!(
            EncodedBitmap::from_nibbles([1u64, 16]),
            Err(BitmapError::InvalidNibble {
                position: 1,
                value: 16
            })
        );
    }

    #[test]
    fn test_hex_text_form() {
        let bitmap = encode(&set(&[0, 2, 4]), 5).unwrap();
        assert_eq!(bitmap.to_hex(), "a8");
        assert_eq!(bitmap.to_string(), "a8");
        assert_eq!(EncodedBitmap::from_hex("A8").unwrap(), bitmap);
        assert_eq!(
            EncodedBitmap::from_hex("a-"),
            Err(BitmapError::InvalidHex {
                position: 1,
                digit: '-'
            })
        );
    }

    #[test]
    fn test_json_form_is_integer_array() {
        let bitmap = encode(&set(&[0, 2]), 5).unwrap();
        assert_eq!(serde_json::to_string(&bitmap).unwrap(), "[10,0]");

        let parsed: EncodedBitmap = serde_json::from_str("[10,0]").unwrap();
        assert_eq!(parsed, bitmap);
        assert!(serde_json::from_str::<EncodedBitmap>("[10,16]").is_err());
    }

    #[test]
    fn test_random_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let n: i64 = rng.random_range(0..64);
            let density: f64 = rng.random_range(0.0..1.0);
            let samples: SampleSet = (0..n).filter(|_| rng.random_bool(density)).collect();

            let bitmap = encode(&samples, n).unwrap();
            assert_eq!(bitmap.count_ones(), samples.len());
            assert_eq!(decode(&bitmap, n).unwrap(), samples);
        }
    }
}
