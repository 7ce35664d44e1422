//! Similarity primitives.
//!
//! Two measures drive the whole engine: a normalized Hamming distance over
//! perceptual hashes (cheap, used to thin out near-duplicate frames) and a
//! cosine similarity over frame embeddings (used to relate shots to one
//! another).
//!
//! # Example
//!
//! ```
//! use temporal_scenes::{PerceptualHash, hamming_distance};
//!
//! let a: PerceptualHash = "0000".parse()?;
//! let b: PerceptualHash = "000z".parse()?;
//! assert!(hamming_distance(Some(&a), Some(&b)) > 0.0);
//! # Ok::<(), temporal_scenes::SegmentationError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::LazyLock,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SegmentationError;

/// Symbols of the base-64 hash encoding, each worth 6 bits.
pub const HASH_ALPHABET: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

/// Canonical hashes of frames that carry no content: a black frame and
/// EBU colour bars.
pub const KNOWN_BLANK_HASHES: [&str; 2] = ["00000000000", "820w820w800"];

/// A hash within this distance of a canonical blank hash is treated as blank.
const KNOWN_BLANK_TOLERANCE: f64 = 0.10;

const BITS_PER_SYMBOL: usize = 6;

static KNOWN_BLANK: LazyLock<Vec<PerceptualHash>> = LazyLock::new(|| {
    KNOWN_BLANK_HASHES
        .iter()
        .filter_map(|hash| hash.parse().ok())
        .collect()
});

/// A perceptual image hash in its base-64 string form.
///
/// Stored as one 6-bit value per symbol so distances can be computed with
/// bit operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerceptualHash {
    symbols: Vec<u8>,
}

impl PerceptualHash {
    /// Number of symbols in the hash.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` for an empty hash.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Fraction of differing bits, without the blank-frame short-circuit.
    ///
    /// The shorter hash is padded with zero symbols.
    pub fn bit_distance(&self, other: &PerceptualHash) -> f64 {
        let length = self.symbols.len().max(other.symbols.len());
        if length == 0 {
            return 0.0;
        }

        let differing: u32 = (0..length)
            .map(|index| {
                let left = self.symbols.get(index).copied().unwrap_or(0);
                let right = other.symbols.get(index).copied().unwrap_or(0);
                (left ^ right).count_ones()
            })
            .sum();

        differing as f64 / (length * BITS_PER_SYMBOL) as f64
    }
}

impl FromStr for PerceptualHash {
    type Err = SegmentationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let symbols = value
            .bytes()
            .map(|byte| {
                HASH_ALPHABET
                    .bytes()
                    .position(|symbol| symbol == byte)
                    .map(|position| position as u8)
            })
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| SegmentationError::InvalidHash(value.to_string()))?;

        Ok(Self { symbols })
    }
}

impl Display for PerceptualHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let alphabet = HASH_ALPHABET.as_bytes();
        for &symbol in &self.symbols {
            write!(f, "{}", alphabet[symbol as usize] as char)?;
        }
        Ok(())
    }
}

impl Serialize for PerceptualHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PerceptualHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Deserialize an optional hash, mapping `null`, `"undefined"` and
/// malformed strings to `None`.
///
/// Upstream writes the literal string `undefined` for frames it failed to
/// hash; those frames must still load.
pub(crate) fn deserialize_lenient_hash<'de, D>(
    deserializer: D,
) -> Result<Option<PerceptualHash>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| match raw.parse() {
        Ok(hash) => Some(hash),
        Err(_) => {
            if raw != "undefined" {
                log::debug!("Ignoring malformed frame hash {raw:?}");
            }
            None
        }
    }))
}

/// Returns `true` when `hash` is within tolerance of a canonical blank hash
/// of the same length.
pub fn is_known_blank_hash(hash: &PerceptualHash) -> bool {
    KNOWN_BLANK.iter().any(|known| {
        known.len() == hash.len() && known.bit_distance(hash) < KNOWN_BLANK_TOLERANCE
    })
}

/// Normalized Hamming distance between two frame hashes, in `[0, 1]`.
///
/// A missing hash on either side yields 0, as does a second operand that is
/// a known blank frame, so blank frames are absorbed into their neighbours
/// instead of starting new groups.
pub fn hamming_distance(first: Option<&PerceptualHash>, second: Option<&PerceptualHash>) -> f64 {
    let (Some(first), Some(second)) = (first, second) else {
        return 0.0;
    };

    if is_known_blank_hash(second) {
        return 0.0;
    }

    first.bit_distance(second)
}

/// Cosine similarity of two embedding vectors, in `[-1, 1]`.
///
/// Computed over the common prefix; a zero-norm input yields 0.
pub fn cosine_similarity(first: &[f64], second: &[f64]) -> f64 {
    let (dot, norm_first, norm_second) = first.iter().zip(second).fold(
        (0.0, 0.0, 0.0),
        |(dot, norm_first, norm_second), (a, b)| {
            (dot + a * b, norm_first + a * a, norm_second + b * b)
        },
    );

    let denominator = norm_first.sqrt() * norm_second.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (dot / denominator).clamp(-1.0, 1.0)
}
