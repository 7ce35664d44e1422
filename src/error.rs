//! Error types for the `temporal-scenes` crate.
//!
//! This module defines [`SegmentationError`], the unified error type returned
//! by all fallible operations in the crate. Errors carry enough context (file
//! paths, shot indices, offending values) to diagnose a bad input artifact
//! without extra logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all segmentation operations.
///
/// Every public function that can fail returns `Result<T, SegmentationError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SegmentationError {
    /// An input artifact could not be opened or parsed.
    #[error("Failed to load artifact at {path}: {reason}")]
    FileOpen {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying reason the load failed.
        reason: String,
    },

    /// A perceptual hash string contained a symbol outside the hash alphabet.
    #[error("Invalid perceptual hash: {0:?}")]
    InvalidHash(String),

    /// The asset frame rate does not map to a supported timecode rate.
    #[error("Unsupported frame rate: {0}")]
    InvalidFrameRate(f64),

    /// An SMPTE timecode string could not be parsed.
    #[error("Invalid SMPTE timecode: {0:?}")]
    InvalidTimecode(String),

    /// A shot had to be split at a black transition but the asset carries no
    /// frame-rate metadata to compute the split boundary.
    #[error("Cannot split shot {shot_index}: no frame rate available for timecode conversion")]
    MissingTimecodeSettings {
        /// Index of the shot that needed splitting.
        shot_index: usize,
    },

    /// Shot segments are not densely indexed from zero.
    #[error("Shot segment at position {position} has index {index}; shot indices must be dense")]
    NonContiguousShots {
        /// Position of the shot in the sorted shot list.
        position: usize,
        /// Index the shot claimed.
        index: usize,
    },

    /// A technical cue referenced a shot that does not exist.
    #[error("Technical cue references shot {shot_index} but only {shot_count} shots exist")]
    ShotOutOfRange {
        /// The referenced shot index.
        shot_index: usize,
        /// Number of shots available.
        shot_count: usize,
    },

    /// A per-frame artifact does not line up with the frame records.
    #[error("{artifact} has {found} entries but {expected} frames were selected")]
    MisalignedArtifact {
        /// Which artifact was misaligned (`embeddings`, `similarity`).
        artifact: &'static str,
        /// Number of frame records.
        expected: usize,
        /// Number of artifact entries.
        found: usize,
    },

    /// A black transition lies outside the shot that carries it.
    #[error("Transition at {timestamp} ms lies outside shot {shot_index} ({start} - {end} ms)")]
    InvalidTransition {
        /// Shot carrying the transition.
        shot_index: usize,
        /// Transition timestamp in milliseconds.
        timestamp: u64,
        /// Shot start in milliseconds.
        start: u64,
        /// Shot end in milliseconds.
        end: u64,
    },

    /// Scenes reached the merge pass out of shot order.
    #[error("Scene covering shots {current_start}-{current_end} precedes scene at shot {previous_start}")]
    ScenesOutOfOrder {
        /// First shot of the scene already accepted.
        previous_start: usize,
        /// First shot of the offending scene.
        current_start: usize,
        /// Last shot of the offending scene.
        current_end: usize,
    },

    /// An I/O error occurred while reading or writing artifacts.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An artifact could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),
}
