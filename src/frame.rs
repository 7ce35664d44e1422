//! Frame records and the per-frame artifacts attached to them.

use serde::{Deserialize, Serialize};

use crate::{
    error::SegmentationError,
    segment::TechnicalCueType,
    similarity::{PerceptualHash, deserialize_lenient_hash},
};

/// One sampled frame of the asset.
///
/// Loaded from the frame-hash artifact; the frame selector fills in
/// `shot_idx`, `technical_cue_type` and `extend_frame_duration`, and the
/// scene builder expects `embeddings` and `similar_frames` to have been
/// attached with [`attach_frame_artifacts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    /// Frame image file name.
    pub name: String,
    /// Frame number in the source video.
    pub frame_no: u64,
    /// Presentation time in milliseconds.
    pub timestamp: u64,
    /// Perceptual hash, `None` when hashing failed upstream.
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_hash",
        skip_serializing_if = "Option::is_none"
    )]
    pub hash: Option<PerceptualHash>,
    /// Sharpness score (variance of the Laplacian).
    #[serde(default)]
    pub laplacian: f64,
    /// Index of the shot the frame was selected from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_idx: Option<usize>,
    /// Cue type of the shot the frame was selected from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_cue_type: Option<TechnicalCueType>,
    /// Span in milliseconds of near-identical frames this frame stands for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend_frame_duration: Option<u64>,
    /// Embedding vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f64>>,
    /// Nearest neighbours among the selected frames.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similar_frames: Vec<SimilarFrame>,
}

impl FrameRecord {
    /// Create a bare record with no hash or annotations.
    pub fn new(name: impl Into<String>, frame_no: u64, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            frame_no,
            timestamp,
            hash: None,
            laplacian: 0.0,
            shot_idx: None,
            technical_cue_type: None,
            extend_frame_duration: None,
            embeddings: None,
            similar_frames: Vec::new(),
        }
    }

    /// Set the perceptual hash.
    #[must_use]
    pub fn with_hash(mut self, hash: PerceptualHash) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Set the sharpness score.
    #[must_use]
    pub fn with_laplacian(mut self, laplacian: f64) -> Self {
        self.laplacian = laplacian;
        self
    }

    /// Set the owning shot.
    #[must_use]
    pub fn with_shot(mut self, shot_idx: usize) -> Self {
        self.shot_idx = Some(shot_idx);
        self
    }

    /// Set the embedding vector.
    #[must_use]
    pub fn with_embeddings(mut self, embeddings: Vec<f64>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Set the neighbour list.
    #[must_use]
    pub fn with_similar_frames(mut self, similar_frames: Vec<SimilarFrame>) -> Self {
        self.similar_frames = similar_frames;
        self
    }
}

/// A nearest-neighbour edge between two selected frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarFrame {
    /// Index of the neighbour in the selected frame list.
    #[serde(rename = "I")]
    pub index: usize,
    /// Similarity to the neighbour.
    #[serde(rename = "D")]
    pub similarity: f64,
}

/// One row of the embeddings artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingRow {
    /// Embedding vector of the frame at the same position.
    #[serde(default)]
    pub embeddings: Vec<f64>,
}

/// One row of the similarity artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarityRow {
    /// Neighbours of the frame at the same position.
    #[serde(default)]
    pub similar_frames: Vec<SimilarFrame>,
}

/// Attach embedding and neighbour rows to the selected frames, position by
/// position.
///
/// # Errors
///
/// Returns [`SegmentationError::MisalignedArtifact`] when either artifact
/// does not have exactly one row per frame.
pub fn attach_frame_artifacts(
    frames: &mut [FrameRecord],
    embeddings: Vec<EmbeddingRow>,
    similarity: Vec<SimilarityRow>,
) -> Result<(), SegmentationError> {
    if embeddings.len() != frames.len() {
        return Err(SegmentationError::MisalignedArtifact {
            artifact: "embeddings",
            expected: frames.len(),
            found: embeddings.len(),
        });
    }
    if similarity.len() != frames.len() {
        return Err(SegmentationError::MisalignedArtifact {
            artifact: "similarity",
            expected: frames.len(),
            found: similarity.len(),
        });
    }

    for ((frame, embedding), neighbours) in frames.iter_mut().zip(embeddings).zip(similarity) {
        frame.embeddings = Some(embedding.embeddings);
        frame.similar_frames = neighbours.similar_frames;
    }

    log::debug!("Attached embeddings and neighbours to {} frames", frames.len());
    Ok(())
}
