//! Loading and saving the JSON artifacts the engine reads and writes.
//!
//! Every loader reports the offending path in
//! [`SegmentationError::FileOpen`], so a caller can tell which of the
//! several input files was bad.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{
    error::SegmentationError,
    frame::{EmbeddingRow, FrameRecord, SimilarityRow},
    segment::{SegmentationDocument, Segments},
};

/// Everything scene detection reads from disk.
#[derive(Debug, Clone)]
pub struct SceneInputs {
    /// Selected frames, as written by frame selection.
    pub frames: Vec<FrameRecord>,
    /// The full frame-hash list.
    pub frame_hashes: Vec<FrameRecord>,
    /// Shot and technical-cue segmentation.
    pub segments: Segments,
    /// Embeddings, one row per selected frame.
    pub embeddings: Vec<EmbeddingRow>,
    /// Nearest neighbours, one row per selected frame.
    pub similarity: Vec<SimilarityRow>,
}

/// Deserialize a JSON file.
///
/// # Errors
///
/// Returns [`SegmentationError::FileOpen`] when the file is missing or not
/// valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, SegmentationError> {
    let file = File::open(path).map_err(|error| SegmentationError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|error| SegmentationError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

/// Serialize `value` to a JSON file.
///
/// # Errors
///
/// Returns [`SegmentationError::IoError`] or [`SegmentationError::JsonError`]
/// on write failure.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SegmentationError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Write a text file.
///
/// # Errors
///
/// Returns [`SegmentationError::IoError`] on write failure.
pub fn save_text(path: &Path, text: &str) -> Result<(), SegmentationError> {
    std::fs::write(path, text)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Load a frame-hash (or selected-frames) list.
pub fn load_frame_hashes(path: &Path) -> Result<Vec<FrameRecord>, SegmentationError> {
    let frames: Vec<FrameRecord> = load_json(path)?;
    log::info!("Loaded {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

/// Load and normalize a segmentation document.
pub fn load_segments(path: &Path) -> Result<Segments, SegmentationError> {
    let document: SegmentationDocument = load_json(path)?;
    let segments = Segments::from_document(&document)?;
    log::info!(
        "Loaded {} shots and {} technical cues from {}",
        segments.shots.len(),
        segments.technical_cues.len(),
        path.display()
    );
    Ok(segments)
}

/// Load the embeddings artifact.
pub fn load_embeddings(path: &Path) -> Result<Vec<EmbeddingRow>, SegmentationError> {
    load_json(path)
}

/// Load the nearest-neighbour artifact.
pub fn load_similarity(path: &Path) -> Result<Vec<SimilarityRow>, SegmentationError> {
    load_json(path)
}

/// Load all scene-detection inputs.
///
/// # Errors
///
/// Fails on the first artifact that cannot be loaded.
pub fn load_scene_inputs(
    frames: &Path,
    frame_hashes: &Path,
    segments: &Path,
    embeddings: &Path,
    similarity: &Path,
) -> Result<SceneInputs, SegmentationError> {
    Ok(SceneInputs {
        frames: load_frame_hashes(frames)?,
        frame_hashes: load_frame_hashes(frame_hashes)?,
        segments: load_segments(segments)?,
        embeddings: load_embeddings(embeddings)?,
        similarity: load_similarity(similarity)?,
    })
}

#[cfg(feature = "async")]
async fn load_json_async<T: DeserializeOwned>(path: &Path) -> Result<T, SegmentationError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|error| SegmentationError::FileOpen {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

    serde_json::from_slice(&bytes).map_err(|error| SegmentationError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

/// Load all scene-detection inputs, reading the files concurrently.
///
/// Parsing still happens on the calling task once each read completes.
///
/// # Errors
///
/// See [`load_scene_inputs`].
#[cfg(feature = "async")]
pub async fn load_scene_inputs_async(
    frames: &Path,
    frame_hashes: &Path,
    segments: &Path,
    embeddings: &Path,
    similarity: &Path,
) -> Result<SceneInputs, SegmentationError> {
    let (frames, frame_hashes, document, embeddings, similarity) = tokio::join!(
        load_json_async::<Vec<FrameRecord>>(frames),
        load_json_async::<Vec<FrameRecord>>(frame_hashes),
        load_json_async::<SegmentationDocument>(segments),
        load_json_async::<Vec<EmbeddingRow>>(embeddings),
        load_json_async::<Vec<SimilarityRow>>(similarity),
    );

    Ok(SceneInputs {
        frames: frames?,
        frame_hashes: frame_hashes?,
        segments: Segments::from_document(&document?)?,
        embeddings: embeddings?,
        similarity: similarity?,
    })
}
