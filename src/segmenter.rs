//! Core [`TemporalSegmenter`] implementation.
//!
//! `TemporalSegmenter` is the main entry point for the crate. It holds the
//! [`SegmentationOptions`] and runs the two passes of the engine: frame
//! selection, and scene detection over the selected frames once the
//! embedding and neighbour artifacts for them exist.

use crate::{
    artifacts::SceneInputs,
    config::SegmentationOptions,
    error::SegmentationError,
    format::{CueTrack, SceneMetadata, render_scenes},
    frame::{FrameRecord, attach_frame_artifacts},
    reduce::{ReductionContext, reduce_scenes_with_options},
    scene::{Scene, SceneBuilder},
    segment::Segments,
    selection::select_frames_with_options,
};

/// Scenes of an asset, in both output forms.
#[derive(Debug, Clone)]
pub struct SceneReport {
    /// Reduced scenes, numbered in time order.
    pub scenes: Vec<Scene>,
    /// The scene metadata document.
    pub metadata: SceneMetadata,
    /// One cue per scene.
    pub track: CueTrack,
}

/// Runs frame selection and scene detection with shared options.
///
/// # Example
///
/// ```
/// use temporal_scenes::{FrameRecord, TemporalSegmenter};
///
/// let frames: Vec<FrameRecord> = (0..20)
///     .map(|i| FrameRecord::new(format!("frame.{i:07}.jpg"), i * 25, i * 1_000))
///     .collect();
/// let segmenter = TemporalSegmenter::new();
/// let selected = segmenter.select_frames(&frames, None);
/// assert!(!selected.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemporalSegmenter {
    options: SegmentationOptions,
}

impl TemporalSegmenter {
    /// Create a segmenter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a segmenter with the given options.
    pub fn with_options(options: SegmentationOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &SegmentationOptions {
        &self.options
    }

    /// Pick representative frames from the full frame-hash list.
    pub fn select_frames(
        &self,
        frames: &[FrameRecord],
        segments: Option<&Segments>,
    ) -> Vec<FrameRecord> {
        select_frames_with_options(frames, segments, &self.options)
    }

    /// Detect scenes from loaded inputs.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::MisalignedArtifact`] when the embedding
    /// or neighbour rows do not line up with the selected frames, and any
    /// error raised while building or reducing scenes.
    pub fn detect_scenes(
        &self,
        inputs: SceneInputs,
        frame_prefix: &str,
    ) -> Result<SceneReport, SegmentationError> {
        let SceneInputs {
            mut frames,
            frame_hashes,
            segments,
            embeddings,
            similarity,
        } = inputs;

        attach_frame_artifacts(&mut frames, embeddings, similarity)?;

        let builder = SceneBuilder::new(&segments, &frames, &self.options);
        let provisional = builder.build()?;
        let shots = builder.into_shots();

        let context = ReductionContext {
            shots: &shots,
            frames: &frames,
            frame_hashes: &frame_hashes,
        };
        let scenes = reduce_scenes_with_options(provisional, &context, &self.options)?;
        let (metadata, track) = render_scenes(&scenes, frame_prefix);

        Ok(SceneReport {
            scenes,
            metadata,
            track,
        })
    }
}
