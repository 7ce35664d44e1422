//! # temporal-scenes
//!
//! Temporal segmentation of video assets: pick the frames worth analysing,
//! then group shots into scenes.
//!
//! `temporal-scenes` works on artifacts produced upstream: a densely sampled
//! frame list with perceptual hashes and sharpness scores, a shot and
//! technical-cue segmentation, and per-frame embeddings with nearest
//! neighbours. It never decodes media itself.
//!
//! ## Quick Start
//!
//! ### Select Frames
//!
//! ```no_run
//! use std::path::Path;
//!
//! use temporal_scenes::{TemporalSegmenter, artifacts};
//!
//! let frames = artifacts::load_frame_hashes(Path::new("frameHash.json"))?;
//! let segments = artifacts::load_segments(Path::new("segments.json")).ok();
//!
//! let selected = TemporalSegmenter::new().select_frames(&frames, segments.as_ref());
//! artifacts::save_json(Path::new("framesegmentation.json"), &selected)?;
//! # Ok::<(), temporal_scenes::SegmentationError>(())
//! ```
//!
//! ### Detect Scenes
//!
//! ```no_run
//! use std::path::Path;
//!
//! use temporal_scenes::{FilterSettings, SegmentationOptions, TemporalSegmenter, artifacts};
//!
//! let inputs = artifacts::load_scene_inputs(
//!     Path::new("framesegmentation.json"),
//!     Path::new("frameHash.json"),
//!     Path::new("segments.json"),
//!     Path::new("embeddings.json"),
//!     Path::new("similarity.json"),
//! )?;
//!
//! let options = SegmentationOptions::new()
//!     .with_filter_settings(FilterSettings::new().with_min_frame_similarity(0.85));
//! let report = TemporalSegmenter::with_options(options).detect_scenes(inputs, "frames/")?;
//!
//! artifacts::save_json(Path::new("scene.json"), &report.metadata)?;
//! artifacts::save_text(Path::new("scene.vtt"), &report.track.to_webvtt())?;
//! # Ok::<(), temporal_scenes::SegmentationError>(())
//! ```
//!
//! ## Features
//!
//! - **Frame selection**: per-shot policy driven by technical cue type
//!   (sharpest frame, fixed rate, or adaptive perceptual-hash scan), or
//!   windowed scanning when no segmentation exists
//! - **Scene building**: shots related through embedding neighbours within
//!   a time window, cut at black fades and transitions
//! - **Scene reduction**: nested and overlapping scenes merged, short
//!   bursts folded into neighbours by boundary similarity
//! - **SMPTE timecode**: drop-frame and non-drop conversion for split
//!   boundaries
//! - **Output**: scene metadata JSON and a WebVTT cue track
//! - **Validation**: inspect inputs for structural issues before processing
//! - **Progress**: callbacks per shot, cue and scene
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `load_scene_inputs_async` reads artifacts concurrently via Tokio |
//! | `full` | Enables all of the above |

pub mod artifacts;
pub mod config;
pub mod error;
pub mod format;
pub mod frame;
pub mod progress;
pub mod reduce;
pub mod scene;
pub mod segment;
pub mod segmenter;
pub mod selection;
pub mod similarity;
pub mod timecode;
pub mod validation;

#[cfg(feature = "async")]
pub use artifacts::load_scene_inputs_async;
pub use artifacts::{SceneInputs, load_scene_inputs};
pub use config::{FilterSettings, SegmentationOptions};
pub use error::SegmentationError;
pub use format::{Cue, CueTrack, SceneMetadata, render_scenes};
pub use frame::{EmbeddingRow, FrameRecord, SimilarFrame, SimilarityRow, attach_frame_artifacts};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use reduce::{MergeDirection, ReductionContext, merge_direction, reduce_scenes, shot_similarity};
pub use scene::{KeyFrame, Scene, SceneBuilder, SimilarityRange, build_scenes, prepare_shot_segments};
pub use segment::{
    SegmentationDocument, Segments, ShotSegment, TechnicalCue, TechnicalCueType, Transition,
};
pub use segmenter::{SceneReport, TemporalSegmenter};
pub use selection::{select_frames, select_frames_with_options};
pub use similarity::{PerceptualHash, cosine_similarity, hamming_distance, is_known_blank_hash};
pub use timecode::{FrameRate, TimecodeSettings};
pub use validation::{ValidationReport, validate_inputs};
