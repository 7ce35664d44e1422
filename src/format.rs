//! Scene output.
//!
//! Renders reduced scenes as the scene metadata document and as a WebVTT
//! track with one cue per scene, suitable for a player's chapter overlay.
//!
//! # Example
//!
//! ```
//! use temporal_scenes::render_scenes;
//!
//! let (metadata, track) = render_scenes(&[], "frames/");
//! assert!(metadata.scenes.is_empty());
//! assert_eq!(track.to_webvtt(), "WEBVTT\n\n");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scene::Scene;

const CUE_SETTINGS: &str = "align:start line:0% position:0% size:40%";

/// The scene metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneMetadata {
    /// Prefix under which the frame images referenced by the scenes live.
    pub frame_prefix: String,
    /// Scenes in time order.
    pub scenes: Vec<Scene>,
}

/// A timed text cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Start time in milliseconds.
    pub start_ms: u64,
    /// End time in milliseconds.
    pub end_ms: u64,
    /// Cue text.
    pub text: String,
}

/// An ordered list of cues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueTrack {
    /// Cues in time order.
    pub cues: Vec<Cue>,
}

impl CueTrack {
    /// Render the track as WebVTT.
    pub fn to_webvtt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CueTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "WEBVTT")?;
        writeln!(f)?;

        for (index, cue) in self.cues.iter().enumerate() {
            writeln!(f, "{index}")?;
            writeln!(
                f,
                "{} --> {} {CUE_SETTINGS}",
                format_vtt_timestamp(cue.start_ms),
                format_vtt_timestamp(cue.end_ms),
            )?;
            writeln!(f, "{}", cue.text)?;
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Build the metadata document and cue track for reduced scenes.
pub fn render_scenes(scenes: &[Scene], frame_prefix: &str) -> (SceneMetadata, CueTrack) {
    let cues = scenes
        .iter()
        .map(|scene| Cue {
            start_ms: scene.time_start,
            end_ms: scene.time_end,
            text: format!(
                "Scene {:03} ({})",
                scene.scene_no,
                format_hhmmss(scene.duration)
            ),
        })
        .collect();

    let metadata = SceneMetadata {
        frame_prefix: frame_prefix.to_string(),
        scenes: scenes.to_vec(),
    };

    (metadata, CueTrack { cues })
}

/// Format milliseconds as `HH:MM:SS`, dropping the fraction.
pub fn format_hhmmss(milliseconds: u64) -> String {
    let total_secs = milliseconds / 1_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Format milliseconds as a WebVTT timestamp (`HH:MM:SS.mmm`).
pub fn format_vtt_timestamp(milliseconds: u64) -> String {
    let millis = milliseconds % 1_000;
    format!("{}.{millis:03}", format_hhmmss(milliseconds))
}
