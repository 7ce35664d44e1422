//! Shot and technical-cue segmentation.
//!
//! The upstream shot detector emits a [`SegmentationDocument`]: a flat list
//! of `SHOT` and `TECHNICAL_CUE` records with PascalCase fields, annotated
//! with frame ranges, fade flags and black transitions. [`Segments`] is the
//! validated, typed view the rest of the engine works on.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::{
    error::SegmentationError,
    timecode::{FrameRate, TimecodeSettings},
};

/// Kind of technical cue covering a shot range.
///
/// Names outside the known set deserialize as [`TechnicalCueType::Undefined`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum TechnicalCueType {
    /// Programme content.
    Content,
    /// Colour bars.
    ColorBars,
    /// Black frames.
    BlackFrames,
    /// Studio or network logo.
    StudioLogo,
    /// Slate card.
    Slate,
    /// End credits.
    EndCredits,
    /// Opening credits.
    OpeningCredits,
    /// No cue information.
    #[default]
    Undefined,
}

impl TechnicalCueType {
    /// Cue types that show a single static picture.
    pub fn is_steady(self) -> bool {
        matches!(
            self,
            TechnicalCueType::ColorBars
                | TechnicalCueType::BlackFrames
                | TechnicalCueType::StudioLogo
                | TechnicalCueType::Slate
        )
    }

    /// Wire name of the cue type.
    pub fn as_str(self) -> &'static str {
        match self {
            TechnicalCueType::Content => "Content",
            TechnicalCueType::ColorBars => "ColorBars",
            TechnicalCueType::BlackFrames => "BlackFrames",
            TechnicalCueType::StudioLogo => "StudioLogo",
            TechnicalCueType::Slate => "Slate",
            TechnicalCueType::EndCredits => "EndCredits",
            TechnicalCueType::OpeningCredits => "OpeningCredits",
            TechnicalCueType::Undefined => "undefined",
        }
    }
}

impl From<String> for TechnicalCueType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Content" => TechnicalCueType::Content,
            "ColorBars" => TechnicalCueType::ColorBars,
            "BlackFrames" => TechnicalCueType::BlackFrames,
            "StudioLogo" => TechnicalCueType::StudioLogo,
            "Slate" => TechnicalCueType::Slate,
            "EndCredits" => TechnicalCueType::EndCredits,
            "OpeningCredits" => TechnicalCueType::OpeningCredits,
            "undefined" => TechnicalCueType::Undefined,
            other => {
                log::warn!("Unsupported technical cue type {other:?}, treating as undefined");
                TechnicalCueType::Undefined
            }
        }
    }
}

impl From<TechnicalCueType> for &'static str {
    fn from(value: TechnicalCueType) -> Self {
        value.as_str()
    }
}

impl Display for TechnicalCueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

// ── Wire format ────────────────────────────────────────────────────

/// Segmentation artifact as written by the shot detector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentationDocument {
    /// Shot and technical-cue records in time order.
    #[serde(default)]
    pub segments: Vec<SegmentRecord>,
    /// Shots the detector could not attribute to any technical cue.
    #[serde(default)]
    pub unknown_segments: Vec<usize>,
    /// Stream metadata; the first entry carries the frame rate.
    #[serde(default)]
    pub video_metadata: Vec<VideoMetadata>,
}

/// Discriminator of a [`SegmentRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentKind {
    /// A shot.
    Shot,
    /// A technical cue.
    TechnicalCue,
}

/// One record of the segmentation artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentRecord {
    /// Record kind.
    #[serde(rename = "Type")]
    pub kind: SegmentKind,
    /// Start time in milliseconds.
    #[serde(default)]
    pub start_timestamp_millis: u64,
    /// End time in milliseconds.
    #[serde(default)]
    pub end_timestamp_millis: u64,
    /// First frame number.
    #[serde(default)]
    pub start_frame_number: u64,
    /// Last frame number.
    #[serde(default)]
    pub end_frame_number: u64,
    /// SMPTE start timecode.
    #[serde(default, rename = "StartTimecodeSMPTE")]
    pub start_timecode_smpte: String,
    /// SMPTE end timecode.
    #[serde(default, rename = "EndTimecodeSMPTE")]
    pub end_timecode_smpte: String,
    /// Shot details, present on `SHOT` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_segment: Option<ShotSegmentInfo>,
    /// Cue details, present on `TECHNICAL_CUE` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_cue_segment: Option<TechnicalCueInfo>,
    /// Inclusive `[first, last]` positions in the frame-hash list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_range: Option<[usize; 2]>,
    /// Shot opens from black.
    #[serde(default)]
    pub fade_in_black: bool,
    /// Shot closes to black.
    #[serde(default)]
    pub fade_out_black: bool,
    /// Black transition inside the shot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_black: Option<Transition>,
    /// Inclusive `[first, last]` shot indices covered by a cue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_segment_range: Option<[usize; 2]>,
    /// Cue lies inside a single shot.
    #[serde(default)]
    pub partial_shot_segment: bool,
}

/// Shot details of a segment record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShotSegmentInfo {
    /// Dense shot index.
    pub index: usize,
}

/// Cue details of a segment record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TechnicalCueInfo {
    /// Cue type.
    #[serde(rename = "Type", default)]
    pub cue_type: TechnicalCueType,
}

/// A black transition detected inside a shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transition {
    /// Transition time in milliseconds.
    pub timestamp_millis: u64,
    /// Transition frame number.
    pub frame_number: u64,
    /// Transition SMPTE timecode.
    #[serde(rename = "TimecodeSMPTE")]
    pub timecode_smpte: String,
}

/// Stream metadata entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideoMetadata {
    /// Measured frames per second.
    #[serde(default)]
    pub frame_rate: Option<f64>,
}

// ── Typed view ─────────────────────────────────────────────────────

/// A detected shot: a continuous camera take.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSegment {
    /// Dense shot index.
    pub index: usize,
    /// Start time in milliseconds.
    pub start_time_ms: u64,
    /// End time in milliseconds.
    pub end_time_ms: u64,
    /// First frame number.
    pub start_frame_no: u64,
    /// Last frame number.
    pub end_frame_no: u64,
    /// SMPTE start timecode.
    pub smpte_start: String,
    /// SMPTE end timecode.
    pub smpte_end: String,
    /// Inclusive positions of the shot's frames in the frame-hash list.
    pub frame_range: Option<(usize, usize)>,
    /// Shot opens from black.
    pub fade_in_black: bool,
    /// Shot closes to black.
    pub fade_out_black: bool,
    /// Black transition inside the shot.
    pub transition_black: Option<Transition>,
    /// Positions of the shot's selected frames in the selected frame list.
    /// Filled by the scene builder.
    pub frames: Vec<usize>,
    /// Shots whose frames are reachable through similar-frame edges.
    /// Filled by the scene builder.
    pub similar_shot_segments: Vec<usize>,
}

impl ShotSegment {
    /// Create a shot spanning `[start_time_ms, end_time_ms]`.
    pub fn new(index: usize, start_time_ms: u64, end_time_ms: u64) -> Self {
        Self {
            index,
            start_time_ms,
            end_time_ms,
            start_frame_no: 0,
            end_frame_no: 0,
            smpte_start: String::new(),
            smpte_end: String::new(),
            frame_range: None,
            fade_in_black: false,
            fade_out_black: false,
            transition_black: None,
            frames: Vec::new(),
            similar_shot_segments: Vec::new(),
        }
    }

    /// Set the first and last frame numbers.
    #[must_use]
    pub fn with_frame_numbers(mut self, start: u64, end: u64) -> Self {
        self.start_frame_no = start;
        self.end_frame_no = end;
        self
    }

    /// Set the SMPTE timecodes.
    #[must_use]
    pub fn with_timecodes(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.smpte_start = start.into();
        self.smpte_end = end.into();
        self
    }

    /// Set the frame-hash range of the shot.
    #[must_use]
    pub fn with_frame_range(mut self, first: usize, last: usize) -> Self {
        self.frame_range = Some((first, last));
        self
    }

    /// Mark the shot as opening from black.
    #[must_use]
    pub fn with_fade_in(mut self) -> Self {
        self.fade_in_black = true;
        self
    }

    /// Mark the shot as closing to black.
    #[must_use]
    pub fn with_fade_out(mut self) -> Self {
        self.fade_out_black = true;
        self
    }

    /// Attach a black transition.
    #[must_use]
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition_black = Some(transition);
        self
    }

    /// Shot length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    fn from_record(record: &SegmentRecord, index: usize) -> Self {
        Self {
            index,
            start_time_ms: record.start_timestamp_millis,
            end_time_ms: record.end_timestamp_millis,
            start_frame_no: record.start_frame_number,
            end_frame_no: record.end_frame_number,
            smpte_start: record.start_timecode_smpte.clone(),
            smpte_end: record.end_timecode_smpte.clone(),
            frame_range: record.frame_range.map(|[first, last]| (first.min(last), first.max(last))),
            fade_in_black: record.fade_in_black,
            fade_out_black: record.fade_out_black,
            transition_black: record.transition_black.clone(),
            frames: Vec::new(),
            similar_shot_segments: Vec::new(),
        }
    }
}

/// A technical cue: a classified span of shots.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalCue {
    /// Cue type.
    pub cue_type: TechnicalCueType,
    /// Inclusive range of shot indices the cue covers.
    pub shot_range: Option<(usize, usize)>,
    /// The cue lies inside one shot and carries its own boundaries.
    pub partial: bool,
    /// Start time in milliseconds.
    pub start_time_ms: u64,
    /// End time in milliseconds.
    pub end_time_ms: u64,
    /// First frame number.
    pub start_frame_no: u64,
    /// Last frame number.
    pub end_frame_no: u64,
    /// SMPTE start timecode.
    pub smpte_start: String,
    /// SMPTE end timecode.
    pub smpte_end: String,
}

impl TechnicalCue {
    /// Create a cue over an inclusive shot range.
    pub fn new(cue_type: TechnicalCueType, shot_range: Option<(usize, usize)>) -> Self {
        Self {
            cue_type,
            shot_range,
            partial: false,
            start_time_ms: 0,
            end_time_ms: 0,
            start_frame_no: 0,
            end_frame_no: 0,
            smpte_start: String::new(),
            smpte_end: String::new(),
        }
    }

    /// Mark the cue as lying inside one shot, with its own boundaries.
    #[must_use]
    pub fn with_partial_bounds(
        mut self,
        (start_time_ms, end_time_ms): (u64, u64),
        (start_frame_no, end_frame_no): (u64, u64),
        (smpte_start, smpte_end): (&str, &str),
    ) -> Self {
        self.partial = true;
        self.start_time_ms = start_time_ms;
        self.end_time_ms = end_time_ms;
        self.start_frame_no = start_frame_no;
        self.end_frame_no = end_frame_no;
        self.smpte_start = smpte_start.to_string();
        self.smpte_end = smpte_end.to_string();
        self
    }

    fn from_record(record: &SegmentRecord) -> Self {
        Self {
            cue_type: record
                .technical_cue_segment
                .map(|info| info.cue_type)
                .unwrap_or_default(),
            shot_range: record
                .shot_segment_range
                .map(|[first, last]| (first.min(last), first.max(last))),
            partial: record.partial_shot_segment,
            start_time_ms: record.start_timestamp_millis,
            end_time_ms: record.end_timestamp_millis,
            start_frame_no: record.start_frame_number,
            end_frame_no: record.end_frame_number,
            smpte_start: record.start_timecode_smpte.clone(),
            smpte_end: record.end_timecode_smpte.clone(),
        }
    }
}

/// Validated shots and cues of one asset.
#[derive(Debug, Clone, Default)]
pub struct Segments {
    /// Shots, positioned by index.
    pub shots: Vec<ShotSegment>,
    /// Technical cues in time order.
    pub technical_cues: Vec<TechnicalCue>,
    /// Shots not attributed to any cue.
    pub unknown_shot_indices: Vec<usize>,
    /// Timecode settings, when the asset frame rate is known.
    pub timecode: Option<TimecodeSettings>,
}

impl Segments {
    /// Assemble segments from already-typed parts.
    ///
    /// # Errors
    ///
    /// Same checks as [`from_document`](Self::from_document).
    pub fn new(
        shots: Vec<ShotSegment>,
        technical_cues: Vec<TechnicalCue>,
        unknown_shot_indices: Vec<usize>,
        timecode: Option<TimecodeSettings>,
    ) -> Result<Self, SegmentationError> {
        for (position, shot) in shots.iter().enumerate() {
            if shot.index != position {
                return Err(SegmentationError::NonContiguousShots {
                    position,
                    index: shot.index,
                });
            }
        }

        for cue in &technical_cues {
            if let Some((_, last)) = cue.shot_range
                && last >= shots.len()
            {
                return Err(SegmentationError::ShotOutOfRange {
                    shot_index: last,
                    shot_count: shots.len(),
                });
            }
        }

        Ok(Self {
            shots,
            technical_cues,
            unknown_shot_indices,
            timecode,
        })
    }

    /// Split a segmentation artifact into shots and cues.
    ///
    /// Drop-frame counting is detected from the first record's start
    /// timecode. A missing or unsupported frame rate leaves
    /// [`timecode`](Self::timecode) unset.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::NonContiguousShots`] when shot indices
    /// are not dense from zero and [`SegmentationError::ShotOutOfRange`] when
    /// a cue points past the last shot.
    pub fn from_document(document: &SegmentationDocument) -> Result<Self, SegmentationError> {
        let mut shots = Vec::new();
        let mut technical_cues = Vec::new();

        for record in &document.segments {
            match record.kind {
                SegmentKind::Shot => {
                    let index = record.shot_segment.map(|info| info.index).unwrap_or(shots.len());
                    shots.push(ShotSegment::from_record(record, index));
                }
                SegmentKind::TechnicalCue => technical_cues.push(TechnicalCue::from_record(record)),
            }
        }

        shots.sort_by_key(|shot| shot.index);
        technical_cues.sort_by_key(|cue| cue.start_time_ms);

        let drop_frame = document
            .segments
            .first()
            .is_some_and(|record| record.start_timecode_smpte.contains(';'));

        let timecode = match document.video_metadata.first().and_then(|meta| meta.frame_rate) {
            Some(rate) => match FrameRate::from_fps(rate) {
                Ok(frame_rate) => Some(TimecodeSettings::new(frame_rate, drop_frame)),
                Err(error) => {
                    log::warn!("{error}; transition splits will be unavailable");
                    None
                }
            },
            None => None,
        };

        log::debug!(
            "Loaded {} shots, {} technical cues, {} unknown shots",
            shots.len(),
            technical_cues.len(),
            document.unknown_segments.len()
        );

        Self::new(
            shots,
            technical_cues,
            document.unknown_segments.clone(),
            timecode,
        )
    }

    /// Technical cues, or one synthetic [`TechnicalCueType::Undefined`] cue
    /// per shot when the detector produced none.
    pub fn effective_cues(&self) -> Vec<TechnicalCue> {
        if !self.technical_cues.is_empty() {
            return self.technical_cues.clone();
        }

        self.shots
            .iter()
            .map(|shot| {
                TechnicalCue::new(TechnicalCueType::Undefined, Some((shot.index, shot.index)))
            })
            .collect()
    }

    /// Look up a shot by index.
    pub fn shot(&self, index: usize) -> Option<&ShotSegment> {
        self.shots.get(index)
    }
}
