//! Input validation.
//!
//! Provides [`validate_inputs`], which inspects the frame-hash list and the
//! raw segmentation document before any processing and returns a
//! [`ValidationReport`] describing the inputs and any problems with them.
//!
//! # Example
//!
//! ```
//! use temporal_scenes::{FrameRecord, validate_inputs};
//!
//! let frames = vec![
//!     FrameRecord::new("frame.0000000.jpg", 0, 0),
//!     FrameRecord::new("frame.0000001.jpg", 25, 1_000),
//! ];
//! let report = validate_inputs(&frames, None);
//! if report.is_valid() {
//!     println!("Inputs are valid");
//! } else {
//!     for error in &report.errors {
//!         println!("Error: {error}");
//!     }
//! }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    frame::FrameRecord,
    segment::{SegmentKind, SegmentationDocument},
    timecode::FrameRate,
};

/// Summary of input validation.
///
/// Contains lists of informational notices, warnings, and errors found during
/// validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that degrade selection or scene quality.
    pub warnings: Vec<String>,
    /// Fatal issues that will make processing fail.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    ///
    /// Warnings do not affect this result, only errors make the report
    /// invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check a frame-hash list and, optionally, the segmentation document that
/// goes with it.
pub fn validate_inputs(
    frames: &[FrameRecord],
    document: Option<&SegmentationDocument>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    // ── Frames ─────────────────────────────────────────────────────
    if frames.is_empty() {
        report
            .warnings
            .push("Frame list is empty; nothing will be selected".to_string());
    }

    if let Some(position) = frames
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        report.errors.push(format!(
            "Frame timestamps must increase: {} ({} ms) follows {} ({} ms)",
            frames[position + 1].name,
            frames[position + 1].timestamp,
            frames[position].name,
            frames[position].timestamp,
        ));
    }

    let unhashed = frames.iter().filter(|frame| frame.hash.is_none()).count();
    if unhashed > 0 {
        report.warnings.push(format!(
            "{unhashed} of {} frames have no perceptual hash; they never start a new group",
            frames.len(),
        ));
    }

    if let (Some(first), Some(last)) = (frames.first(), frames.last()) {
        report.info.push(format!(
            "Frames: {} spanning {} - {} ms",
            frames.len(),
            first.timestamp,
            last.timestamp,
        ));
    }

    let Some(document) = document else {
        report
            .info
            .push("No segmentation; frames will be selected in fixed windows".to_string());
        return report;
    };

    // ── Shots ──────────────────────────────────────────────────────
    let mut shot_indices: Vec<usize> = Vec::new();
    for record in &document.segments {
        if record.kind != SegmentKind::Shot {
            continue;
        }
        let index = record
            .shot_segment
            .map_or(shot_indices.len(), |info| info.index);
        shot_indices.push(index);

        if let Some([first, last]) = record.frame_range
            && (first > last || last >= frames.len())
        {
            report.warnings.push(format!(
                "Shot {index} frame range [{first}, {last}] exceeds the {} available frames",
                frames.len(),
            ));
        }
    }
    shot_indices.sort_unstable();

    if let Some((position, &index)) = shot_indices
        .iter()
        .enumerate()
        .find(|&(position, &index)| position != index)
    {
        report.errors.push(format!(
            "Shot indices must be dense from zero: position {position} holds shot {index}",
        ));
    }
    let shot_count = shot_indices.len();

    // ── Technical cues ─────────────────────────────────────────────
    let mut cue_count = 0;
    for record in &document.segments {
        if record.kind != SegmentKind::TechnicalCue {
            continue;
        }
        cue_count += 1;

        if let Some([first, last]) = record.shot_segment_range
            && (first > last || last >= shot_count)
        {
            let cue_type = record
                .technical_cue_segment
                .map(|info| info.cue_type)
                .unwrap_or_default();
            report.errors.push(format!(
                "{cue_type} cue covers shots [{first}, {last}] but only {shot_count} shots exist",
            ));
        }
    }

    for &index in &document.unknown_segments {
        if index >= shot_count {
            report
                .warnings
                .push(format!("Unknown shot {index} has no matching shot segment"));
        }
    }

    report.info.push(format!(
        "Segmentation: {shot_count} shots, {cue_count} technical cues, {} unknown shots",
        document.unknown_segments.len(),
    ));

    // ── Frame rate ─────────────────────────────────────────────────
    match document
        .video_metadata
        .first()
        .and_then(|metadata| metadata.frame_rate)
    {
        None => report.warnings.push(
            "No frame rate in video metadata; shots cannot be split at black transitions"
                .to_string(),
        ),
        Some(rate) => match FrameRate::from_fps(rate) {
            Ok(frame_rate) => report.info.push(format!("Frame rate: {frame_rate:?}")),
            Err(_) => report.warnings.push(format!(
                "Unsupported frame rate {rate}; shots cannot be split at black transitions"
            )),
        },
    }

    report
}
