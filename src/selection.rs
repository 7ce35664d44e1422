//! Frame selection.
//!
//! Reduces the densely sampled frame list to the frames worth running
//! expensive detectors on. With shot segmentation available, each shot is
//! handled according to the technical cue covering it; without, the asset
//! is cut into fixed windows and scanned for visual change.
//!
//! # Example
//!
//! ```
//! use temporal_scenes::{FrameRecord, select_frames};
//!
//! let frames: Vec<FrameRecord> = (0..10)
//!     .map(|i| FrameRecord::new(format!("frame.{i}.jpg"), i * 25, i * 1_000))
//!     .collect();
//! let selected = select_frames(&frames, None);
//! assert!(selected.len() <= frames.len());
//! ```

use crate::{
    config::SegmentationOptions,
    frame::FrameRecord,
    progress::{OperationType, ProgressTracker},
    segment::{Segments, ShotSegment, TechnicalCueType},
    similarity::hamming_distance,
};

/// Frames further apart than this (normalized Hamming distance) start a new
/// group during an adaptive scan.
pub const HAMMING_DISTANCE_THRESHOLD: f64 = 0.25;

/// Target spacing between selected frames.
pub const SAMPLING_INTERVAL_MS: u64 = 4_000;

/// Window length used when no segmentation is available.
pub const UNSEGMENTED_WINDOW_MS: u64 = 2 * 60 * 1_000;

/// A frame chosen from a slice, with the span it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pick {
    position: usize,
    extend: Option<u64>,
}

impl Pick {
    fn single(position: usize) -> Self {
        Self {
            position,
            extend: None,
        }
    }
}

/// Select representative frames.
///
/// The result is a subset of `frames`, sorted by timestamp. With
/// `segments`, every selected frame carries its shot index and cue type.
pub fn select_frames(frames: &[FrameRecord], segments: Option<&Segments>) -> Vec<FrameRecord> {
    select_frames_with_options(frames, segments, &SegmentationOptions::default())
}

/// Select representative frames, reporting progress shot by shot.
pub fn select_frames_with_options(
    frames: &[FrameRecord],
    segments: Option<&Segments>,
    options: &SegmentationOptions,
) -> Vec<FrameRecord> {
    let mut selected = match segments {
        Some(segments) => select_by_segments(frames, segments, options),
        None => select_unsegmented(frames),
    };

    selected.sort_by_key(|frame| frame.timestamp);
    selected.dedup_by(|a, b| a.name == b.name);

    log::info!("Selected {} of {} frames", selected.len(), frames.len());
    selected
}

fn select_by_segments(
    frames: &[FrameRecord],
    segments: &Segments,
    options: &SegmentationOptions,
) -> Vec<FrameRecord> {
    let mut covered = vec![false; segments.shots.len()];
    let mut selected = Vec::new();
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FrameSelection,
        Some(segments.shots.len() as u64),
        options.batch_size,
    );

    for cue in segments.effective_cues() {
        if cue.partial {
            continue;
        }
        let Some(shots) = cue
            .shot_range
            .and_then(|(first, last)| segments.shots.get(first..=last))
        else {
            continue;
        };

        for shot in shots {
            covered[shot.index] = true;
            selected.extend(select_from_shot(shot, frames, cue.cue_type));
            tracker.advance(Some(shot.index));
        }
    }

    for &index in &segments.unknown_shot_indices {
        let Some(shot) = segments.shot(index) else {
            log::warn!("Unknown shot {index} does not exist; skipping");
            continue;
        };
        if covered[index] {
            continue;
        }
        covered[index] = true;

        log::debug!("Scanning unknown shot #{index:04}");
        selected.extend(select_from_shot(shot, frames, TechnicalCueType::Undefined));
        tracker.advance(Some(index));
    }

    tracker.finish();
    selected
}

fn select_unsegmented(frames: &[FrameRecord]) -> Vec<FrameRecord> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };

    let budget = frame_budget(UNSEGMENTED_WINDOW_MS);
    let mut selected = Vec::new();
    let mut window_start = 0;

    while window_start < frames.len() {
        let window = window_of(first.timestamp, frames[window_start].timestamp);
        let window_end = frames[window_start..]
            .iter()
            .position(|frame| window_of(first.timestamp, frame.timestamp) != window)
            .map_or(frames.len(), |offset| window_start + offset);

        let window_frames = &frames[window_start..window_end];
        selected.extend(
            adaptive_scan(window_frames, budget)
                .into_iter()
                .map(|pick| annotate(&window_frames[pick.position], pick, None)),
        );

        window_start = window_end;
    }

    selected
}

fn window_of(origin: u64, timestamp: u64) -> u64 {
    timestamp.saturating_sub(origin) / UNSEGMENTED_WINDOW_MS
}

/// Frames of a shot, located through its frame-hash range.
pub(crate) fn frames_in_range(
    frames: &[FrameRecord],
    range: Option<(usize, usize)>,
) -> &[FrameRecord] {
    match range {
        Some((first, last)) if first < frames.len() && first <= last => {
            &frames[first..=last.min(frames.len() - 1)]
        }
        _ => &[],
    }
}

fn select_from_shot(
    shot: &ShotSegment,
    frames: &[FrameRecord],
    cue_type: TechnicalCueType,
) -> Vec<FrameRecord> {
    let shot_frames = frames_in_range(frames, shot.frame_range);

    let picks = if shot_frames.len() < 2 {
        shot_frames.first().map(|_| Pick::single(0)).into_iter().collect()
    } else if cue_type.is_steady() {
        vec![Pick::single(sharpest(shot_frames))]
    } else if cue_type == TechnicalCueType::EndCredits {
        fixed_rate(shot_frames, SAMPLING_INTERVAL_MS)
    } else {
        adaptive_scan(shot_frames, frame_budget(shot.duration_ms()))
    };

    log::debug!(
        "shot#{:04} [{cue_type}]: {} of {} frames",
        shot.index,
        picks.len(),
        shot_frames.len()
    );

    picks
        .into_iter()
        .map(|pick| {
            let mut frame = annotate(&shot_frames[pick.position], pick, Some(cue_type));
            frame.shot_idx = Some(shot.index);
            frame
        })
        .collect()
}

fn annotate(frame: &FrameRecord, pick: Pick, cue_type: Option<TechnicalCueType>) -> FrameRecord {
    let mut frame = frame.clone();
    frame.technical_cue_type = cue_type;
    frame.extend_frame_duration = pick.extend;
    frame
}

/// At most one frame per sampling interval, never fewer than one.
fn frame_budget(duration_ms: u64) -> usize {
    ((duration_ms as f64 / SAMPLING_INTERVAL_MS as f64).round() as usize).max(1)
}

/// Position of the frame with the highest Laplacian; the earliest wins ties.
fn sharpest(frames: &[FrameRecord]) -> usize {
    frames
        .iter()
        .enumerate()
        .fold(0, |best, (position, frame)| {
            if frame.laplacian > frames[best].laplacian {
                position
            } else {
                best
            }
        })
}

fn fixed_rate(frames: &[FrameRecord], interval_ms: u64) -> Vec<Pick> {
    let mut picks: Vec<Pick> = Vec::new();
    let mut last_kept: Option<u64> = None;

    for (position, frame) in frames.iter().enumerate() {
        if last_kept.is_none_or(|kept| frame.timestamp >= kept + interval_ms) {
            picks.push(Pick::single(position));
            last_kept = Some(frame.timestamp);
        }
    }

    picks
}

/// Group consecutive frames by visual similarity to the group's first
/// frame and keep one representative per group.
fn adaptive_scan(frames: &[FrameRecord], budget: usize) -> Vec<Pick> {
    if frames.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<(usize, usize)> = Vec::new();
    let mut group_start = 0;
    for position in 1..frames.len() {
        let distance = hamming_distance(
            frames[group_start].hash.as_ref(),
            frames[position].hash.as_ref(),
        );
        if distance > HAMMING_DISTANCE_THRESHOLD {
            groups.push((group_start, position - 1));
            group_start = position;
        }
    }
    groups.push((group_start, frames.len() - 1));

    if frames.len() == 2 && groups.len() == 2 {
        groups = vec![(0, 1)];
    }

    if groups.len() > budget {
        groups.sort_by(|a, b| frames[b.0].laplacian.total_cmp(&frames[a.0].laplacian));
        groups.truncate(budget);
        groups.sort_by_key(|&(start, _)| start);
    }

    groups
        .into_iter()
        .map(|(start, end)| Pick {
            position: start,
            extend: (end > start).then(|| frames[end].timestamp - frames[start].timestamp),
        })
        .collect()
}
