//! Scene construction.
//!
//! A scene is a run of shots that belong together: bounded by black fades,
//! technical cue changes, or a gap in visual similarity. [`SceneBuilder`]
//! attaches selected frames to shots, relates shots through similar-frame
//! edges, and walks the technical cues to emit provisional scenes. The
//! [`reduce`](crate::reduce) stage then merges and numbers them.
//!
//! # Example
//!
//! ```
//! use temporal_scenes::{
//!     SceneBuilder, Segments, SegmentationOptions, ShotSegment, TechnicalCue, TechnicalCueType,
//! };
//!
//! let shots = vec![ShotSegment::new(0, 0, 4_000), ShotSegment::new(1, 4_000, 9_000)];
//! let cues = vec![TechnicalCue::new(TechnicalCueType::ColorBars, Some((0, 1)))];
//! let segments = Segments::new(shots, cues, Vec::new(), None)?;
//!
//! let options = SegmentationOptions::new();
//! let builder = SceneBuilder::new(&segments, &[], &options);
//! let scenes = builder.build()?;
//! assert_eq!(scenes.len(), 1);
//! assert_eq!(scenes[0].duration, 9_000);
//! # Ok::<(), temporal_scenes::SegmentationError>(())
//! ```

use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    config::{FilterSettings, SegmentationOptions},
    error::SegmentationError,
    frame::FrameRecord,
    progress::{NoOpProgress, OperationType, ProgressTracker},
    segment::{Segments, ShotSegment, TechnicalCue, TechnicalCueType},
};

/// Scene number carried by a scene until the reducer numbers it.
pub const PROVISIONAL_SCENE_NO: i64 = -1;

/// Thumbnail frame of a scene boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum KeyFrame {
    /// No frame found yet.
    #[default]
    Unresolved,
    /// Frame image name.
    Resolved(String),
}

impl KeyFrame {
    /// Returns `true` while no frame is known.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, KeyFrame::Unresolved)
    }

    /// The frame name, if resolved.
    pub fn name(&self) -> Option<&str> {
        match self {
            KeyFrame::Resolved(name) => Some(name),
            KeyFrame::Unresolved => None,
        }
    }
}

impl From<Option<String>> for KeyFrame {
    fn from(value: Option<String>) -> Self {
        value.map_or(KeyFrame::Unresolved, KeyFrame::Resolved)
    }
}

impl From<KeyFrame> for Option<String> {
    fn from(value: KeyFrame) -> Self {
        match value {
            KeyFrame::Resolved(name) => Some(name),
            KeyFrame::Unresolved => None,
        }
    }
}

/// Minimum and maximum cosine similarity between the frames of two shots.
///
/// Serialized as `[min, max]`; `[-1, -1]` when either shot has no
/// embeddings to compare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct SimilarityRange {
    /// Lowest pairwise similarity.
    pub min: f64,
    /// Highest pairwise similarity.
    pub max: f64,
}

impl SimilarityRange {
    /// No comparison was possible.
    pub const UNAVAILABLE: Self = Self {
        min: -1.0,
        max: -1.0,
    };
}

impl Default for SimilarityRange {
    fn default() -> Self {
        Self::UNAVAILABLE
    }
}

impl From<[f64; 2]> for SimilarityRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<SimilarityRange> for [f64; 2] {
    fn from(value: SimilarityRange) -> Self {
        [value.min, value.max]
    }
}

/// A contiguous run of shots forming one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Position in the final ordering, [`PROVISIONAL_SCENE_NO`] until numbered.
    pub scene_no: i64,
    /// First shot index.
    pub shot_start: usize,
    /// First frame number.
    pub frame_start: u64,
    /// Start time in milliseconds.
    pub time_start: u64,
    /// SMPTE start timecode.
    pub smpte_start: String,
    /// Thumbnail of the first shot.
    #[serde(default, skip_serializing_if = "KeyFrame::is_unresolved")]
    pub key_start: KeyFrame,
    /// Last shot index.
    pub shot_end: usize,
    /// Last frame number.
    pub frame_end: u64,
    /// End time in milliseconds.
    pub time_end: u64,
    /// SMPTE end timecode.
    pub smpte_end: String,
    /// Thumbnail of the last shot.
    #[serde(default, skip_serializing_if = "KeyFrame::is_unresolved")]
    pub key_end: KeyFrame,
    /// `time_end - time_start`.
    pub duration: u64,
    /// Cue type the scene was built under.
    pub technical_cue_type: TechnicalCueType,
    /// Scene opens from black.
    #[serde(default)]
    pub fade_in_black: bool,
    /// Scene closes to black.
    #[serde(default)]
    pub fade_out_black: bool,
    /// Similarity between the shot before the scene and its first shot.
    #[serde(default)]
    pub sim_start: SimilarityRange,
    /// Similarity between the scene's last shot and the shot after it.
    #[serde(default)]
    pub sim_end: SimilarityRange,
    /// Reduction group. Scenes are only merged with scenes of the same
    /// group; content scenes without one share a single group.
    ///
    /// Set per content cue, and shared by the per-shot cues synthesized for
    /// an asset without technical cues. Cleared once scenes are reduced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue_group: Option<usize>,
}

impl Scene {
    /// Merge a later scene into this one.
    ///
    /// Start fields, number, cue type and fade-in come from `self`; end
    /// fields and fade-out from `later`.
    pub fn merged(&self, later: &Scene) -> Scene {
        Scene {
            shot_end: later.shot_end,
            frame_end: later.frame_end,
            time_end: later.time_end,
            smpte_end: later.smpte_end.clone(),
            key_end: later.key_end.clone(),
            duration: later.time_end.saturating_sub(self.time_start),
            fade_out_black: later.fade_out_black,
            sim_start: SimilarityRange::UNAVAILABLE,
            sim_end: SimilarityRange::UNAVAILABLE,
            ..self.clone()
        }
    }

    /// Returns `true` when the scene covers a single shot.
    pub fn is_single_shot(&self) -> bool {
        self.shot_start == self.shot_end
    }

    fn from_spans(
        cue_type: TechnicalCueType,
        first: &ShotSpan,
        last: &ShotSpan,
        frames: &[FrameRecord],
    ) -> Scene {
        let key_of = |position: Option<&usize>| -> KeyFrame {
            position
                .and_then(|&position| frames.get(position))
                .map(|frame| frame.name.clone())
                .into()
        };

        Scene {
            scene_no: PROVISIONAL_SCENE_NO,
            shot_start: first.index,
            frame_start: first.start_frame,
            time_start: first.start_time,
            smpte_start: first.smpte_start.clone(),
            key_start: key_of(first.frames.first()),
            shot_end: last.index,
            frame_end: last.end_frame,
            time_end: last.end_time,
            smpte_end: last.smpte_end.clone(),
            key_end: key_of(last.frames.last()),
            duration: last.end_time.saturating_sub(first.start_time),
            technical_cue_type: cue_type,
            fade_in_black: first.fade_in_black,
            fade_out_black: last.fade_out_black,
            sim_start: SimilarityRange::UNAVAILABLE,
            sim_end: SimilarityRange::UNAVAILABLE,
            cue_group: None,
        }
    }
}

/// A shot, or one half of a shot split at a black transition.
#[derive(Debug, Clone)]
struct ShotSpan {
    index: usize,
    start_time: u64,
    end_time: u64,
    start_frame: u64,
    end_frame: u64,
    smpte_start: String,
    smpte_end: String,
    fade_in_black: bool,
    fade_out_black: bool,
    frames: Vec<usize>,
}

impl From<&ShotSegment> for ShotSpan {
    fn from(shot: &ShotSegment) -> Self {
        Self {
            index: shot.index,
            start_time: shot.start_time_ms,
            end_time: shot.end_time_ms,
            start_frame: shot.start_frame_no,
            end_frame: shot.end_frame_no,
            smpte_start: shot.smpte_start.clone(),
            smpte_end: shot.smpte_end.clone(),
            fade_in_black: shot.fade_in_black,
            fade_out_black: shot.fade_out_black,
            frames: shot.frames.clone(),
        }
    }
}

/// Split `items` into runs delimited by black fades.
///
/// An item that fades in closes the open run and starts a new one; an item
/// that fades out closes the run it belongs to.
pub(crate) fn fade_groups<T>(
    items: &[T],
    fades_in: impl Fn(&T) -> bool,
    fades_out: impl Fn(&T) -> bool,
) -> Vec<RangeInclusive<usize>> {
    let mut groups = Vec::new();
    let mut open: Option<usize> = None;

    for (position, item) in items.iter().enumerate() {
        if fades_in(item)
            && let Some(start) = open.take()
        {
            groups.push(start..=position - 1);
        }

        let start = *open.get_or_insert(position);

        if fades_out(item) {
            groups.push(start..=position);
            open = None;
        }
    }

    if let Some(start) = open {
        groups.push(start..=items.len() - 1);
    }

    groups
}

/// Attach selected frames to shots and relate shots through similar-frame
/// edges.
///
/// Frames are matched to shots by `shot_idx` in one forward pass, so both
/// lists must be in time order.
pub fn prepare_shot_segments(
    segments: &Segments,
    frames: &[FrameRecord],
    settings: &FilterSettings,
) -> Vec<ShotSegment> {
    let mut tracker = ProgressTracker::new(
        Arc::new(NoOpProgress),
        OperationType::ShotPreparation,
        None,
        1,
    );
    prepare_shots(segments, frames, settings, &mut tracker)
}

fn prepare_shots(
    segments: &Segments,
    frames: &[FrameRecord],
    settings: &FilterSettings,
    tracker: &mut ProgressTracker,
) -> Vec<ShotSegment> {
    let mut shots = segments.shots.clone();
    let mut cursor = 0;

    for shot in &mut shots {
        shot.frames.clear();
        while cursor < frames.len() {
            match frames[cursor].shot_idx {
                Some(index) if index > shot.index => break,
                Some(index) if index == shot.index => shot.frames.push(cursor),
                _ => {}
            }
            cursor += 1;
        }
    }

    for shot in &mut shots {
        shot.similar_shot_segments = similar_shot_segments(&shot.frames, frames, settings);
        tracker.advance(Some(shot.index));
    }

    shots
}

/// Shots reachable from `seeds` through similar-frame edges that are
/// similar enough and close enough in time.
fn similar_shot_segments(
    seeds: &[usize],
    frames: &[FrameRecord],
    settings: &FilterSettings,
) -> Vec<usize> {
    let mut visited = vec![false; frames.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();

    for &seed in seeds {
        if seed < frames.len() && !visited[seed] {
            visited[seed] = true;
            queue.push_back(seed);
        }
    }

    while let Some(position) = queue.pop_front() {
        let timestamp = frames[position].timestamp;

        for edge in &frames[position].similar_frames {
            if edge.similarity < settings.min_frame_similarity()
                || edge.index >= frames.len()
                || visited[edge.index]
            {
                continue;
            }
            if frames[edge.index].timestamp.abs_diff(timestamp) <= settings.max_time_distance() {
                visited[edge.index] = true;
                queue.push_back(edge.index);
            }
        }
    }

    let mut shots: Vec<usize> = visited
        .iter()
        .zip(frames)
        .filter(|(visited, _)| **visited)
        .filter_map(|(_, frame)| frame.shot_idx)
        .collect();
    shots.sort_unstable();
    shots.dedup();
    shots
}

/// Builds provisional scenes from prepared shots and technical cues.
pub struct SceneBuilder<'a> {
    segments: &'a Segments,
    frames: &'a [FrameRecord],
    shots: Vec<ShotSegment>,
    options: &'a SegmentationOptions,
}

impl<'a> SceneBuilder<'a> {
    /// Prepare shots for scene building.
    ///
    /// `frames` are the selected frames with embeddings and neighbours
    /// attached.
    pub fn new(
        segments: &'a Segments,
        frames: &'a [FrameRecord],
        options: &'a SegmentationOptions,
    ) -> Self {
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::ShotPreparation,
            Some(segments.shots.len() as u64),
            options.batch_size,
        );
        let shots = prepare_shots(segments, frames, &options.filter, &mut tracker);
        tracker.finish();

        Self {
            segments,
            frames,
            shots,
            options,
        }
    }

    /// Shots with frames and similar shots attached.
    pub fn shots(&self) -> &[ShotSegment] {
        &self.shots
    }

    /// Consume the builder, keeping the prepared shots.
    pub fn into_shots(self) -> Vec<ShotSegment> {
        self.shots
    }

    /// Build provisional, unordered scenes.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::InvalidTransition`] or
    /// [`SegmentationError::MissingTimecodeSettings`] when a shot cannot be
    /// split at its black transition.
    pub fn build(&self) -> Result<Vec<Scene>, SegmentationError> {
        let cues = self.segments.effective_cues();
        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::SceneBuilding,
            Some(cues.len() as u64),
            self.options.batch_size,
        );

        // Synthesized per-shot cues reduce as one range.
        let shared_group = self
            .segments
            .technical_cues
            .is_empty()
            .then_some(cues.len());

        let mut scenes = Vec::new();
        for (cue_index, cue) in cues.iter().enumerate() {
            let Some((first, last)) = cue.shot_range else {
                log::debug!("Skipping {} cue without shot range", cue.cue_type);
                tracker.advance(None);
                continue;
            };

            let mut built = if cue.cue_type == TechnicalCueType::Content {
                self.content_scenes(cue_index, first, last)?
            } else if cue.partial {
                self.partial_cue_scene(cue, first).into_iter().collect()
            } else {
                self.scene_items(cue.cue_type, first, last)?
            };
            if let Some(group) = shared_group {
                for item in &mut built {
                    item.cue_group = Some(group);
                }
            }

            log::debug!(
                "[{}] shots {first}-{last}: {} scene(s)",
                cue.cue_type,
                built.len()
            );
            scenes.extend(built);
            tracker.advance(Some(first));
        }

        let unknown = self.unknown_scenes(&scenes)?;
        scenes.extend(unknown);
        tracker.finish();

        Ok(scenes)
    }

    fn content_scenes(
        &self,
        cue_index: usize,
        first: usize,
        last: usize,
    ) -> Result<Vec<Scene>, SegmentationError> {
        let mut scenes = Vec::new();
        let Some(shots) = self.shots.get(first..=last) else {
            return Ok(scenes);
        };

        for group in fade_groups(shots, |s| s.fade_in_black, |s| s.fade_out_black) {
            let group_last = first + group.end();
            let mut current = first + group.start();

            while current <= group_last {
                let reached = self.scan_related_shots(current, group_last);
                let mut items = self.scene_items(TechnicalCueType::Content, current, reached)?;
                for item in &mut items {
                    item.cue_group = Some(cue_index);
                }
                scenes.extend(items);
                current = reached + 1;
            }
        }

        Ok(scenes)
    }

    /// Walk forward over the shots related to `current` and return the last
    /// one still belonging to the same scene.
    fn scan_related_shots(&self, current: usize, group_last: usize) -> usize {
        let mut related: Vec<usize> = std::iter::once(current)
            .chain(
                self.shots[current]
                    .similar_shot_segments
                    .iter()
                    .copied()
                    .filter(|&index| index > current && index <= group_last),
            )
            .collect();
        related.sort_unstable();
        related.dedup();

        let mut previous = &self.shots[current];
        if previous.fade_out_black {
            return previous.index;
        }

        let max_gap = self.options.filter.max_time_distance();
        for &index in &related[1..] {
            let shot = &self.shots[index];
            if shot.fade_out_black {
                return shot.index;
            }
            if shot.start_time_ms.saturating_sub(previous.end_time_ms) > max_gap {
                return previous.index;
            }
            previous = shot;
        }

        previous.index
    }

    fn partial_cue_scene(&self, cue: &TechnicalCue, first: usize) -> Option<Scene> {
        let shot = self.shots.get(first)?;
        let span = ShotSpan {
            index: shot.index,
            start_time: cue.start_time_ms,
            end_time: cue.end_time_ms,
            start_frame: cue.start_frame_no,
            end_frame: cue.end_frame_no,
            smpte_start: cue.smpte_start.clone(),
            smpte_end: cue.smpte_end.clone(),
            fade_in_black: false,
            fade_out_black: false,
            frames: Vec::new(),
        };

        Some(Scene::from_spans(cue.cue_type, &span, &span, self.frames))
    }

    /// Scenes over `[first, last]`, cut after every black transition unless
    /// the cue type is a single static picture.
    fn scene_items(
        &self,
        cue_type: TechnicalCueType,
        first: usize,
        last: usize,
    ) -> Result<Vec<Scene>, SegmentationError> {
        let Some(shots) = self.shots.get(first..=last) else {
            return Ok(Vec::new());
        };
        let (Some(head), Some(tail)) = (shots.first(), shots.last()) else {
            return Ok(Vec::new());
        };

        if cue_type.is_steady() {
            return Ok(vec![Scene::from_spans(
                cue_type,
                &ShotSpan::from(head),
                &ShotSpan::from(tail),
                self.frames,
            )]);
        }

        let mut scenes = Vec::new();
        let mut open: Vec<ShotSpan> = Vec::new();

        for shot in shots {
            if shot.transition_black.is_none() {
                open.push(shot.into());
                continue;
            }

            let (before, after) = self.split_at_transition(shot)?;
            open.push(before);
            if let (Some(start), Some(end)) = (open.first(), open.last()) {
                scenes.push(Scene::from_spans(cue_type, start, end, self.frames));
            }
            open.clear();
            open.extend(after);
        }

        if let (Some(start), Some(end)) = (open.first(), open.last()) {
            scenes.push(Scene::from_spans(cue_type, start, end, self.frames));
        }

        Ok(scenes)
    }

    /// Split a shot at its black transition into a part ending at the
    /// transition and, when the transition lies strictly inside the shot, a
    /// part starting one frame after it.
    fn split_at_transition(
        &self,
        shot: &ShotSegment,
    ) -> Result<(ShotSpan, Option<ShotSpan>), SegmentationError> {
        let whole = ShotSpan::from(shot);
        let Some(transition) = &shot.transition_black else {
            return Ok((whole, None));
        };

        let at = transition.timestamp_millis;
        if at < shot.start_time_ms || at > shot.end_time_ms {
            return Err(SegmentationError::InvalidTransition {
                shot_index: shot.index,
                timestamp: at,
                start: shot.start_time_ms,
                end: shot.end_time_ms,
            });
        }

        let (frames_before, frames_after): (Vec<usize>, Vec<usize>) = shot
            .frames
            .iter()
            .copied()
            .partition(|&position| self.frames[position].timestamp <= at);

        let before = ShotSpan {
            end_time: at,
            end_frame: transition.frame_number,
            smpte_end: transition.timecode_smpte.clone(),
            fade_out_black: true,
            frames: frames_before,
            ..whole.clone()
        };

        if at <= shot.start_time_ms || at >= shot.end_time_ms {
            return Ok((before, None));
        }

        let timecode = self
            .segments
            .timecode
            .ok_or(SegmentationError::MissingTimecodeSettings {
                shot_index: shot.index,
            })?;
        let start_frame = transition.frame_number + 1;

        let after = ShotSpan {
            start_time: timecode.frames_to_milliseconds(start_frame),
            start_frame,
            smpte_start: timecode.next_frame_timecode(&transition.timecode_smpte)?,
            fade_in_black: true,
            frames: frames_after,
            ..whole
        };

        log::debug!(
            "Split shot#{:04} [{} - {}] at {}",
            shot.index,
            shot.smpte_start,
            shot.smpte_end,
            transition.timecode_smpte
        );

        Ok((before, Some(after)))
    }

    /// Scenes for shots no cue covered: one per shot, then merged with
    /// their neighbour unless a fade or a skipped shot separates them.
    fn unknown_scenes(&self, existing: &[Scene]) -> Result<Vec<Scene>, SegmentationError> {
        let mut indices = self.segments.unknown_shot_indices.clone();
        indices.sort_unstable();
        indices.dedup();

        let mut singles = Vec::new();
        for index in indices {
            if index >= self.shots.len() {
                log::warn!("Unknown shot {index} does not exist; skipping");
                continue;
            }
            let covered = existing
                .iter()
                .any(|scene| (scene.shot_start..=scene.shot_end).contains(&index));
            if !covered {
                singles.extend(self.scene_items(TechnicalCueType::Undefined, index, index)?);
            }
        }

        let mut merged: Vec<Scene> = Vec::with_capacity(singles.len());
        for scene in singles {
            match merged.last_mut() {
                Some(previous)
                    if !previous.fade_out_black
                        && !scene.fade_in_black
                        && scene.shot_start.saturating_sub(previous.shot_end) <= 1 =>
                {
                    *previous = previous.merged(&scene);
                }
                _ => merged.push(scene),
            }
        }

        if !merged.is_empty() {
            log::debug!("{} scene(s) from unknown shots", merged.len());
        }
        Ok(merged)
    }
}

/// Build provisional scenes with the given filter settings.
///
/// Convenience wrapper around [`SceneBuilder`]; use the builder directly to
/// keep the prepared shots for [`reduce_scenes`](crate::reduce_scenes).
///
/// # Errors
///
/// See [`SceneBuilder::build`].
pub fn build_scenes(
    segments: &Segments,
    frames: &[FrameRecord],
    settings: &FilterSettings,
) -> Result<Vec<Scene>, SegmentationError> {
    let options = SegmentationOptions::new().with_filter_settings(*settings);
    SceneBuilder::new(segments, frames, &options).build()
}
