//! Scene reduction.
//!
//! Provisional scenes overlap, and content cues tend to produce bursts of
//! very short scenes around fast cutting. The reducer merges those within
//! each reduction group, never across a black fade, then orders all scenes,
//! numbers them, picks their thumbnails and records how similar each scene
//! is to its neighbours.

use std::collections::{BTreeMap, VecDeque};

use crate::{
    config::SegmentationOptions,
    error::SegmentationError,
    frame::FrameRecord,
    progress::{OperationType, ProgressTracker},
    scene::{KeyFrame, Scene, SimilarityRange, fade_groups},
    segment::{ShotSegment, TechnicalCueType},
    similarity::cosine_similarity,
};

/// Scenes shorter than this are merged into a neighbour.
pub const BURST_DISTANCE_MS: u64 = 2_000;

/// Boundary similarity above which a single-shot scene joins a neighbour.
pub const MERGE_SIMILARITY: f64 = 0.645;

const HIGH_SIMILARITY: f64 = 0.80;
const LOW_SIMILARITY: f64 = 0.60;

/// Group of content scenes that carry no reduction group of their own.
const UNGROUPED_CONTENT: usize = usize::MAX;

/// Which neighbour a single-shot scene should join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDirection {
    /// Join the preceding scene.
    Previous,
    /// Join the following scene.
    Next,
}

/// What the reducer needs besides the scenes themselves.
#[derive(Debug, Clone, Copy)]
pub struct ReductionContext<'a> {
    /// Shots prepared by the [`SceneBuilder`](crate::SceneBuilder).
    pub shots: &'a [ShotSegment],
    /// Selected frames with embeddings.
    pub frames: &'a [FrameRecord],
    /// The full frame-hash list, used to find thumbnails for scenes whose
    /// shots had no selected frame.
    pub frame_hashes: &'a [FrameRecord],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Keep,
    IntoPrevious,
    WithNext,
}

/// Merge, order and number scenes.
///
/// # Errors
///
/// Returns [`SegmentationError::ScenesOutOfOrder`] when scenes of one cue
/// cannot be ordered by shot.
pub fn reduce_scenes(
    scenes: Vec<Scene>,
    context: &ReductionContext,
) -> Result<Vec<Scene>, SegmentationError> {
    reduce_scenes_with_options(scenes, context, &SegmentationOptions::default())
}

/// Merge, order and number scenes, reporting progress.
///
/// # Errors
///
/// See [`reduce_scenes`].
pub fn reduce_scenes_with_options(
    scenes: Vec<Scene>,
    context: &ReductionContext,
    options: &SegmentationOptions,
) -> Result<Vec<Scene>, SegmentationError> {
    let before = scenes.len();
    let mut reduced = Vec::with_capacity(before);
    let mut by_group: BTreeMap<usize, Vec<Scene>> = BTreeMap::new();

    for scene in scenes {
        match reduction_group(&scene) {
            Some(group) => by_group.entry(group).or_default().push(scene),
            None => reduced.push(scene),
        }
    }

    for (group, scenes) in by_group {
        let count = scenes.len();
        let merged = merge_group_scenes(scenes, context)?;
        log::debug!("Reduction group {group}: {count} -> {} scenes", merged.len());
        reduced.extend(merged);
    }

    let finalized = finalize(reduced, context, options);
    log::info!("Reduced {before} provisional scenes to {}", finalized.len());
    Ok(finalized)
}

fn reduction_group(scene: &Scene) -> Option<usize> {
    scene.cue_group.or_else(|| {
        (scene.technical_cue_type == TechnicalCueType::Content).then_some(UNGROUPED_CONTENT)
    })
}

fn merge_group_scenes(
    mut scenes: Vec<Scene>,
    context: &ReductionContext,
) -> Result<Vec<Scene>, SegmentationError> {
    if scenes.len() < 2 {
        return Ok(scenes);
    }

    scenes.sort_by(|a, b| {
        a.time_start
            .cmp(&b.time_start)
            .then(b.time_end.cmp(&a.time_end))
    });

    let mut reduced = Vec::with_capacity(scenes.len());
    for group in fade_groups(&scenes, |s| s.fade_in_black, |s| s.fade_out_black) {
        let merged = merge_overlapping(&scenes[group])?;
        reduced.extend(merge_short_scenes(merged, context));
    }

    Ok(reduced)
}

/// Drop nested scenes and merge scenes whose shot ranges overlap.
fn merge_overlapping(scenes: &[Scene]) -> Result<Vec<Scene>, SegmentationError> {
    let mut merged: Vec<Scene> = Vec::with_capacity(scenes.len());

    for current in scenes {
        let Some(previous) = merged.last_mut() else {
            merged.push(current.clone());
            continue;
        };

        if current.shot_end < previous.shot_start {
            return Err(SegmentationError::ScenesOutOfOrder {
                previous_start: previous.shot_start,
                current_start: current.shot_start,
                current_end: current.shot_end,
            });
        }

        if current.shot_start >= previous.shot_start && current.shot_end <= previous.shot_end {
            continue;
        }

        if current.shot_start > previous.shot_end {
            merged.push(current.clone());
        } else {
            *previous = previous.merged(current);
        }
    }

    Ok(merged)
}

/// Fold short and weakly separated scenes into their neighbours, left to
/// right with one scene of lookahead.
fn merge_short_scenes(scenes: Vec<Scene>, context: &ReductionContext) -> Vec<Scene> {
    if scenes.len() < 2 {
        return scenes;
    }

    let mut pending: VecDeque<Scene> = scenes.into();
    let mut kept: Vec<Scene> = Vec::with_capacity(pending.len());
    kept.extend(pending.pop_front());

    while let Some(current) = pending.pop_front() {
        let step = match kept.last() {
            Some(previous) => short_merge_step(previous, &current, pending.front(), context),
            None => Step::Keep,
        };

        match step {
            Step::Keep => kept.push(current),
            Step::IntoPrevious => {
                if let Some(previous) = kept.last_mut() {
                    *previous = previous.merged(&current);
                }
            }
            Step::WithNext => match pending.pop_front() {
                Some(next) => kept.push(current.merged(&next)),
                None => kept.push(current),
            },
        }
    }

    kept
}

fn short_merge_step(
    previous: &Scene,
    current: &Scene,
    next: Option<&Scene>,
    context: &ReductionContext,
) -> Step {
    let Some(next) = next else {
        let fade_between = previous.fade_out_black || current.fade_in_black;
        let either_short =
            previous.duration < BURST_DISTANCE_MS || current.duration < BURST_DISTANCE_MS;
        return if !fade_between && either_short {
            Step::IntoPrevious
        } else {
            Step::Keep
        };
    };

    if previous.fade_out_black || current.fade_in_black {
        return Step::Keep;
    }

    if previous.duration < BURST_DISTANCE_MS {
        return Step::IntoPrevious;
    }

    if current.duration < BURST_DISTANCE_MS {
        if previous.fade_in_black {
            return Step::IntoPrevious;
        }
        if !next.fade_in_black {
            return Step::WithNext;
        }
    }

    if !current.is_single_shot() {
        return Step::Keep;
    }

    let before = shot_similarity(context.frames, previous.shot_end, current.shot_start);
    let after = shot_similarity(context.frames, current.shot_end, next.shot_start);
    let direction = merge_direction(before, after);

    log::debug!(
        "[{} - {}]: #{} -({:.2}/{:.2})- #{} -({:.2}/{:.2})- #{} => {direction:?}",
        current.smpte_start,
        current.smpte_end,
        previous.shot_end,
        before.min,
        before.max,
        current.shot_start,
        after.min,
        after.max,
        next.shot_start,
    );

    match direction {
        Some(MergeDirection::Previous) => Step::IntoPrevious,
        Some(MergeDirection::Next) if !next.fade_in_black => Step::WithNext,
        _ => Step::Keep,
    }
}

/// Decide which neighbour a single-shot scene joins, given the similarity
/// across its leading (`before`) and trailing (`after`) boundaries.
///
/// Maxima are compared when either side has a strong match or both sides
/// are weak; otherwise minima. The winning side must exceed
/// [`MERGE_SIMILARITY`].
pub fn merge_direction(before: SimilarityRange, after: SimilarityRange) -> Option<MergeDirection> {
    let use_max = before.max > HIGH_SIMILARITY
        || after.max > HIGH_SIMILARITY
        || (before.min < LOW_SIMILARITY && after.min < LOW_SIMILARITY);

    let (toward_previous, toward_next) = if use_max {
        (before.max, after.max)
    } else {
        (before.min, after.min)
    };

    if toward_previous > toward_next && toward_previous > MERGE_SIMILARITY {
        Some(MergeDirection::Previous)
    } else if toward_next > toward_previous && toward_next > MERGE_SIMILARITY {
        Some(MergeDirection::Next)
    } else {
        None
    }
}

/// Range of cosine similarities between the frames of two shots.
///
/// A shot without frames is replaced by its outer neighbour (`first - 1`,
/// `second + 1`). Returns [`SimilarityRange::UNAVAILABLE`] for identical
/// shots or when no pair of embeddings can be compared.
pub fn shot_similarity(frames: &[FrameRecord], first: usize, second: usize) -> SimilarityRange {
    if first == second {
        return SimilarityRange::UNAVAILABLE;
    }

    let frames_of = |shot: Option<usize>| {
        frames
            .iter()
            .filter(|frame| shot.is_some() && frame.shot_idx == shot)
            .filter_map(|frame| frame.embeddings.as_deref())
            .collect::<Vec<&[f64]>>()
    };

    let mut left = frames_of(Some(first));
    if left.is_empty() {
        left = frames_of(first.checked_sub(1));
    }
    let mut right = frames_of(Some(second));
    if right.is_empty() {
        right = frames_of(Some(second + 1));
    }

    let mut range: Option<SimilarityRange> = None;
    for a in &left {
        for b in &right {
            let similarity = cosine_similarity(a, b);
            range = Some(match range {
                Some(range) => SimilarityRange {
                    min: range.min.min(similarity),
                    max: range.max.max(similarity),
                },
                None => SimilarityRange {
                    min: similarity,
                    max: similarity,
                },
            });
        }
    }

    range.unwrap_or(SimilarityRange::UNAVAILABLE)
}

fn finalize(
    mut scenes: Vec<Scene>,
    context: &ReductionContext,
    options: &SegmentationOptions,
) -> Vec<Scene> {
    scenes.sort_by_key(|scene| scene.time_start);

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::SceneReduction,
        Some(scenes.len() as u64),
        options.batch_size,
    );

    for (position, scene) in scenes.iter_mut().enumerate() {
        scene.scene_no = position as i64;
        scene.cue_group = None;

        if scene.key_start.is_unresolved() {
            scene.key_start = thumbnail(context, scene.shot_start, false);
            if scene.key_start.is_unresolved() {
                log::warn!("scene#{position:03}: no start thumbnail in shot {}", scene.shot_start);
            }
        }
        if scene.key_end.is_unresolved() {
            scene.key_end = thumbnail(context, scene.shot_end, true);
            if scene.key_end.is_unresolved() {
                log::warn!("scene#{position:03}: no end thumbnail in shot {}", scene.shot_end);
            }
        }

        scene.sim_start = match scene.shot_start.checked_sub(1) {
            Some(before) => shot_similarity(context.frames, before, scene.shot_start),
            None => SimilarityRange::UNAVAILABLE,
        };
        scene.sim_end = shot_similarity(context.frames, scene.shot_end, scene.shot_end + 1);

        tracker.advance(Some(scene.shot_start));
    }

    tracker.finish();
    scenes
}

/// First (or, scanning backwards, last) frame of a shot in the full
/// frame-hash list.
fn thumbnail(context: &ReductionContext, shot: usize, backwards: bool) -> KeyFrame {
    let Some((first, last)) = context.shots.get(shot).and_then(|shot| shot.frame_range) else {
        return KeyFrame::Unresolved;
    };

    let mut positions = first..=last;
    let found = if backwards {
        positions.rev().find_map(|position| context.frame_hashes.get(position))
    } else {
        positions.find_map(|position| context.frame_hashes.get(position))
    };

    found
        .map(|frame| KeyFrame::Resolved(frame.name.clone()))
        .unwrap_or_default()
}
