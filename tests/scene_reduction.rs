//! Scene reduction integration tests.
//!
//! Provisional scenes are produced by the [`SceneBuilder`] from synthetic
//! shots, then reduced. Embeddings are unit vectors so boundary
//! similarities are exactly 0 or 1.

use temporal_scenes::{
    FrameRecord, MergeDirection, ReductionContext, Scene, SceneBuilder, SegmentationOptions,
    Segments, ShotSegment, SimilarityRange, TechnicalCue, TechnicalCueType, merge_direction,
    reduce_scenes, shot_similarity,
};

const SAME: [f64; 2] = [1.0, 0.0];
const OTHER: [f64; 2] = [0.0, 1.0];

/// Shots laid end to end with the given durations.
fn shots(durations: &[u64]) -> Vec<ShotSegment> {
    let mut start = 0;
    durations
        .iter()
        .enumerate()
        .map(|(index, duration)| {
            let shot = ShotSegment::new(index, start, start + duration)
                .with_timecodes(format!("in#{index}"), format!("out#{index}"));
            start += duration;
            shot
        })
        .collect()
}

/// One selected frame per shot, in the middle of it.
fn frames_for(shots: &[ShotSegment], embeddings: &[[f64; 2]]) -> Vec<FrameRecord> {
    shots
        .iter()
        .zip(embeddings)
        .map(|(shot, embedding)| {
            FrameRecord::new(
                format!("frame.{:07}.jpg", shot.index),
                0,
                (shot.start_time_ms + shot.end_time_ms) / 2,
            )
            .with_shot(shot.index)
            .with_embeddings(embedding.to_vec())
        })
        .collect()
}

fn content(shots: Vec<ShotSegment>) -> Segments {
    let last = shots.len() - 1;
    let cues = vec![TechnicalCue::new(TechnicalCueType::Content, Some((0, last)))];
    Segments::new(shots, cues, Vec::new(), None).expect("Failed to build segments")
}

fn reduce(segments: &Segments, frames: &[FrameRecord], frame_hashes: &[FrameRecord]) -> Vec<Scene> {
    let options = SegmentationOptions::new();
    let builder = SceneBuilder::new(segments, frames, &options);
    let provisional = builder.build().expect("Failed to build scenes");
    let context = ReductionContext {
        shots: builder.shots(),
        frames,
        frame_hashes,
    };
    reduce_scenes(provisional, &context).expect("Failed to reduce scenes")
}

fn shot_ranges(scenes: &[Scene]) -> Vec<(usize, usize)> {
    scenes
        .iter()
        .map(|scene| (scene.shot_start, scene.shot_end))
        .collect()
}

// ── Short-scene merge ──────────────────────────────────────────────

#[test]
fn burst_scenes_are_absorbed() {
    let segments = content(shots(&[500, 5_000, 300]));
    let scenes = reduce(&segments, &[], &[]);

    assert!(scenes.len() <= 2);
    assert!(scenes.iter().all(|scene| scene.duration >= 2_000));
    assert_eq!(shot_ranges(&scenes), vec![(0, 2)]);
    assert_eq!(scenes[0].duration, 5_800);
}

#[test]
fn burst_scenes_without_cues_are_absorbed() {
    let segments =
        Segments::new(shots(&[500, 5_000, 300]), Vec::new(), Vec::new(), None)
            .expect("Failed to build segments");
    let scenes = reduce(&segments, &[], &[]);

    assert!(scenes.len() <= 2);
    assert_eq!(shot_ranges(&scenes), vec![(0, 2)]);
    assert_eq!(scenes[0].duration, 5_800);
    assert_eq!(scenes[0].technical_cue_type, TechnicalCueType::Undefined);
    assert_eq!(scenes[0].cue_group, None);
}

#[test]
fn unknown_shots_without_cues_are_absorbed() {
    let segments = Segments::new(shots(&[500, 5_000, 300]), Vec::new(), vec![0, 1, 2], None)
        .expect("Failed to build segments");
    let scenes = reduce(&segments, &[], &[]);

    assert_eq!(shot_ranges(&scenes), vec![(0, 2)]);
}

#[test]
fn deserialized_scenes_keep_their_group() {
    let segments = content(shots(&[500, 5_000, 300]));
    let options = SegmentationOptions::new();
    let builder = SceneBuilder::new(&segments, &[], &options);
    let provisional = builder.build().expect("Failed to build scenes");

    let json = serde_json::to_string(&provisional).expect("Failed to serialize scenes");
    let restored: Vec<Scene> = serde_json::from_str(&json).expect("Failed to parse scenes");
    assert!(restored.iter().all(|scene| scene.cue_group.is_some()));

    let context = ReductionContext {
        shots: builder.shots(),
        frames: &[],
        frame_hashes: &[],
    };
    let scenes = reduce_scenes(restored, &context).expect("Failed to reduce scenes");
    assert_eq!(shot_ranges(&scenes), vec![(0, 2)]);
}

#[test]
fn ungrouped_content_scenes_are_reduced_together() {
    let segments = content(shots(&[500, 5_000, 300]));
    let options = SegmentationOptions::new();
    let builder = SceneBuilder::new(&segments, &[], &options);
    let mut provisional = builder.build().expect("Failed to build scenes");
    for scene in &mut provisional {
        scene.cue_group = None;
    }

    let context = ReductionContext {
        shots: builder.shots(),
        frames: &[],
        frame_hashes: &[],
    };
    let scenes = reduce_scenes(provisional, &context).expect("Failed to reduce scenes");
    assert_eq!(shot_ranges(&scenes), vec![(0, 2)]);
}

#[test]
fn technical_cue_scenes_are_not_merged() {
    let cues = vec![
        TechnicalCue::new(TechnicalCueType::ColorBars, Some((0, 0))),
        TechnicalCue::new(TechnicalCueType::Slate, Some((1, 1))),
    ];
    let segments = Segments::new(shots(&[500, 800]), cues, Vec::new(), None)
        .expect("Failed to build segments");
    let scenes = reduce(&segments, &[], &[]);

    assert_eq!(shot_ranges(&scenes), vec![(0, 0), (1, 1)]);
}

#[test]
fn fade_keeps_short_scenes_apart() {
    let mut timeline = shots(&[500, 500]);
    timeline[0].fade_out_black = true;
    let scenes = reduce(&content(timeline), &[], &[]);

    assert_eq!(shot_ranges(&scenes), vec![(0, 0), (1, 1)]);
    assert!(scenes[0].fade_out_black);
}

#[test]
fn single_shot_joins_more_similar_previous_scene() {
    let timeline = shots(&[5_000, 5_000, 5_000]);
    let frames = frames_for(&timeline, &[SAME, SAME, OTHER]);
    let scenes = reduce(&content(timeline), &frames, &[]);

    assert_eq!(shot_ranges(&scenes), vec![(0, 1), (2, 2)]);
}

#[test]
fn single_shot_joins_more_similar_next_scene() {
    let timeline = shots(&[5_000, 5_000, 5_000]);
    let frames = frames_for(&timeline, &[OTHER, SAME, SAME]);
    let scenes = reduce(&content(timeline), &frames, &[]);

    assert_eq!(shot_ranges(&scenes), vec![(0, 0), (1, 2)]);
}

#[test]
fn dissimilar_single_shot_stays_alone() {
    let timeline = shots(&[5_000, 5_000, 5_000]);
    let frames = frames_for(&timeline, &[SAME, OTHER, SAME]);
    let scenes = reduce(&content(timeline), &frames, &[]);

    assert_eq!(shot_ranges(&scenes), vec![(0, 0), (1, 1), (2, 2)]);
}

#[test]
fn merged_scene_keeps_outer_boundaries() {
    let timeline = shots(&[5_000, 5_000, 5_000]);
    let frames = frames_for(&timeline, &[SAME, SAME, OTHER]);
    let scenes = reduce(&content(timeline), &frames, &[]);

    let merged = &scenes[0];
    assert_eq!((merged.time_start, merged.time_end), (0, 10_000));
    assert_eq!(merged.duration, 10_000);
    assert_eq!(merged.smpte_start, "in#0");
    assert_eq!(merged.smpte_end, "out#1");
    assert_eq!(merged.key_start.name(), Some("frame.0000000.jpg"));
    assert_eq!(merged.key_end.name(), Some("frame.0000001.jpg"));
}

// ── Tie-break ──────────────────────────────────────────────────────

#[test]
fn strong_maximum_selects_maxima() {
    let before = SimilarityRange { min: 0.55, max: 0.90 };
    let after = SimilarityRange { min: 0.50, max: 0.70 };
    assert_eq!(merge_direction(before, after), Some(MergeDirection::Previous));
}

#[test]
fn moderate_similarities_compare_minima() {
    // No max above 0.80 and not both mins below 0.60: the minima decide.
    let before = SimilarityRange { min: 0.62, max: 0.79 };
    let after = SimilarityRange { min: 0.70, max: 0.75 };
    assert_eq!(merge_direction(before, after), Some(MergeDirection::Next));
}

#[test]
fn winning_side_must_clear_merge_threshold() {
    let before = SimilarityRange { min: 0.10, max: 0.64 };
    let after = SimilarityRange { min: 0.10, max: 0.30 };
    assert_eq!(merge_direction(before, after), None);
}

#[test]
fn unavailable_similarity_never_merges() {
    assert_eq!(
        merge_direction(SimilarityRange::UNAVAILABLE, SimilarityRange::UNAVAILABLE),
        None
    );
}

// ── Shot similarity ────────────────────────────────────────────────

#[test]
fn shot_similarity_spans_all_frame_pairs() {
    let frames = vec![
        FrameRecord::new("a", 0, 0).with_shot(0).with_embeddings(SAME.to_vec()),
        FrameRecord::new("b", 1, 1).with_shot(1).with_embeddings(SAME.to_vec()),
        FrameRecord::new("c", 2, 2).with_shot(1).with_embeddings(OTHER.to_vec()),
    ];
    let range = shot_similarity(&frames, 0, 1);
    assert_eq!(range, SimilarityRange { min: 0.0, max: 1.0 });
}

#[test]
fn empty_shot_borrows_outer_neighbour() {
    let frames = vec![
        FrameRecord::new("a", 0, 0).with_shot(0).with_embeddings(SAME.to_vec()),
        FrameRecord::new("c", 2, 2).with_shot(2).with_embeddings(SAME.to_vec()),
    ];
    assert_eq!(shot_similarity(&frames, 1, 2), SimilarityRange { min: 1.0, max: 1.0 });
    assert_eq!(shot_similarity(&frames, 0, 1), SimilarityRange { min: 1.0, max: 1.0 });
}

#[test]
fn same_shot_or_no_frames_is_unavailable() {
    let frames = vec![FrameRecord::new("a", 0, 0).with_shot(0).with_embeddings(SAME.to_vec())];
    assert_eq!(shot_similarity(&frames, 0, 0), SimilarityRange::UNAVAILABLE);
    assert_eq!(shot_similarity(&frames, 5, 6), SimilarityRange::UNAVAILABLE);
}

// ── Finalisation ───────────────────────────────────────────────────

#[test]
fn scenes_are_numbered_in_time_order() {
    let timeline = shots(&[5_000, 5_000, 5_000]);
    let segments = Segments::new(timeline, Vec::new(), Vec::new(), None)
        .expect("Failed to build segments");
    let scenes = reduce(&segments, &[], &[]);

    let numbers: Vec<i64> = scenes.iter().map(|scene| scene.scene_no).collect();
    assert_eq!(numbers, vec![0, 1, 2]);
    assert!(scenes.windows(2).all(|pair| pair[0].time_start < pair[1].time_start));
}

#[test]
fn boundary_similarities_are_recorded() {
    let timeline = shots(&[5_000, 5_000, 5_000]);
    let frames = frames_for(&timeline, &[SAME, SAME, OTHER]);
    let segments = Segments::new(timeline, Vec::new(), Vec::new(), None)
        .expect("Failed to build segments");
    let scenes = reduce(&segments, &frames, &[]);

    assert_eq!(scenes[0].sim_start, SimilarityRange::UNAVAILABLE);
    assert_eq!(scenes[1].sim_start, SimilarityRange { min: 1.0, max: 1.0 });
    assert_eq!(scenes[1].sim_end, SimilarityRange { min: 0.0, max: 0.0 });
}

#[test]
fn color_bars_round_trip_uses_single_frame() {
    let timeline = shots(&[4_000]);
    let frames = frames_for(&timeline, &[SAME]);
    let cues = vec![TechnicalCue::new(TechnicalCueType::ColorBars, Some((0, 0)))];
    let segments =
        Segments::new(timeline, cues, Vec::new(), None).expect("Failed to build segments");
    let scenes = reduce(&segments, &frames, &frames);

    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].scene_no, 0);
    assert_eq!(scenes[0].key_start.name(), Some("frame.0000000.jpg"));
    assert_eq!(scenes[0].key_end, scenes[0].key_start);
}

#[test]
fn missing_thumbnails_are_found_in_frame_hashes() {
    let timeline = vec![ShotSegment::new(0, 0, 4_000).with_frame_range(0, 2)];
    let frame_hashes: Vec<FrameRecord> = (0..3)
        .map(|index| FrameRecord::new(format!("hash.{index}.jpg"), index, index * 1_000))
        .collect();
    let cues = vec![TechnicalCue::new(TechnicalCueType::Slate, Some((0, 0)))];
    let segments =
        Segments::new(timeline, cues, Vec::new(), None).expect("Failed to build segments");
    let scenes = reduce(&segments, &[], &frame_hashes);

    assert_eq!(scenes[0].key_start.name(), Some("hash.0.jpg"));
    assert_eq!(scenes[0].key_end.name(), Some("hash.2.jpg"));
}

#[test]
fn unresolvable_thumbnail_is_left_out() {
    let segments = content(shots(&[4_000]));
    let scenes = reduce(&segments, &[], &[]);

    assert!(scenes[0].key_start.is_unresolved());
    let json = serde_json::to_value(&scenes[0]).expect("Failed to serialize scene");
    assert!(json.get("keyStart").is_none());
    assert_eq!(json["simStart"], serde_json::json!([-1.0, -1.0]));
}

#[test]
fn reduced_scenes_do_not_overlap() {
    let timeline = shots(&[3_000, 700, 4_000, 6_000, 1_200, 5_000, 2_500]);
    let embeddings = [SAME, OTHER, SAME, OTHER, OTHER, SAME, SAME];
    let frames = frames_for(&timeline, &embeddings);
    let scenes = reduce(&content(timeline), &frames, &[]);

    assert!(!scenes.is_empty());
    assert!(scenes.windows(2).all(|pair| pair[0].shot_end < pair[1].shot_start));
    assert_eq!(scenes.first().map(|scene| scene.shot_start), Some(0));
    assert_eq!(scenes.last().map(|scene| scene.shot_end), Some(6));
}
