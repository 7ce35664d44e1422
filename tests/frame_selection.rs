//! Frame selection integration tests.
//!
//! Frames are synthetic: one per second, named after their position, with
//! hashes chosen so the grouping is known in advance.

use std::collections::HashSet;

use temporal_scenes::{
    FrameRecord, Segments, ShotSegment, TechnicalCue, TechnicalCueType, select_frames,
};

fn frame(index: u64, hash: &str, laplacian: f64) -> FrameRecord {
    FrameRecord::new(format!("frame.{index:07}.jpg"), index * 25, index * 1_000)
        .with_hash(hash.parse().expect("Failed to parse hash"))
        .with_laplacian(laplacian)
}

fn uniform_frames(count: u64) -> Vec<FrameRecord> {
    (0..count).map(|index| frame(index, "a1b2", 1.0)).collect()
}

fn single_cue(cue_type: TechnicalCueType, shots: Vec<ShotSegment>) -> Segments {
    let last = shots.len() - 1;
    Segments::new(shots, vec![TechnicalCue::new(cue_type, Some((0, last)))], Vec::new(), None)
        .expect("Failed to build segments")
}

fn names(frames: &[FrameRecord]) -> Vec<&str> {
    frames.iter().map(|frame| frame.name.as_str()).collect()
}

// ── Unsegmented ────────────────────────────────────────────────────

#[test]
fn empty_input_selects_nothing() {
    assert!(select_frames(&[], None).is_empty());
}

#[test]
fn identical_frames_collapse_to_one() {
    let frames = uniform_frames(10);
    let selected = select_frames(&frames, None);

    assert_eq!(names(&selected), vec!["frame.0000000.jpg"]);
    assert_eq!(selected[0].extend_frame_duration, Some(9_000));
    assert!(selected[0].shot_idx.is_none());
}

#[test]
fn unsegmented_frames_are_windowed_by_two_minutes() {
    let frames: Vec<FrameRecord> = (0..31)
        .map(|index| {
            FrameRecord::new(format!("frame.{index:07}.jpg"), index * 250, index * 10_000)
                .with_hash("a1b2".parse().expect("Failed to parse hash"))
        })
        .collect();

    let selected = select_frames(&frames, None);
    let timestamps: Vec<u64> = selected.iter().map(|frame| frame.timestamp).collect();
    assert_eq!(timestamps, vec![0, 120_000, 240_000]);
}

#[test]
fn quarter_distance_stays_in_group() {
    let frames = vec![
        frame(0, "0000", 1.0),
        frame(1, "000_", 1.0),
        frame(2, "000_", 1.0),
    ];
    assert_eq!(select_frames(&frames, None).len(), 1);
}

#[test]
fn distance_above_quarter_starts_new_group() {
    let frames = vec![
        frame(0, "0000", 1.0),
        frame(1, "001_", 1.0),
        frame(2, "001_", 1.0),
    ];
    let selected = select_frames(&frames, None);
    assert_eq!(names(&selected), vec!["frame.0000000.jpg", "frame.0000001.jpg"]);
}

#[test]
fn selection_is_an_ordered_subset() {
    let hashes = ["0000", "____", "0000", "abcd", "____", "zzzz", "0000", "1234"];
    let frames: Vec<FrameRecord> = hashes
        .iter()
        .enumerate()
        .map(|(index, hash)| frame(index as u64, hash, index as f64))
        .collect();

    let selected = select_frames(&frames, None);
    let input: HashSet<&str> = names(&frames).into_iter().collect();

    assert!(!selected.is_empty());
    assert!(selected.iter().all(|frame| input.contains(frame.name.as_str())));
    assert!(selected.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
}

// ── Per-shot policies ──────────────────────────────────────────────

#[test]
fn steady_cue_picks_sharpest_frame() {
    let frames: Vec<FrameRecord> = [1.0, 3.0, 9.0, 2.0, 9.0]
        .iter()
        .enumerate()
        .map(|(index, laplacian)| frame(index as u64, "a1b2", *laplacian))
        .collect();
    let segments = single_cue(
        TechnicalCueType::ColorBars,
        vec![ShotSegment::new(0, 0, 5_000).with_frame_range(0, 4)],
    );

    let selected = select_frames(&frames, Some(&segments));

    assert_eq!(names(&selected), vec!["frame.0000002.jpg"]);
    assert_eq!(selected[0].shot_idx, Some(0));
    assert_eq!(selected[0].technical_cue_type, Some(TechnicalCueType::ColorBars));
}

#[test]
fn end_credits_sample_at_fixed_rate() {
    let frames = uniform_frames(10);
    let segments = single_cue(
        TechnicalCueType::EndCredits,
        vec![ShotSegment::new(0, 0, 10_000).with_frame_range(0, 9)],
    );

    let selected = select_frames(&frames, Some(&segments));
    let timestamps: Vec<u64> = selected.iter().map(|frame| frame.timestamp).collect();
    assert_eq!(timestamps, vec![0, 4_000, 8_000]);
}

#[test]
fn single_frame_shot_keeps_its_frame() {
    let frames = uniform_frames(3);
    let segments = single_cue(
        TechnicalCueType::Content,
        vec![
            ShotSegment::new(0, 0, 1_000).with_frame_range(0, 0),
            ShotSegment::new(1, 1_000, 3_000).with_frame_range(1, 2),
        ],
    );

    let selected = select_frames(&frames, Some(&segments));
    assert_eq!(names(&selected), vec!["frame.0000000.jpg", "frame.0000001.jpg"]);
}

#[test]
fn shot_without_frame_range_selects_nothing() {
    let frames = uniform_frames(3);
    let segments = single_cue(TechnicalCueType::Content, vec![ShotSegment::new(0, 0, 3_000)]);
    assert!(select_frames(&frames, Some(&segments)).is_empty());
}

#[test]
fn content_shot_is_trimmed_to_its_budget() {
    // Eight seconds allow two frames; every frame opens its own group.
    let frames = vec![
        frame(0, "0000", 1.0),
        frame(1, "____", 9.0),
        frame(2, "0000", 3.0),
        frame(3, "____", 7.0),
    ];
    let segments = single_cue(
        TechnicalCueType::Content,
        vec![ShotSegment::new(0, 0, 8_000).with_frame_range(0, 3)],
    );

    let selected = select_frames(&frames, Some(&segments));
    assert_eq!(names(&selected), vec!["frame.0000001.jpg", "frame.0000003.jpg"]);
}

#[test]
fn grouped_frame_records_the_span_it_covers() {
    let frames = uniform_frames(5);
    let segments = single_cue(
        TechnicalCueType::Content,
        vec![ShotSegment::new(0, 0, 5_000).with_frame_range(0, 4)],
    );

    let selected = select_frames(&frames, Some(&segments));
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].extend_frame_duration, Some(4_000));
    assert_eq!(selected[0].technical_cue_type, Some(TechnicalCueType::Content));
}

// ── Cue coverage ───────────────────────────────────────────────────

#[test]
fn partial_cue_shots_are_skipped() {
    let frames = uniform_frames(4);
    let shots = vec![
        ShotSegment::new(0, 0, 2_000).with_frame_range(0, 1),
        ShotSegment::new(1, 2_000, 4_000).with_frame_range(2, 3),
    ];
    let cues = vec![
        TechnicalCue::new(TechnicalCueType::Slate, Some((0, 0))).with_partial_bounds(
            (0, 1_000),
            (0, 25),
            ("00:00:00:00", "00:00:01:00"),
        ),
        TechnicalCue::new(TechnicalCueType::Content, Some((1, 1))),
    ];
    let segments = Segments::new(shots, cues, Vec::new(), None).expect("Failed to build segments");

    let selected = select_frames(&frames, Some(&segments));
    assert!(selected.iter().all(|frame| frame.shot_idx == Some(1)));
    assert_eq!(selected.len(), 1);
}

#[test]
fn unknown_shots_are_scanned_as_undefined() {
    let frames = uniform_frames(4);
    let shots = vec![
        ShotSegment::new(0, 0, 2_000).with_frame_range(0, 1),
        ShotSegment::new(1, 2_000, 4_000).with_frame_range(2, 3),
    ];
    let cues = vec![TechnicalCue::new(TechnicalCueType::Content, Some((0, 0)))];
    let segments = Segments::new(shots, cues, vec![1], None).expect("Failed to build segments");

    let selected = select_frames(&frames, Some(&segments));
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[1].shot_idx, Some(1));
    assert_eq!(selected[1].technical_cue_type, Some(TechnicalCueType::Undefined));
}

#[test]
fn shots_without_cues_are_selected_per_shot() {
    let frames = uniform_frames(4);
    let shots = vec![
        ShotSegment::new(0, 0, 2_000).with_frame_range(0, 1),
        ShotSegment::new(1, 2_000, 4_000).with_frame_range(2, 3),
    ];
    let segments = Segments::new(shots, Vec::new(), Vec::new(), None)
        .expect("Failed to build segments");

    let selected = select_frames(&frames, Some(&segments));
    let shots: Vec<Option<usize>> = selected.iter().map(|frame| frame.shot_idx).collect();
    assert_eq!(shots, vec![Some(0), Some(1)]);
}
