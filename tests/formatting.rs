//! Scene output integration tests.

use temporal_scenes::{
    Cue, CueTrack, FilterSettings, Segments, ShotSegment, TechnicalCue, TechnicalCueType, build_scenes,
    format::{format_hhmmss, format_vtt_timestamp},
    render_scenes,
};

fn numbered_scenes() -> Vec<temporal_scenes::Scene> {
    let shots = vec![
        ShotSegment::new(0, 0, 65_250),
        ShotSegment::new(1, 65_250, 3_725_500),
    ];
    let cues = vec![
        TechnicalCue::new(TechnicalCueType::ColorBars, Some((0, 0))),
        TechnicalCue::new(TechnicalCueType::Slate, Some((1, 1))),
    ];
    let segments = Segments::new(shots, cues, Vec::new(), None).expect("Failed to build segments");
    let mut scenes = build_scenes(&segments, &[], &FilterSettings::new())
        .expect("Failed to build scenes");
    for (position, scene) in scenes.iter_mut().enumerate() {
        scene.scene_no = position as i64;
    }
    scenes
}

// ── Timestamps ─────────────────────────────────────────────────────

#[test]
fn vtt_timestamp_has_milliseconds() {
    assert_eq!(format_vtt_timestamp(65_250), "00:01:05.250");
}

#[test]
fn duration_text_drops_milliseconds() {
    assert_eq!(format_hhmmss(3_660_250), "01:01:00");
}

// ── WebVTT ─────────────────────────────────────────────────────────

#[test]
fn empty_track_is_header_only() {
    let (_, track) = render_scenes(&[], "");
    assert_eq!(track.to_webvtt(), "WEBVTT\n\n");
}

#[test]
fn one_cue_per_scene() {
    let (_, track) = render_scenes(&numbered_scenes(), "frames/");
    let expected = "WEBVTT\n\n\
        0\n00:00:00.000 --> 00:01:05.250 align:start line:0% position:0% size:40%\nScene 000 (00:01:05)\n\n\
        1\n00:01:05.250 --> 01:02:05.500 align:start line:0% position:0% size:40%\nScene 001 (01:01:00)\n\n";
    assert_eq!(track.to_webvtt(), expected);
}

#[test]
fn track_displays_as_webvtt() {
    let track = CueTrack {
        cues: vec![Cue {
            start_ms: 1_000,
            end_ms: 2_500,
            text: "Scene 000 (00:00:01)".to_string(),
        }],
    };
    let expected = "WEBVTT\n\n\
        0\n00:00:01.000 --> 00:00:02.500 align:start line:0% position:0% size:40%\nScene 000 (00:00:01)\n\n";

    assert_eq!(format!("{track}"), expected);
    assert_eq!(track.to_webvtt(), expected);
}

// ── Metadata ───────────────────────────────────────────────────────

#[test]
fn metadata_document_uses_camel_case() {
    let (metadata, _) = render_scenes(&numbered_scenes(), "frames/");
    let json = serde_json::to_value(&metadata).expect("Failed to serialize metadata");

    assert_eq!(json["framePrefix"], "frames/");
    let scenes = json["scenes"].as_array().expect("Expected scene array");
    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0]["sceneNo"], 0);
    assert_eq!(scenes[0]["technicalCueType"], "ColorBars");
    assert_eq!(scenes[1]["timeStart"], 65_250);
    assert_eq!(scenes[1]["duration"], 3_660_250);
    assert!(scenes[0].get("cueGroup").is_none());
}

#[test]
fn metadata_document_round_trips() {
    let (metadata, _) = render_scenes(&numbered_scenes(), "frames/");
    let json = serde_json::to_string(&metadata).expect("Failed to serialize metadata");
    let parsed: temporal_scenes::SceneMetadata =
        serde_json::from_str(&json).expect("Failed to parse metadata");
    assert_eq!(parsed, metadata);
}
