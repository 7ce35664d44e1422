//! FilterSettings and SegmentationOptions tests.

use serde_json::json;
use temporal_scenes::{FilterSettings, SegmentationOptions};

// ── FilterSettings defaults ──────────────────────────────────────

#[test]
fn settings_defaults() {
    let settings = FilterSettings::new();
    assert_eq!(settings.min_frame_similarity(), 0.80);
    assert_eq!(settings.max_time_distance(), 180_000);
    assert_eq!(settings, FilterSettings::default());
}

// ── Similarity threshold ─────────────────────────────────────────

#[test]
fn similarity_accepts_zero() {
    let settings = FilterSettings::new().with_min_frame_similarity(0.0);
    assert_eq!(settings.min_frame_similarity(), 0.0);
}

#[test]
fn similarity_rejects_out_of_range() {
    for value in [1.0, -0.1, f64::NAN, f64::INFINITY] {
        let settings = FilterSettings::new().with_min_frame_similarity(value);
        assert_eq!(settings.min_frame_similarity(), 0.80, "value {value} accepted");
    }
}

#[test]
fn rejected_similarity_keeps_previous_value() {
    let settings = FilterSettings::new()
        .with_min_frame_similarity(0.9)
        .with_min_frame_similarity(1.5);
    assert_eq!(settings.min_frame_similarity(), 0.9);
}

// ── Time distance ────────────────────────────────────────────────

#[test]
fn distance_bounds_are_inclusive() {
    assert_eq!(FilterSettings::new().with_max_time_distance(60_000.0).max_time_distance(), 60_000);
    assert_eq!(
        FilterSettings::new().with_max_time_distance(600_000.0).max_time_distance(),
        600_000
    );
}

#[test]
fn distance_rejects_out_of_range() {
    for value in [59_999.0, 600_001.0, f64::NAN] {
        let settings = FilterSettings::new().with_max_time_distance(value);
        assert_eq!(settings.max_time_distance(), 180_000, "value {value} accepted");
    }
}

#[test]
fn distance_is_rounded() {
    let settings = FilterSettings::new().with_max_time_distance(90_000.4);
    assert_eq!(settings.max_time_distance(), 90_000);
}

// ── User settings document ───────────────────────────────────────

#[test]
fn user_settings_accept_strings_and_numbers() {
    let settings = FilterSettings::from_user_settings(&json!({
        "minFrameSimilarity": "0.85",
        "maxTimeDistance": 240000,
    }));
    assert_eq!(settings.min_frame_similarity(), 0.85);
    assert_eq!(settings.max_time_distance(), 240_000);
}

#[test]
fn user_settings_ignore_malformed_fields() {
    let settings = FilterSettings::from_user_settings(&json!({
        "minFrameSimilarity": "high",
        "maxTimeDistance": true,
    }));
    assert_eq!(settings, FilterSettings::new());
}

#[test]
fn empty_user_settings_are_defaults() {
    assert_eq!(FilterSettings::from_user_settings(&json!({})), FilterSettings::new());
}

// ── SegmentationOptions builder ──────────────────────────────────

#[test]
fn options_defaults() {
    let options = SegmentationOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("SegmentationOptions"));
    assert!(debug.contains("batch_size: 1"));
    assert_eq!(*options.filter_settings(), FilterSettings::new());
}

#[test]
fn options_with_batch_size() {
    let debug = format!("{:?}", SegmentationOptions::new().with_batch_size(10));
    assert!(debug.contains("batch_size: 10"));
}

#[test]
fn options_with_batch_size_clamps_zero() {
    let debug = format!("{:?}", SegmentationOptions::new().with_batch_size(0));
    // Clamped to 1.
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn options_carry_filter_settings() {
    let settings = FilterSettings::new().with_min_frame_similarity(0.5);
    let options = SegmentationOptions::new().with_filter_settings(settings);
    assert_eq!(options.filter_settings().min_frame_similarity(), 0.5);
}
