//! Segmentation configuration.
//!
//! [`FilterSettings`] holds the two user-tunable thresholds of the scene
//! builder. [`SegmentationOptions`] threads those settings, together with a
//! progress callback, through the selector and the builder without
//! polluting every function signature.
//!
//! # Example
//!
//! ```
//! use temporal_scenes::{FilterSettings, SegmentationOptions};
//!
//! let settings = FilterSettings::new()
//!     .with_min_frame_similarity(0.9)
//!     .with_max_time_distance(120_000.0);
//! let options = SegmentationOptions::new()
//!     .with_filter_settings(settings)
//!     .with_batch_size(50);
//! assert_eq!(options.filter_settings().max_time_distance(), 120_000);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use serde_json::Value;

use crate::progress::{NoOpProgress, ProgressCallback};

const ONE_MINUTE_MS: u64 = 60 * 1_000;

/// Default minimum embedding similarity for two frames to relate shots.
pub const DEFAULT_MIN_FRAME_SIMILARITY: f64 = 0.80;

/// Default maximum distance in milliseconds between related frames.
pub const DEFAULT_MAX_TIME_DISTANCE: u64 = 3 * ONE_MINUTE_MS;

/// Shortest accepted `max_time_distance`.
pub const MIN_TIME_DISTANCE: u64 = ONE_MINUTE_MS;

/// Longest accepted `max_time_distance`.
pub const MAX_TIME_DISTANCE: u64 = 10 * ONE_MINUTE_MS;

/// Thresholds controlling how far the scene builder reaches when relating
/// shots.
///
/// Values outside the accepted ranges are ignored with a warning and the
/// previous value kept, so a settings object is always valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    min_frame_similarity: f64,
    max_time_distance: u64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterSettings {
    /// Settings with the default thresholds (0.80, 3 minutes).
    pub fn new() -> Self {
        Self {
            min_frame_similarity: DEFAULT_MIN_FRAME_SIMILARITY,
            max_time_distance: DEFAULT_MAX_TIME_DISTANCE,
        }
    }

    /// Set the minimum frame similarity. Accepts values in `[0, 1)`.
    #[must_use]
    pub fn with_min_frame_similarity(mut self, value: f64) -> Self {
        if value.is_finite() && (0.0..1.0).contains(&value) {
            self.min_frame_similarity = value;
        } else {
            log::warn!("Ignoring minFrameSimilarity {value}: expected a value in [0, 1)");
        }
        self
    }

    /// Set the maximum time distance in milliseconds. Accepts values between
    /// one and ten minutes.
    #[must_use]
    pub fn with_max_time_distance(mut self, value: f64) -> Self {
        if value.is_finite()
            && (MIN_TIME_DISTANCE as f64..=MAX_TIME_DISTANCE as f64).contains(&value)
        {
            self.max_time_distance = value.round() as u64;
        } else {
            log::warn!(
                "Ignoring maxTimeDistance {value}: expected {MIN_TIME_DISTANCE} to {MAX_TIME_DISTANCE} ms"
            );
        }
        self
    }

    /// Build settings from a user-supplied JSON object such as
    /// `{"minFrameSimilarity": "0.85", "maxTimeDistance": 240000}`.
    ///
    /// Fields may be numbers or numeric strings; missing, malformed or
    /// out-of-range fields keep their defaults.
    pub fn from_user_settings(value: &Value) -> Self {
        let mut settings = Self::new();

        if let Some(similarity) = value.get("minFrameSimilarity").and_then(coerce_number) {
            settings = settings.with_min_frame_similarity(similarity);
        }
        if let Some(distance) = value.get("maxTimeDistance").and_then(coerce_number) {
            settings = settings.with_max_time_distance(distance);
        }

        settings
    }

    /// Minimum frame similarity in `[0, 1)`.
    pub fn min_frame_similarity(&self) -> f64 {
        self.min_frame_similarity
    }

    /// Maximum time distance in milliseconds.
    pub fn max_time_distance(&self) -> u64 {
        self.max_time_distance
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Null => None,
        other => {
            log::warn!("Ignoring non-numeric filter setting {other}");
            None
        }
    }
}

/// Options for the selector and scene builder.
///
/// A default-constructed value uses default [`FilterSettings`], no progress
/// callback and a batch size of 1.
#[derive(Clone)]
pub struct SegmentationOptions {
    pub(crate) filter: FilterSettings,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
}

impl Debug for SegmentationOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SegmentationOptions")
            .field("filter", &self.filter)
            .field("has_progress", &true)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            filter: FilterSettings::new(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Replace the filter settings.
    #[must_use]
    pub fn with_filter_settings(mut self, settings: FilterSettings) -> Self {
        self.filter = settings;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The filter settings.
    pub fn filter_settings(&self) -> &FilterSettings {
        &self.filter
    }
}
