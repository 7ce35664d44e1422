//! SMPTE timecode arithmetic.
//!
//! Shot and cue boundaries arrive with both millisecond timestamps and SMPTE
//! timecodes. When a shot is split at a black transition, the second half
//! starts one frame after the transition, so the engine has to step a
//! timecode forward by a frame and convert frame numbers back to time. Drop
//! frame counting (`HH:MM:SS;FF`) is supported at 29.97 and 59.94 fps.

use crate::error::SegmentationError;

/// Frame rates with a well-defined timecode base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRate {
    /// 24000/1001
    Fps23_976,
    /// 24
    Fps24,
    /// 25
    Fps25,
    /// 30000/1001
    Fps29_97,
    /// 30
    Fps30,
    /// 50
    Fps50,
    /// 60000/1001
    Fps59_94,
    /// 60
    Fps60,
}

impl FrameRate {
    /// Map a measured frame rate onto a timecode rate by its integer part.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::InvalidFrameRate`] for rates without a
    /// timecode base (for example 15 or 120 fps).
    pub fn from_fps(frames_per_second: f64) -> Result<Self, SegmentationError> {
        if !frames_per_second.is_finite() {
            return Err(SegmentationError::InvalidFrameRate(frames_per_second));
        }

        match frames_per_second.floor() as i64 {
            23 => Ok(FrameRate::Fps23_976),
            24 => Ok(FrameRate::Fps24),
            25 => Ok(FrameRate::Fps25),
            29 => Ok(FrameRate::Fps29_97),
            30 => Ok(FrameRate::Fps30),
            50 => Ok(FrameRate::Fps50),
            59 => Ok(FrameRate::Fps59_94),
            60 => Ok(FrameRate::Fps60),
            _ => Err(SegmentationError::InvalidFrameRate(frames_per_second)),
        }
    }

    /// Exact rate as `(numerator, denominator)`.
    pub fn rational(self) -> (u64, u64) {
        match self {
            FrameRate::Fps23_976 => (24_000, 1_001),
            FrameRate::Fps24 => (24_000, 1_000),
            FrameRate::Fps25 => (25_000, 1_000),
            FrameRate::Fps29_97 => (30_000, 1_001),
            FrameRate::Fps30 => (30_000, 1_000),
            FrameRate::Fps50 => (50_000, 1_000),
            FrameRate::Fps59_94 => (60_000, 1_001),
            FrameRate::Fps60 => (60_000, 1_000),
        }
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        let (numerator, denominator) = self.rational();
        numerator as f64 / denominator as f64
    }

    /// Whole frames counted per timecode second.
    pub fn timebase(self) -> u64 {
        self.as_f64().round() as u64
    }

    /// Whether drop-frame counting is defined for this rate.
    pub fn supports_drop_frame(self) -> bool {
        matches!(self, FrameRate::Fps29_97 | FrameRate::Fps59_94)
    }

    /// Presentation time of `frame`, rounded to the nearest millisecond.
    pub fn frames_to_milliseconds(self, frame: u64) -> u64 {
        let (numerator, denominator) = self.rational();
        (frame * denominator * 2_000 + numerator) / (2 * numerator)
    }

    /// Frame shown at `milliseconds`, rounded to the nearest frame.
    pub fn milliseconds_to_frames(self, milliseconds: u64) -> u64 {
        let (numerator, denominator) = self.rational();
        (milliseconds * numerator * 2 + denominator * 1_000) / (denominator * 2_000)
    }

    fn drop_count(self) -> u64 {
        (self.as_f64() * 0.066666).round() as u64
    }
}

/// Frame rate and counting mode of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimecodeSettings {
    frame_rate: FrameRate,
    drop_frame: bool,
}

impl TimecodeSettings {
    /// Create settings; drop-frame counting is ignored for rates that do not
    /// define it.
    pub fn new(frame_rate: FrameRate, drop_frame: bool) -> Self {
        let drop_frame = if drop_frame && !frame_rate.supports_drop_frame() {
            log::warn!("Drop-frame timecode is not defined for {frame_rate:?}; using non-drop");
            false
        } else {
            drop_frame
        };

        Self {
            frame_rate,
            drop_frame,
        }
    }

    /// The asset frame rate.
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// Whether timecodes are drop-frame.
    pub fn drop_frame(&self) -> bool {
        self.drop_frame
    }

    /// Presentation time of `frame` in milliseconds.
    pub fn frames_to_milliseconds(&self, frame: u64) -> u64 {
        self.frame_rate.frames_to_milliseconds(frame)
    }

    /// Format a frame count as SMPTE timecode in this asset's counting mode.
    pub fn to_timecode(&self, frame: u64) -> String {
        if self.drop_frame {
            to_drop_frame_timecode(self.frame_rate, frame)
        } else {
            to_non_drop_frame_timecode(self.frame_rate, frame)
        }
    }

    /// Parse an SMPTE timecode into a frame count.
    ///
    /// `HH:MM:SS:FF` is read as non-drop and `HH:MM:SS;FF` as drop-frame,
    /// whatever the configured mode.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::InvalidTimecode`] for malformed strings
    /// or a drop-frame timecode at a rate that does not define it.
    pub fn from_timecode(&self, timecode: &str) -> Result<u64, SegmentationError> {
        let invalid = || SegmentationError::InvalidTimecode(timecode.to_string());

        let fields: Vec<&str> = timecode.trim().split(':').collect();
        let (parts, drop_frame) = match fields.as_slice() {
            [hours, minutes, seconds, frames] => ([*hours, *minutes, *seconds, *frames], false),
            [hours, minutes, rest] => {
                let (seconds, frames) = rest.split_once(';').ok_or_else(invalid)?;
                ([*hours, *minutes, seconds, frames], true)
            }
            _ => return Err(invalid()),
        };

        let mut values = [0_u64; 4];
        for (value, part) in values.iter_mut().zip(parts) {
            *value = part.parse().map_err(|_| invalid())?;
        }
        let [hours, minutes, seconds, frames] = values;

        let timebase = self.frame_rate.timebase();
        let nominal = timebase * 3_600 * hours + timebase * 60 * minutes + timebase * seconds + frames;

        if !drop_frame {
            return Ok(nominal);
        }

        if !self.frame_rate.supports_drop_frame() {
            return Err(invalid());
        }

        let total_minutes = 60 * hours + minutes;
        let dropped = self.frame_rate.drop_count() * (total_minutes - total_minutes / 10);
        nominal.checked_sub(dropped).ok_or_else(invalid)
    }

    /// The timecode one frame after `timecode`.
    ///
    /// # Errors
    ///
    /// Propagates [`from_timecode`](Self::from_timecode) failures.
    pub fn next_frame_timecode(&self, timecode: &str) -> Result<String, SegmentationError> {
        Ok(self.to_timecode(self.from_timecode(timecode)? + 1))
    }
}

fn split_fields(frame: u64, timebase: u64) -> (u64, u64, u64, u64) {
    let total_seconds = frame / timebase;
    (
        total_seconds / 3_600,
        (total_seconds / 60) % 60,
        total_seconds % 60,
        frame % timebase,
    )
}

fn to_non_drop_frame_timecode(frame_rate: FrameRate, frame: u64) -> String {
    let timebase = frame_rate.timebase();
    let frame = frame % (timebase * 3_600 * 24);
    let (hours, minutes, seconds, frames) = split_fields(frame, timebase);
    format!("{hours:02}:{minutes:02}:{seconds:02}:{frames:02}")
}

fn to_drop_frame_timecode(frame_rate: FrameRate, frame: u64) -> String {
    let rate = frame_rate.as_f64();
    let dropped = frame_rate.drop_count();
    let frames_per_minute = frame_rate.timebase() * 60 - dropped;
    let frames_per_ten_minutes = (rate * 600.0).round() as u64;
    let frames_per_day = (rate * 3_600.0).round() as u64 * 24;

    let mut frame = frame % frames_per_day;
    let tens = frame / frames_per_ten_minutes;
    let remainder = frame % frames_per_ten_minutes;

    frame += dropped * 9 * tens;
    if remainder > dropped {
        frame += dropped * ((remainder - dropped) / frames_per_minute);
    }

    let (hours, minutes, seconds, frames) = split_fields(frame, frame_rate.timebase());
    format!("{hours:02}:{minutes:02}:{seconds:02};{frames:02}")
}
