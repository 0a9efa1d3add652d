use std::cmp::Ordering;
use std::ops::{Add, Sub};

use crate::foundation::error::{LaminaError, LaminaResult};

pub use kurbo::{Affine, Vec2};

/// Exact rational presentation time: `value / timescale` seconds.
///
/// Values are stored in lowest terms, so derived equality and hashing agree with [`Ord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawMediaTime", into = "RawMediaTime")]
pub struct MediaTime {
    value: i64,
    timescale: u32,
}

#[derive(Clone, Copy, serde::Serialize, serde::Deserialize)]
struct RawMediaTime {
    value: i64,
    timescale: u32,
}

impl TryFrom<RawMediaTime> for MediaTime {
    type Error = LaminaError;

    fn try_from(raw: RawMediaTime) -> LaminaResult<Self> {
        Self::new(raw.value, raw.timescale)
    }
}

impl From<MediaTime> for RawMediaTime {
    fn from(t: MediaTime) -> Self {
        Self {
            value: t.value,
            timescale: t.timescale,
        }
    }
}

impl MediaTime {
    /// Time zero.
    pub const ZERO: Self = Self {
        value: 0,
        timescale: 1,
    };

    /// Build `value / timescale`; `timescale` must be > 0.
    pub fn new(value: i64, timescale: u32) -> LaminaResult<Self> {
        if timescale == 0 {
            return Err(LaminaError::validation("MediaTime timescale must be > 0"));
        }
        Ok(Self::reduced(i128::from(value), i128::from(timescale)))
    }

    /// Whole seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self {
            value: secs,
            timescale: 1,
        }
    }

    /// Milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self::reduced(i128::from(millis), 1000)
    }

    /// Nearest representable time for `secs` at the given `timescale`.
    pub fn from_secs_f64(secs: f64, timescale: u32) -> LaminaResult<Self> {
        if !secs.is_finite() {
            return Err(LaminaError::validation("MediaTime seconds must be finite"));
        }
        let value = (secs * f64::from(timescale)).round();
        if value.abs() > i64::MAX as f64 {
            return Err(LaminaError::validation("MediaTime seconds out of range"));
        }
        Self::new(value as i64, timescale)
    }

    /// Numerator in lowest terms.
    pub fn value(self) -> i64 {
        self.value
    }

    /// Denominator in lowest terms.
    pub fn timescale(self) -> u32 {
        self.timescale
    }

    /// Lossy conversion to floating-point seconds.
    pub fn as_secs_f64(self) -> f64 {
        (self.value as f64) / f64::from(self.timescale)
    }

    /// Whether this time is exactly zero.
    pub fn is_zero(self) -> bool {
        self.value == 0
    }

    /// Whether this time is strictly negative.
    pub fn is_negative(self) -> bool {
        self.value < 0
    }

    fn reduced(value: i128, timescale: i128) -> Self {
        let mut value = value;
        let mut timescale = timescale.max(1);
        let g = gcd(value.unsigned_abs(), timescale.unsigned_abs()) as i128;
        if g > 1 {
            value /= g;
            timescale /= g;
        }
        // Out-of-range results are rescaled to the coarsest timescale that still fits.
        while timescale > i128::from(u32::MAX)
            || value > i128::from(i64::MAX)
            || value < i128::from(i64::MIN)
        {
            value /= 2;
            timescale /= 2;
            if timescale == 0 {
                timescale = 1;
                break;
            }
        }
        Self {
            value: value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
            timescale: timescale as u32,
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.value) * i128::from(other.timescale);
        let rhs = i128::from(other.value) * i128::from(self.timescale);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for MediaTime {
    type Output = MediaTime;

    fn add(self, rhs: Self) -> Self::Output {
        let a = i128::from(self.value) * i128::from(rhs.timescale);
        let b = i128::from(rhs.value) * i128::from(self.timescale);
        Self::reduced(a + b, i128::from(self.timescale) * i128::from(rhs.timescale))
    }
}

impl Sub for MediaTime {
    type Output = MediaTime;

    fn sub(self, rhs: Self) -> Self::Output {
        let a = i128::from(self.value) * i128::from(rhs.timescale);
        let b = i128::from(rhs.value) * i128::from(self.timescale);
        Self::reduced(a - b, i128::from(self.timescale) * i128::from(rhs.timescale))
    }
}

impl Default for MediaTime {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Half-open time interval `[start, start + duration)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawTimeRange", into = "RawTimeRange")]
pub struct TimeRange {
    /// Inclusive start.
    pub start: MediaTime,
    /// Non-negative length.
    pub duration: MediaTime,
}

#[derive(Clone, Copy, serde::Serialize, serde::Deserialize)]
struct RawTimeRange {
    start: MediaTime,
    duration: MediaTime,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = LaminaError;

    fn try_from(raw: RawTimeRange) -> LaminaResult<Self> {
        Self::new(raw.start, raw.duration)
    }
}

impl From<TimeRange> for RawTimeRange {
    fn from(r: TimeRange) -> Self {
        Self {
            start: r.start,
            duration: r.duration,
        }
    }
}

impl TimeRange {
    /// The empty range at time zero.
    pub const EMPTY: Self = Self {
        start: MediaTime::ZERO,
        duration: MediaTime::ZERO,
    };

    /// Build a range from a start and a non-negative duration.
    pub fn new(start: MediaTime, duration: MediaTime) -> LaminaResult<Self> {
        if duration.is_negative() {
            return Err(LaminaError::validation("TimeRange duration must be >= 0"));
        }
        Ok(Self { start, duration })
    }

    /// Build a range from `[start, end)`; `start` must be <= `end`.
    pub fn from_start_end(start: MediaTime, end: MediaTime) -> LaminaResult<Self> {
        if start > end {
            return Err(LaminaError::validation("TimeRange start must be <= end"));
        }
        Ok(Self {
            start,
            duration: end - start,
        })
    }

    /// Exclusive end.
    pub fn end(self) -> MediaTime {
        self.start + self.duration
    }

    /// Whether the range covers no time at all.
    pub fn is_empty(self) -> bool {
        !(self.duration > MediaTime::ZERO)
    }

    /// `start <= t < end`.
    pub fn contains(self, t: MediaTime) -> bool {
        self.start <= t && t < self.end()
    }

    /// Overlap of two ranges; an empty range when they only touch or are disjoint.
    pub fn intersection(self, other: Self) -> Self {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        if end <= start {
            return Self {
                start,
                duration: MediaTime::ZERO,
            };
        }
        Self {
            start,
            duration: end - start,
        }
    }

    /// Non-empty overlap test; touching ranges do not intersect.
    pub fn intersects(self, other: Self) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Same duration, start moved by `delta`.
    pub fn shifted(self, delta: MediaTime) -> Self {
        Self {
            start: self.start + delta,
            duration: self.duration,
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Zero-based frame number.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive start.
    pub start: FrameIndex,
    /// Exclusive end.
    pub end: FrameIndex,
}

impl FrameRange {
    /// Build a range; `start` must be <= `end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> LaminaResult<Self> {
        if start.0 > end.0 {
            return Err(LaminaError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames covered.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Whether the range covers no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// `start <= f < end`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

/// Frame rate as a rational `num / den` frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Frames.
    pub num: u32,
    /// Seconds; must be > 0.
    pub den: u32,
}

impl Fps {
    /// Build a frame rate; both terms must be > 0.
    pub fn new(num: u32, den: u32) -> LaminaResult<Self> {
        if den == 0 {
            return Err(LaminaError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(LaminaError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Duration of one frame.
    pub fn frame_duration(self) -> MediaTime {
        MediaTime::reduced(i128::from(self.den), i128::from(self.num))
    }

    /// Presentation time of `frame`.
    pub fn time_of(self, frame: FrameIndex) -> MediaTime {
        MediaTime::reduced(
            i128::from(frame.0) * i128::from(self.den),
            i128::from(self.num),
        )
    }
}

/// Pixel dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Build a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
