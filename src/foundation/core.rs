use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// Largest number of frames requested from the engine per skip/render call.
pub const FRAMES_PER_CHUNK: usize = 4096;

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

/// Default play time when neither the track nor the source carries one.
pub const DEFAULT_PLAYTIME_MS: i32 = 3 * 60 * 1000;

/// Default fade time when neither the track nor the source carries one.
pub const DEFAULT_FADETIME_MS: i32 = 8 * 1000;

/// Milliseconds per second, used by all ms <-> frame conversions.
pub const MILLIS_PER_SECOND: u64 = 1000;

/// Bytes per PCM sample (signed 16-bit).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Interleaved output layout.
///
/// Only mono and stereo framing is defined; wider layouts are not representable.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ChannelLayout {
    /// One sample per frame.
    #[default]
    Mono,
    /// Two interleaved samples per frame (left, right).
    Stereo,
}

impl ChannelLayout {
    /// Number of samples per frame.
    pub fn count(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }

    /// Bytes per encoded frame (`count * 2`).
    pub fn block_align(self) -> usize {
        self.count() * BYTES_PER_SAMPLE
    }
}

impl TryFrom<u32> for ChannelLayout {
    type Error = Nsf2WavError;

    fn try_from(n: u32) -> Nsf2WavResult<Self> {
        match n {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            other => Err(Nsf2WavError::usage(format!(
                "channel count must be 1 or 2, got {other}"
            ))),
        }
    }
}

/// Validate a user-supplied sample rate.
///
/// The rate must be finite, positive, and at least 1 Hz once truncated to the integer
/// written into the container header.
pub fn validate_sample_rate(rate: f64) -> Nsf2WavResult<f64> {
    if !rate.is_finite() || rate < 1.0 || rate > f64::from(u32::MAX) {
        return Err(Nsf2WavError::usage(format!(
            "sample rate must be between 1 and {} Hz, got {rate}",
            u32::MAX
        )));
    }
    Ok(rate)
}

/// Convert a duration in milliseconds to a whole number of frames, rounding down.
///
/// Negative durations convert to zero frames.
pub fn ms_to_frames(ms: i64, sample_rate: f64) -> u64 {
    if ms <= 0 {
        return 0;
    }
    ((ms as f64) * sample_rate / MILLIS_PER_SECOND as f64).floor() as u64
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
