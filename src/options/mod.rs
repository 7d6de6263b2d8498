//! Render parameters and their resolution against source metadata.

use std::fmt;

use crate::foundation::core::{
    ChannelLayout, DEFAULT_FADETIME_MS, DEFAULT_PLAYTIME_MS, DEFAULT_SAMPLE_RATE,
    validate_sample_rate,
};
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};
use crate::source::{Source, TrackSelection};

/// Channel mask / mute accumulation.
pub mod mask;

pub use mask::{ChannelDirective, ChannelMasks, ChannelSet, MaskCompiler};

/// Parameters of one render.
///
/// `length_ms`/`fade_ms` start out as the built-in (or user-supplied) defaults and are
/// replaced by embedded metadata during resolution.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderOptions {
    /// Play time before the fade, in milliseconds.
    pub length_ms: i32,
    /// Fade-out time, in milliseconds.
    pub fade_ms: i32,
    /// Output sample rate in Hz.
    pub sample_rate: f64,
    /// Output channel layout.
    pub channels: ChannelLayout,
    /// 1-based track requested by the user.
    pub track: i32,
    /// Render exactly `length_ms + fade_ms`, skipping loop detection.
    pub force_length: bool,
    /// Emit trigger waveforms instead of the mixed output.
    pub trigger: bool,
    /// Engine-level solo/silence mask.
    pub mask: ChannelSet,
    /// Channels silenced through the volume table.
    pub mute: ChannelSet,
    /// Suppress informational output.
    pub quiet: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            length_ms: DEFAULT_PLAYTIME_MS,
            fade_ms: DEFAULT_FADETIME_MS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: ChannelLayout::Mono,
            track: 1,
            force_length: false,
            trigger: false,
            mask: ChannelSet::empty(),
            mute: ChannelSet::empty(),
            quiet: false,
        }
    }
}

impl RenderOptions {
    /// Install compiled mask/mute sets.
    pub fn with_masks(mut self, masks: ChannelMasks) -> Self {
        self.mask = masks.mask;
        self.mute = masks.mute;
        self
    }

    /// Mask and mute sets as compiled.
    pub fn masks(&self) -> ChannelMasks {
        ChannelMasks {
            mask: self.mask,
            mute: self.mute,
        }
    }

    /// Reject values no render can use.
    pub fn validate(&self) -> Nsf2WavResult<()> {
        if self.length_ms < 0 {
            return Err(Nsf2WavError::usage(format!(
                "length_ms must not be negative, got {}",
                self.length_ms
            )));
        }
        if self.fade_ms < 0 {
            return Err(Nsf2WavError::usage(format!(
                "fade_ms must not be negative, got {}",
                self.fade_ms
            )));
        }
        validate_sample_rate(self.sample_rate)?;
        Ok(())
    }
}

/// Non-fatal shortfall noticed while resolving durations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum ResolveWarning {
    /// No track or source play time; the default is used.
    LengthUndetected {
        /// Play time that will be used.
        default_ms: i32,
    },
    /// No track or source fade time; the default is used.
    FadeUndetected {
        /// Fade time that will be used.
        default_ms: i32,
    },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthUndetected { default_ms } => write!(
                f,
                "could not detect track length, will use default of {default_ms} ms"
            ),
            Self::FadeUndetected { default_ms } => write!(
                f,
                "could not detect fade time, will use default of {default_ms} ms"
            ),
        }
    }
}

/// Options after track selection and duration resolution.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderPlan {
    /// Options with final `length_ms`/`fade_ms`.
    pub options: RenderOptions,
    /// Selected track.
    pub track: TrackSelection,
    /// Defaults that had to be used.
    pub warnings: Vec<ResolveWarning>,
}

/// Resolve the track and final durations for `options` against `source`.
///
/// Precedence per value: the track's embedded entry, then the source-level override
/// (playlist entry), then the default already held in `options`.
pub fn resolve(source: &Source, mut options: RenderOptions) -> Nsf2WavResult<RenderPlan> {
    options.validate()?;
    let track = TrackSelection::resolve(source, options.track)?;
    let mut warnings = Vec::new();

    match track.time_ms.or(source.time_override_ms()) {
        Some(ms) => options.length_ms = ms,
        None if !options.force_length => warnings.push(ResolveWarning::LengthUndetected {
            default_ms: options.length_ms,
        }),
        None => {}
    }

    match track.fade_ms.or(source.fade_override_ms()) {
        Some(ms) => options.fade_ms = ms,
        None => warnings.push(ResolveWarning::FadeUndetected {
            default_ms: options.fade_ms,
        }),
    }

    for w in &warnings {
        tracing::warn!("{w}");
    }

    Ok(RenderPlan {
        options,
        track,
        warnings,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/options/mod.rs"]
mod tests;
