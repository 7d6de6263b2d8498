//! Synthesis engine contract.
//!
//! The engine decodes the program image and produces PCM. It is consumed here, not
//! implemented: [`Engine`] is the seam, [`EngineSession`] enforces call order, and the
//! bundled [`SilentEngine`] / [`ScriptedEngine`] stand in when no APU core is linked.

use crate::foundation::core::ChannelLayout;
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};
use crate::options::ChannelSet;
use crate::options::mask::{CHANNEL_CAPACITY, FULL_GAIN};
use crate::source::Source;

/// Deterministic engine double.
pub mod scripted;
/// Call-order state machine around an [`Engine`].
pub mod session;
/// Engine that renders digital silence.
pub mod silent;

pub use scripted::{EngineCall, ScriptedEngine};
pub use session::{EngineSession, SessionState};
pub use silent::SilentEngine;

/// Observable playback state, returned from every advancing call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Progress {
    /// The engine has entered its fade-out.
    pub fading: bool,
    /// Automatic detection found the loop point.
    pub loop_detected: bool,
    /// Frames advanced (skipped or rendered) since the last reset.
    pub total_frames: u64,
    /// Fade time the engine will apply, in milliseconds.
    pub fade_time_ms: i32,
}

/// Output mixing toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Mixing {
    /// 2A03 pulse nonlinear mixing.
    pub apu1_nonlinear: bool,
    /// 2A03 triangle/noise/DPCM nonlinear mixing.
    pub apu2_nonlinear: bool,
    /// MMC5 nonlinear mixing.
    pub mmc5_nonlinear: bool,
    /// N163 serial channel multiplexing.
    pub n163_serial: bool,
    /// FDS output lowpass cutoff in Hz.
    pub fds_lowpass_hz: u32,
}

impl Default for Mixing {
    fn default() -> Self {
        Self {
            apu1_nonlinear: true,
            apu2_nonlinear: true,
            mmc5_nonlinear: true,
            n163_serial: true,
            fds_lowpass_hz: 2_000,
        }
    }
}

impl Mixing {
    /// Linear mixing with the FDS lowpass pushed out of the audible band.
    pub fn linear() -> Self {
        Self {
            apu1_nonlinear: false,
            apu2_nonlinear: false,
            mmc5_nonlinear: false,
            n163_serial: false,
            fds_lowpass_hz: 96_000,
        }
    }
}

/// Typed engine configuration, applied atomically by [`Engine::configure`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EngineSettings {
    /// Master volume (128 is unity in the engine's scale).
    pub master_volume: u32,
    /// Randomize the noise LFSR phase on reset.
    pub randomize_noise_phase: bool,
    /// Randomize the triangle sequencer phase on reset.
    pub randomize_triangle_phase: bool,
    /// Run loop detection while playing.
    pub auto_detect: bool,
    /// Loop repetitions before the fade starts.
    pub loop_count: u32,
    /// Loop detection window in milliseconds.
    pub detect_interval_ms: u32,
    /// Channels silenced at the source (solo/silence instruction).
    pub mask: ChannelSet,
    /// Output trigger waveforms instead of the mix.
    pub trigger: bool,
    /// Mixing toggles.
    pub mixing: Mixing,
    /// Per-channel gain, [`FULL_GAIN`] for audible channels.
    pub channel_volume: [u16; CHANNEL_CAPACITY as usize],
    /// Hard stop, in whole seconds of playback.
    pub stop_after_secs: Option<u32>,
    /// Play time the engine's fader follows.
    pub play_time_ms: i32,
    /// Fade time the engine's fader follows.
    pub fade_time_ms: i32,
}

/// Master volume used for rendering (double the engine default of 128).
pub const RENDER_MASTER_VOLUME: u32 = 256;
/// Loop repetitions used while detecting.
pub const DETECT_LOOP_COUNT: u32 = 2;
/// Detection window used while detecting.
pub const DETECT_INTERVAL_MS: u32 = 1_000;

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            master_volume: RENDER_MASTER_VOLUME,
            randomize_noise_phase: false,
            randomize_triangle_phase: false,
            auto_detect: false,
            loop_count: 0,
            detect_interval_ms: DETECT_INTERVAL_MS,
            mask: ChannelSet::empty(),
            trigger: false,
            mixing: Mixing::default(),
            channel_volume: [FULL_GAIN; CHANNEL_CAPACITY as usize],
            stop_after_secs: None,
            play_time_ms: crate::foundation::core::DEFAULT_PLAYTIME_MS,
            fade_time_ms: crate::foundation::core::DEFAULT_FADETIME_MS,
        }
    }
}

impl EngineSettings {
    /// Reject combinations the engine cannot honor.
    pub fn validate(&self) -> Nsf2WavResult<()> {
        if self.auto_detect && self.loop_count == 0 {
            return Err(Nsf2WavError::validation(
                "loop detection needs a non-zero loop count",
            ));
        }
        if self.auto_detect && self.detect_interval_ms == 0 {
            return Err(Nsf2WavError::validation(
                "loop detection needs a non-zero detection interval",
            ));
        }
        if self.play_time_ms < 0 || self.fade_time_ms < 0 {
            return Err(Nsf2WavError::validation(
                "engine play/fade times must not be negative",
            ));
        }
        Ok(())
    }
}

/// A chiptune synthesis engine.
///
/// Setup calls are idempotent and take effect before the next `skip`/`render`.
pub trait Engine {
    /// Load a parsed source. The error string is shown to the user verbatim.
    fn load(&mut self, source: &Source) -> Result<(), String>;
    /// Replace the whole configuration.
    fn configure(&mut self, settings: &EngineSettings);
    /// Set the output sample rate.
    fn set_sample_rate(&mut self, rate: f64);
    /// Set the output layout.
    fn set_channel_count(&mut self, layout: ChannelLayout);
    /// Choose the zero-based song to play.
    fn select_song(&mut self, index: u32);
    /// Restart the selected song; clears progress counters.
    fn reset(&mut self);
    /// Advance up to `frames` frames without producing output.
    fn skip(&mut self, frames: u32) -> Progress;
    /// Render up to `frames` interleaved frames into `out`, returning frames written.
    fn render(&mut self, out: &mut [i16], frames: u32) -> u32;
    /// Current observables.
    fn progress(&self) -> Progress;
}

#[cfg(test)]
#[path = "../../tests/unit/engine/mod.rs"]
mod tests;
