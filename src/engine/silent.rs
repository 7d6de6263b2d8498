use crate::engine::{Engine, EngineSettings, Progress};
use crate::foundation::core::{ChannelLayout, DEFAULT_SAMPLE_RATE, ms_to_frames};
use crate::source::Source;

/// Engine that accepts any source and renders digital silence.
///
/// It follows the configured fader (fading once `play_time_ms` has elapsed) but never
/// reports a loop, so duration resolution falls back to the candidate length.
#[derive(Clone, Debug)]
pub struct SilentEngine {
    settings: EngineSettings,
    sample_rate: f64,
    layout: ChannelLayout,
    total_frames: u64,
}

impl Default for SilentEngine {
    fn default() -> Self {
        Self {
            settings: EngineSettings::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            layout: ChannelLayout::Mono,
            total_frames: 0,
        }
    }
}

impl SilentEngine {
    /// A fresh engine.
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(&mut self, frames: u32) {
        self.total_frames = self.total_frames.saturating_add(u64::from(frames));
    }
}

impl Engine for SilentEngine {
    fn load(&mut self, source: &Source) -> Result<(), String> {
        tracing::debug!(
            songs = source.total_songs,
            program_len = source.program.len(),
            "silent engine loaded source"
        );
        Ok(())
    }

    fn configure(&mut self, settings: &EngineSettings) {
        self.settings = settings.clone();
    }

    fn set_sample_rate(&mut self, rate: f64) {
        self.sample_rate = rate;
    }

    fn set_channel_count(&mut self, layout: ChannelLayout) {
        self.layout = layout;
    }

    fn select_song(&mut self, index: u32) {
        tracing::debug!(song = index, "song selected");
    }

    fn reset(&mut self) {
        self.total_frames = 0;
    }

    fn skip(&mut self, frames: u32) -> Progress {
        self.advance(frames);
        self.progress()
    }

    fn render(&mut self, out: &mut [i16], frames: u32) -> u32 {
        let samples = (frames as usize * self.layout.count()).min(out.len());
        out[..samples].fill(0);
        let written = (samples / self.layout.count()) as u32;
        self.advance(written);
        written
    }

    fn progress(&self) -> Progress {
        let play_frames = ms_to_frames(self.settings.play_time_ms.into(), self.sample_rate);
        Progress {
            fading: self.total_frames >= play_frames,
            loop_detected: false,
            total_frames: self.total_frames,
            fade_time_ms: self.settings.fade_time_ms,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/silent.rs"]
mod tests;
