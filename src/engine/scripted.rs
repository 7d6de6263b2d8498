use crate::engine::{Engine, EngineSettings, Progress};
use crate::foundation::core::ChannelLayout;
use crate::source::Source;

/// One call observed by a [`ScriptedEngine`].
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCall {
    /// `load`
    Load,
    /// `configure`
    Configure,
    /// `set_sample_rate`
    SampleRate(f64),
    /// `set_channel_count`
    Channels(ChannelLayout),
    /// `select_song`
    Song(u32),
    /// `reset`
    Reset,
    /// `skip` with the requested frame count.
    Skip(u32),
    /// `render` with the requested frame count.
    Render(u32),
}

/// Deterministic engine double.
///
/// The fade starts after a fixed number of frames. Skipping never runs past that point, so
/// detection observes it exactly. When a loop is scripted it is reported (with its own fade
/// time) only while detection is enabled. Rendered samples are a per-frame ramp, identical on
/// every channel, which lets tests check continuity across chunks.
#[derive(Clone, Debug)]
pub struct ScriptedEngine {
    fade_after: u64,
    loop_fade_ms: Option<i32>,
    load_error: Option<String>,
    short_render: Option<u32>,
    settings: Option<EngineSettings>,
    layout: ChannelLayout,
    total_frames: u64,
    calls: Vec<EngineCall>,
}

impl ScriptedEngine {
    /// Engine whose fade starts after `fade_after` frames and which never detects a loop.
    pub fn new(fade_after: u64) -> Self {
        Self {
            fade_after,
            loop_fade_ms: None,
            load_error: None,
            short_render: None,
            settings: None,
            layout: ChannelLayout::Mono,
            total_frames: 0,
            calls: Vec::new(),
        }
    }

    /// Report a detected loop at the fade point, announcing `fade_ms` of fade-out.
    pub fn with_loop(mut self, fade_ms: i32) -> Self {
        self.loop_fade_ms = Some(fade_ms);
        self
    }

    /// Make `load` fail with `msg`.
    pub fn failing_load(mut self, msg: impl Into<String>) -> Self {
        self.load_error = Some(msg.into());
        self
    }

    /// Cap every `render` call at `frames` frames.
    pub fn with_short_render(mut self, frames: u32) -> Self {
        self.short_render = Some(frames);
        self
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Most recent configuration.
    pub fn settings(&self) -> Option<&EngineSettings> {
        self.settings.as_ref()
    }

    /// Sum of frames requested through `render`.
    pub fn rendered_frames(&self) -> u64 {
        self.calls
            .iter()
            .map(|c| match c {
                EngineCall::Render(n) => u64::from(*n),
                _ => 0,
            })
            .sum()
    }

    fn detecting(&self) -> bool {
        self.settings.as_ref().is_some_and(|s| s.auto_detect)
    }
}

impl Engine for ScriptedEngine {
    fn load(&mut self, _source: &Source) -> Result<(), String> {
        self.calls.push(EngineCall::Load);
        match &self.load_error {
            Some(msg) => Err(msg.clone()),
            None => Ok(()),
        }
    }

    fn configure(&mut self, settings: &EngineSettings) {
        self.calls.push(EngineCall::Configure);
        self.settings = Some(settings.clone());
    }

    fn set_sample_rate(&mut self, rate: f64) {
        self.calls.push(EngineCall::SampleRate(rate));
    }

    fn set_channel_count(&mut self, layout: ChannelLayout) {
        self.calls.push(EngineCall::Channels(layout));
        self.layout = layout;
    }

    fn select_song(&mut self, index: u32) {
        self.calls.push(EngineCall::Song(index));
    }

    fn reset(&mut self) {
        self.calls.push(EngineCall::Reset);
        self.total_frames = 0;
    }

    fn skip(&mut self, frames: u32) -> Progress {
        self.calls.push(EngineCall::Skip(frames));
        let step = if self.total_frames < self.fade_after {
            u64::from(frames).min(self.fade_after - self.total_frames)
        } else {
            u64::from(frames)
        };
        self.total_frames += step;
        self.progress()
    }

    fn render(&mut self, out: &mut [i16], frames: u32) -> u32 {
        self.calls.push(EngineCall::Render(frames));
        let frames = self.short_render.map_or(frames, |cap| frames.min(cap));
        let width = self.layout.count();
        let mut written = 0u32;
        for frame in out.chunks_exact_mut(width).take(frames as usize) {
            frame.fill(self.total_frames as u16 as i16);
            self.total_frames += 1;
            written += 1;
        }
        written
    }

    fn progress(&self) -> Progress {
        let fading = self.total_frames >= self.fade_after;
        let loop_detected = fading && self.detecting() && self.loop_fade_ms.is_some();
        let fade_time_ms = match (loop_detected, self.loop_fade_ms) {
            (true, Some(ms)) => ms,
            _ => self.settings.as_ref().map_or(0, |s| s.fade_time_ms),
        };
        Progress {
            fading,
            loop_detected,
            total_frames: self.total_frames,
            fade_time_ms,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/scripted.rs"]
mod tests;
