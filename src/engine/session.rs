use crate::engine::{Engine, EngineSettings, Progress};
use crate::foundation::core::ChannelLayout;
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};
use crate::source::Source;

/// Where a session is in its `setup -> skip* -> reconfigure -> render* -> finish` lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum SessionState {
    /// Nothing loaded yet.
    Unconfigured,
    /// Loaded and configured; ready to skip or render.
    Configured,
    /// Advancing without output (loop detection).
    Skipping,
    /// Producing output.
    Rendering,
    /// Finished; no further calls are accepted.
    Exhausted,
}

/// An [`Engine`] wrapped in the call-order rules the render loop relies on.
///
/// Configuration always goes through [`EngineSettings::validate`] first, and once output has
/// started the configuration is frozen.
#[derive(Debug)]
pub struct EngineSession<E: Engine> {
    engine: E,
    state: SessionState,
}

impl<E: Engine> EngineSession<E> {
    /// Wrap a fresh engine.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: SessionState::Unconfigured,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Configure, load and position the engine on `song`.
    ///
    /// Load failures surface as [`Nsf2WavError::Input`] carrying the engine's message.
    #[tracing::instrument(skip(self, source, settings), fields(song = song))]
    pub fn setup(
        &mut self,
        source: &Source,
        settings: &EngineSettings,
        sample_rate: f64,
        layout: ChannelLayout,
        song: u32,
    ) -> Nsf2WavResult<()> {
        self.expect_state("setup", &[SessionState::Unconfigured])?;
        settings.validate()?;
        self.engine.configure(settings);
        self.engine.load(source).map_err(Nsf2WavError::input)?;
        self.engine.set_sample_rate(sample_rate);
        self.engine.set_channel_count(layout);
        self.engine.select_song(song);
        self.engine.reset();
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Advance up to `frames` frames without output.
    pub fn skip(&mut self, frames: u32) -> Nsf2WavResult<Progress> {
        self.expect_state("skip", &[SessionState::Configured, SessionState::Skipping])?;
        self.state = SessionState::Skipping;
        Ok(self.engine.skip(frames))
    }

    /// Replace the configuration and restart the song.
    pub fn reconfigure(&mut self, settings: &EngineSettings) -> Nsf2WavResult<()> {
        self.expect_state(
            "reconfigure",
            &[SessionState::Configured, SessionState::Skipping],
        )?;
        settings.validate()?;
        self.engine.configure(settings);
        self.engine.reset();
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Render up to `frames` interleaved frames into `out`.
    pub fn render(&mut self, out: &mut [i16], frames: u32) -> Nsf2WavResult<u32> {
        self.expect_state(
            "render",
            &[SessionState::Configured, SessionState::Rendering],
        )?;
        self.state = SessionState::Rendering;
        Ok(self.engine.render(out, frames))
    }

    /// Mark the session exhausted.
    pub fn finish(&mut self) -> Nsf2WavResult<()> {
        self.expect_state(
            "finish",
            &[SessionState::Configured, SessionState::Rendering],
        )?;
        self.state = SessionState::Exhausted;
        Ok(())
    }

    /// Engine observables.
    pub fn progress(&self) -> Progress {
        self.engine.progress()
    }

    /// Borrow the wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Unwrap the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    fn expect_state(&self, call: &str, allowed: &[SessionState]) -> Nsf2WavResult<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(Nsf2WavError::engine(format!(
            "{call} is not allowed while the session is {:?}",
            self.state
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/session.rs"]
mod tests;
