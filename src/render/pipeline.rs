use crate::encode::{FrameBuffer, PcmSink, SinkConfig};
use crate::engine::{Engine, EngineSession, EngineSettings, Mixing};
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};
use crate::options::{self, RenderOptions, RenderPlan, ResolveWarning};
use crate::render::detect::{DetectOutcome, detect, detection_settings};
use crate::source::{Source, TrackSelection};

/// Where a [`RenderLoop`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum RenderPhase {
    /// Waiting for options to be resolved and a plan to execute.
    Resolving,
    /// Dry-running the engine for the loop point.
    Detecting,
    /// Applying the final engine configuration.
    Configuring,
    /// Streaming frames into the sink.
    Rendering,
    /// Every frame has been written.
    Done,
    /// A step failed; the loop accepts no further calls.
    Failed,
}

/// Summary of a finished render.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderReport {
    /// Track that was rendered.
    pub track: TrackSelection,
    /// Play time the engine rendered with (trigger mode folds a detected fade into it).
    pub length_ms: i32,
    /// Fade time the engine rendered with.
    pub fade_ms: i32,
    /// Frames written after the header.
    pub total_frames: u64,
    /// How `total_frames` was decided.
    pub outcome: DetectOutcome,
    /// Engine render calls issued.
    pub chunks: u64,
    /// Defaults used during resolution.
    pub warnings: Vec<ResolveWarning>,
}

/// Drives one track from resolved options to a finished sink.
///
/// The loop owns its [`EngineSession`] exclusively. Phases only move forward; any error
/// parks the loop in [`RenderPhase::Failed`].
#[derive(Debug)]
pub struct RenderLoop<E: Engine> {
    session: EngineSession<E>,
    phase: RenderPhase,
}

impl<E: Engine> RenderLoop<E> {
    /// Wrap a fresh engine.
    pub fn new(engine: E) -> Self {
        Self {
            session: EngineSession::new(engine),
            phase: RenderPhase::Resolving,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Borrow the engine session.
    pub fn session(&self) -> &EngineSession<E> {
        &self.session
    }

    /// Unwrap the engine.
    pub fn into_engine(self) -> E {
        self.session.into_engine()
    }

    /// Resolve track and durations for `requested`.
    pub fn resolve(
        &mut self,
        source: &Source,
        requested: RenderOptions,
    ) -> Nsf2WavResult<RenderPlan> {
        self.expect_phase("resolve", RenderPhase::Resolving)?;
        options::resolve(source, requested).inspect_err(|_| self.phase = RenderPhase::Failed)
    }

    /// Detect, configure and render `plan` into the sink built by `open_sink`.
    ///
    /// `open_sink` runs once the frame count is final and immediately before the header is
    /// written, so nothing is created when an earlier step fails.
    #[tracing::instrument(skip_all, fields(track = plan.track.number))]
    pub fn execute<S, F>(
        &mut self,
        source: &Source,
        plan: RenderPlan,
        open_sink: F,
    ) -> Nsf2WavResult<RenderReport>
    where
        S: PcmSink,
        F: FnOnce(&SinkConfig) -> Nsf2WavResult<S>,
    {
        self.expect_phase("execute", RenderPhase::Resolving)?;
        self.run(source, plan, open_sink)
            .inspect_err(|_| self.phase = RenderPhase::Failed)
    }

    fn run<S, F>(
        &mut self,
        source: &Source,
        plan: RenderPlan,
        open_sink: F,
    ) -> Nsf2WavResult<RenderReport>
    where
        S: PcmSink,
        F: FnOnce(&SinkConfig) -> Nsf2WavResult<S>,
    {
        let opts = &plan.options;

        self.phase = RenderPhase::Detecting;
        let base = EngineSettings {
            play_time_ms: opts.length_ms,
            fade_time_ms: opts.fade_ms,
            ..EngineSettings::default()
        };
        let initial = if opts.force_length {
            base
        } else {
            detection_settings(&base)
        };
        self.session.setup(
            source,
            &initial,
            opts.sample_rate,
            opts.channels,
            plan.track.song_index,
        )?;
        let detection = detect(&mut self.session, &initial, opts)?;

        self.phase = RenderPhase::Configuring;
        let mut settings = detection.settings;
        settings.mask = opts.mask;
        settings.trigger = opts.trigger;
        if opts.trigger {
            settings.mixing = Mixing::linear();
        }
        settings.channel_volume = opts.masks().volume_table();
        self.session.reconfigure(&settings)?;
        let (length_ms, fade_ms) = (settings.play_time_ms, settings.fade_time_ms);

        self.phase = RenderPhase::Rendering;
        let cfg = SinkConfig {
            total_frames: detection.total_frames,
            channels: opts.channels,
            sample_rate: opts.sample_rate,
        };
        let mut sink = open_sink(&cfg)?;
        sink.begin(cfg)?;
        let chunks = self.stream(&mut sink, &cfg)?;
        sink.end()?;
        self.session.finish()?;
        self.phase = RenderPhase::Done;

        Ok(RenderReport {
            length_ms,
            fade_ms,
            total_frames: detection.total_frames,
            outcome: detection.outcome,
            chunks,
            warnings: plan.warnings,
            track: plan.track,
        })
    }

    fn stream<S: PcmSink>(&mut self, sink: &mut S, cfg: &SinkConfig) -> Nsf2WavResult<u64> {
        let mut buffer = FrameBuffer::new(cfg.channels);
        let mut remaining = cfg.total_frames;
        let mut chunks = 0u64;
        while remaining > 0 {
            let frames = remaining.min(buffer.capacity_frames() as u64) as usize;
            let written = self
                .session
                .render(buffer.samples_mut(frames)?, frames as u32)?;
            let written = (written as usize).min(frames);
            if written < frames {
                tracing::debug!(written, frames, "engine rendered a short chunk; padding");
                buffer.silence(written, frames)?;
            }
            sink.push_frames(buffer.encode(frames)?, frames)?;
            remaining -= frames as u64;
            chunks += 1;
            tracing::trace!(remaining, "chunk written");
        }
        Ok(chunks)
    }

    fn expect_phase(&self, call: &str, phase: RenderPhase) -> Nsf2WavResult<()> {
        if self.phase == phase {
            return Ok(());
        }
        Err(Nsf2WavError::engine(format!(
            "{call} is not allowed in the {:?} phase",
            self.phase
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
