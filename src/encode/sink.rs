use crate::foundation::core::ChannelLayout;
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// Configuration provided to a [`PcmSink`] before any payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkConfig {
    /// Final number of frames that will be pushed.
    pub total_frames: u64,
    /// Interleaved layout of every frame.
    pub channels: ChannelLayout,
    /// Output sample rate in Hz.
    pub sample_rate: f64,
}

/// Sink contract for consuming encoded PCM in playback order.
///
/// `begin` is called exactly once with the final frame count, before any payload. The sum of
/// `frames` over all `push_frames` calls equals `SinkConfig::total_frames`.
pub trait PcmSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> Nsf2WavResult<()>;
    /// Push `frames` little-endian frames packed in `bytes`.
    fn push_frames(&mut self, bytes: &[u8], frames: usize) -> Nsf2WavResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> Nsf2WavResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    chunks: Vec<Vec<u8>>,
    frames: u64,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Payload chunks in push order.
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Whole payload, concatenated.
    pub fn payload(&self) -> Vec<u8> {
        self.chunks.concat()
    }

    /// Frames pushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl PcmSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> Nsf2WavResult<()> {
        if self.cfg.is_some() {
            return Err(Nsf2WavError::validation("sink already started"));
        }
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frames(&mut self, bytes: &[u8], frames: usize) -> Nsf2WavResult<()> {
        if self.cfg.is_none() {
            return Err(Nsf2WavError::validation("frames pushed before begin"));
        }
        self.chunks.push(bytes.to_vec());
        self.frames += frames as u64;
        Ok(())
    }

    fn end(&mut self) -> Nsf2WavResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
