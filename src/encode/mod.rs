//! PCM encoding and output sinks.
//!
//! Rendered frames are packed little-endian by [`frames`] and streamed, header first, into a
//! [`PcmSink`](sink::PcmSink). The RIFF/WAVE writer lives in [`wav`].

/// Sample packing and the reusable per-chunk buffers.
pub mod frames;
/// Sink contract and the in-memory sink.
pub mod sink;
/// RIFF/WAVE header and streaming writer.
pub mod wav;

pub use frames::{FrameBuffer, encode_frames};
pub use sink::{InMemorySink, PcmSink, SinkConfig};
pub use wav::{WAV_HEADER_LEN, WavHeader, WavWriter};
