//! nsf2wav renders NES Sound Format music to 16-bit PCM WAV files.
//!
//! The pipeline is single-threaded and runs one track per invocation:
//!
//! - Load a [`Source`] (NSF, NSFe, NSF2 or an M3U playlist entry)
//! - Resolve [`RenderOptions`] against its metadata and compile channel masks
//! - Drive an [`Engine`] through a [`RenderLoop`]: loop detection, final configuration, then
//!   chunked rendering into a [`PcmSink`] such as [`WavWriter`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Shared primitives: errors, constants, byte-level field codecs.
pub mod foundation;

/// PCM encoding and output sinks.
pub mod encode;
/// Synthesis engine contract and bundled engines.
pub mod engine;
/// Render parameters, resolution and channel masks.
pub mod options;
/// Loop detection and the render loop.
pub mod render;
/// Source files and playlist entries.
pub mod source;

pub use crate::foundation::core::ChannelLayout;
pub use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

pub use crate::encode::{InMemorySink, PcmSink, SinkConfig, WavHeader, WavWriter};
pub use crate::engine::{
    Engine, EngineSession, EngineSettings, Progress, ScriptedEngine, SilentEngine,
};
pub use crate::options::{
    ChannelDirective, ChannelMasks, ChannelSet, MaskCompiler, RenderOptions, RenderPlan,
    ResolveWarning,
};
pub use crate::render::{DetectOutcome, RenderLoop, RenderPhase, RenderReport};
pub use crate::source::{PlaylistEntry, Source, SourceFormat, TrackListing, TrackSelection};

#[cfg(test)]
#[path = "../tests/unit/fixtures.rs"]
mod fixtures;
