//! Loop detection and the chunked render loop.
//!
//! [`RenderLoop`] runs the phases `Resolving -> Detecting -> Configuring -> Rendering -> Done`
//! against a single engine session and one [`PcmSink`](crate::encode::PcmSink).

/// Loop-point detection and final frame count.
pub mod detect;
/// Phase-tracked render orchestration.
pub mod pipeline;

pub use detect::{DetectOutcome, Detection, candidate_frames, detect, stop_after_secs};
pub use pipeline::{RenderLoop, RenderPhase, RenderReport};
