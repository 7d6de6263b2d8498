use crate::foundation::bytes::FieldWriter;
use crate::foundation::core::{BYTES_PER_SAMPLE, ChannelLayout, FRAMES_PER_CHUNK};
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// Pack interleaved samples into `out` as 16-bit little-endian values.
///
/// `samples` must hold whole frames for `layout`; returns the number of bytes written.
pub fn encode_frames(
    samples: &[i16],
    layout: ChannelLayout,
    out: &mut [u8],
) -> Nsf2WavResult<usize> {
    if !samples.len().is_multiple_of(layout.count()) {
        return Err(Nsf2WavError::validation(format!(
            "{} samples do not form whole {layout:?} frames",
            samples.len()
        )));
    }
    let mut w = FieldWriter::new(out);
    for &s in samples {
        w.i16_le(s)?;
    }
    Ok(w.position())
}

/// Sample and byte scratch space for one render chunk.
///
/// Both buffers are sized for [`FRAMES_PER_CHUNK`] frames on construction and reused for
/// every chunk afterwards.
#[derive(Debug)]
pub struct FrameBuffer {
    layout: ChannelLayout,
    samples: Vec<i16>,
    bytes: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate buffers for `layout`.
    pub fn new(layout: ChannelLayout) -> Self {
        let samples = FRAMES_PER_CHUNK * layout.count();
        Self {
            layout,
            samples: vec![0; samples],
            bytes: vec![0; samples * BYTES_PER_SAMPLE],
        }
    }

    /// Frames one chunk can hold.
    pub fn capacity_frames(&self) -> usize {
        FRAMES_PER_CHUNK
    }

    /// Writable sample space for `frames` frames.
    pub fn samples_mut(&mut self, frames: usize) -> Nsf2WavResult<&mut [i16]> {
        let len = self.sample_len(frames)?;
        Ok(&mut self.samples[..len])
    }

    /// Zero the samples of frames `from..to`.
    pub fn silence(&mut self, from: usize, to: usize) -> Nsf2WavResult<()> {
        let start = self.sample_len(from)?;
        let end = self.sample_len(to)?;
        if start > end {
            return Err(Nsf2WavError::validation(format!(
                "silence range {from}..{to} is reversed"
            )));
        }
        self.samples[start..end].fill(0);
        Ok(())
    }

    /// Encode the first `frames` frames and borrow the packed bytes.
    pub fn encode(&mut self, frames: usize) -> Nsf2WavResult<&[u8]> {
        let len = self.sample_len(frames)?;
        let n = encode_frames(&self.samples[..len], self.layout, &mut self.bytes)?;
        Ok(&self.bytes[..n])
    }

    fn sample_len(&self, frames: usize) -> Nsf2WavResult<usize> {
        if frames > FRAMES_PER_CHUNK {
            return Err(Nsf2WavError::validation(format!(
                "chunk of {frames} frames exceeds buffer capacity of {FRAMES_PER_CHUNK}"
            )));
        }
        Ok(frames * self.layout.count())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/frames.rs"]
mod tests;
