use std::io::Write;

use crate::encode::sink::{PcmSink, SinkConfig};
use crate::foundation::bytes::{FieldReader, FieldWriter};
use crate::foundation::core::{BYTES_PER_SAMPLE, ChannelLayout};
use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// Size of the canonical PCM RIFF/WAVE header.
pub const WAV_HEADER_LEN: usize = 44;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = (BYTES_PER_SAMPLE * 8) as u16;
/// RIFF size counts everything after the 8-byte RIFF preamble.
const RIFF_OVERHEAD: u32 = (WAV_HEADER_LEN - 8) as u32;

/// Fields of a 16-bit PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// Interleaved layout.
    pub channels: ChannelLayout,
    /// Sample rate in whole Hz.
    pub sample_rate: u32,
    /// Payload length in bytes.
    pub data_len: u32,
}

impl WavHeader {
    /// Header for `total_frames` frames of `channels` at `sample_rate` (truncated to Hz).
    ///
    /// Fails when the payload, RIFF size or byte rate does not fit the 32-bit fields.
    pub fn for_frames(
        total_frames: u64,
        channels: ChannelLayout,
        sample_rate: f64,
    ) -> Nsf2WavResult<Self> {
        let data_len = total_frames
            .checked_mul(channels.block_align() as u64)
            .and_then(|len| u32::try_from(len).ok())
            .filter(|len| len.checked_add(RIFF_OVERHEAD).is_some())
            .ok_or_else(|| {
                Nsf2WavError::validation(format!(
                    "{total_frames} frames do not fit a WAV payload"
                ))
            })?;
        if !sample_rate.is_finite() || sample_rate < 1.0 || sample_rate > f64::from(u32::MAX) {
            return Err(Nsf2WavError::validation(format!(
                "sample rate {sample_rate} does not fit a WAV header"
            )));
        }
        let header = Self {
            channels,
            sample_rate: sample_rate as u32,
            data_len,
        };
        header.byte_rate()?;
        Ok(header)
    }

    /// Frame count implied by the payload length.
    pub fn total_frames(&self) -> u64 {
        u64::from(self.data_len) / self.channels.block_align() as u64
    }

    fn byte_rate(&self) -> Nsf2WavResult<u32> {
        self.sample_rate
            .checked_mul(self.channels.block_align() as u32)
            .ok_or_else(|| {
                Nsf2WavError::validation(format!(
                    "byte rate for {} Hz overflows the WAV header",
                    self.sample_rate
                ))
            })
    }

    /// Serialize to the 44-byte header.
    pub fn encode(&self) -> Nsf2WavResult<[u8; WAV_HEADER_LEN]> {
        let mut buf = [0u8; WAV_HEADER_LEN];
        let mut w = FieldWriter::new(&mut buf);
        w.tag(b"RIFF")?;
        w.u32_le(self.data_len + RIFF_OVERHEAD)?;
        w.tag(b"WAVE")?;
        w.tag(b"fmt ")?;
        w.u32_le(FMT_CHUNK_LEN)?;
        w.u16_le(FORMAT_PCM)?;
        w.u16_le(self.channels.count() as u16)?;
        w.u32_le(self.sample_rate)?;
        w.u32_le(self.byte_rate()?)?;
        w.u16_le(self.channels.block_align() as u16)?;
        w.u16_le(BITS_PER_SAMPLE)?;
        w.tag(b"data")?;
        w.u32_le(self.data_len)?;
        Ok(buf)
    }

    /// Parse a header produced by [`WavHeader::encode`].
    pub fn decode(data: &[u8]) -> Nsf2WavResult<Self> {
        let mut r = FieldReader::new(data);
        expect_tag(&mut r, b"RIFF")?;
        let riff_len = r.u32_le("RIFF size")?;
        expect_tag(&mut r, b"WAVE")?;
        expect_tag(&mut r, b"fmt ")?;
        if r.u32_le("fmt size")? != FMT_CHUNK_LEN {
            return Err(Nsf2WavError::input("fmt chunk is not 16-byte PCM"));
        }
        if r.u16_le("format")? != FORMAT_PCM {
            return Err(Nsf2WavError::input("audio format is not PCM"));
        }
        let channels = ChannelLayout::try_from(u32::from(r.u16_le("channels")?))
            .map_err(|e| Nsf2WavError::input(e.to_string()))?;
        let sample_rate = r.u32_le("sample rate")?;
        let byte_rate = r.u32_le("byte rate")?;
        let block_align = r.u16_le("block align")?;
        let bits = r.u16_le("bits per sample")?;
        expect_tag(&mut r, b"data")?;
        let data_len = r.u32_le("data size")?;

        let header = Self {
            channels,
            sample_rate,
            data_len,
        };
        if bits != BITS_PER_SAMPLE
            || usize::from(block_align) != channels.block_align()
            || Some(byte_rate) != header.byte_rate().ok()
            || Some(riff_len) != data_len.checked_add(RIFF_OVERHEAD)
        {
            return Err(Nsf2WavError::input("inconsistent WAV header fields"));
        }
        Ok(header)
    }
}

fn expect_tag(r: &mut FieldReader<'_>, tag: &[u8; 4]) -> Nsf2WavResult<()> {
    let what = String::from_utf8_lossy(tag);
    if &r.tag(&what)? != tag {
        return Err(Nsf2WavError::input(format!("missing '{what}' tag")));
    }
    Ok(())
}

/// Streams a 16-bit PCM WAV file: one header, then exactly the declared payload.
#[derive(Debug)]
pub struct WavWriter<W: Write> {
    out: W,
    header: Option<WavHeader>,
    declared_frames: u64,
    written_frames: u64,
}

impl<W: Write> WavWriter<W> {
    /// Wrap `out`; nothing is written until [`WavWriter::write_header`].
    pub fn new(out: W) -> Self {
        Self {
            out,
            header: None,
            declared_frames: 0,
            written_frames: 0,
        }
    }

    /// Header written so far, if any.
    pub fn header(&self) -> Option<WavHeader> {
        self.header
    }

    /// Frames accepted so far.
    pub fn written_frames(&self) -> u64 {
        self.written_frames
    }

    /// Write the header declaring `total_frames` frames. Allowed once.
    pub fn write_header(
        &mut self,
        total_frames: u64,
        channels: ChannelLayout,
        sample_rate: f64,
    ) -> Nsf2WavResult<()> {
        if self.header.is_some() {
            return Err(Nsf2WavError::validation("WAV header already written"));
        }
        let header = WavHeader::for_frames(total_frames, channels, sample_rate)?;
        let bytes = header.encode()?;
        self.out
            .write_all(&bytes)
            .map_err(|e| Nsf2WavError::io("writing WAV header", e))?;
        self.header = Some(header);
        self.declared_frames = total_frames;
        Ok(())
    }

    /// Append `frames` packed frames.
    pub fn write_frames(&mut self, bytes: &[u8], frames: usize) -> Nsf2WavResult<()> {
        let header = self
            .header
            .ok_or_else(|| Nsf2WavError::validation("WAV payload before header"))?;
        let expected = frames
            .checked_mul(header.channels.block_align())
            .ok_or_else(|| Nsf2WavError::validation("frame count overflows"))?;
        if bytes.len() != expected {
            return Err(Nsf2WavError::validation(format!(
                "{} bytes do not hold {frames} {:?} frames",
                bytes.len(),
                header.channels
            )));
        }
        let after = self.written_frames + frames as u64;
        if after > self.declared_frames {
            return Err(Nsf2WavError::validation(format!(
                "{after} frames exceed the {} declared in the header",
                self.declared_frames
            )));
        }
        self.out
            .write_all(bytes)
            .map_err(|e| Nsf2WavError::io("writing WAV payload", e))?;
        self.written_frames = after;
        Ok(())
    }

    /// Flush and check the payload matches the header.
    pub fn finish(&mut self) -> Nsf2WavResult<()> {
        if self.header.is_none() {
            return Err(Nsf2WavError::validation("WAV finished without a header"));
        }
        if self.written_frames != self.declared_frames {
            return Err(Nsf2WavError::validation(format!(
                "WAV payload ended after {} of {} declared frames",
                self.written_frames, self.declared_frames
            )));
        }
        self.out
            .flush()
            .map_err(|e| Nsf2WavError::io("flushing WAV output", e))
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PcmSink for WavWriter<W> {
    fn begin(&mut self, cfg: SinkConfig) -> Nsf2WavResult<()> {
        self.write_header(cfg.total_frames, cfg.channels, cfg.sample_rate)
    }

    fn push_frames(&mut self, bytes: &[u8], frames: usize) -> Nsf2WavResult<()> {
        self.write_frames(bytes, frames)
    }

    fn end(&mut self) -> Nsf2WavResult<()> {
        self.finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/wav.rs"]
mod tests;
