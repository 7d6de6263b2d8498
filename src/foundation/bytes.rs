//! Explicit little-endian field encoding.
//!
//! Every multi-byte value that crosses a file boundary goes through these helpers so that
//! field width and byte order are spelled out at the call site and never depend on the host.

use std::io::{self, Cursor, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// Sequential writer over a fixed-size byte slice.
///
/// Writes past the end of the slice are reported as validation errors instead of panicking,
/// and a rejected write leaves the position unchanged.
#[derive(Debug)]
pub struct FieldWriter<'a> {
    cur: Cursor<&'a mut [u8]>,
}

impl<'a> FieldWriter<'a> {
    /// Start writing at offset 0 of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            cur: Cursor::new(buf),
        }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.cur.position() as usize
    }

    fn field(
        &mut self,
        len: usize,
        what: &str,
        write: impl FnOnce(&mut Cursor<&'a mut [u8]>) -> io::Result<()>,
    ) -> Nsf2WavResult<()> {
        let capacity = self.cur.get_ref().len();
        let pos = self.position();
        if pos.checked_add(len).is_none_or(|end| end > capacity) {
            return Err(Nsf2WavError::validation(format!(
                "no room for {what} at offset {pos} (capacity {capacity})"
            )));
        }
        write(&mut self.cur)
            .map_err(|e| Nsf2WavError::validation(format!("writing {what} at offset {pos}: {e}")))
    }

    /// Write a four-character chunk tag verbatim.
    pub fn tag(&mut self, tag: &[u8; 4]) -> Nsf2WavResult<()> {
        self.field(4, "tag", |c| c.write_all(tag))
    }

    /// Write a 16-bit unsigned value, least significant byte first.
    pub fn u16_le(&mut self, v: u16) -> Nsf2WavResult<()> {
        self.field(2, "u16", |c| c.write_u16::<LittleEndian>(v))
    }

    /// Write a 32-bit unsigned value, least significant byte first.
    pub fn u32_le(&mut self, v: u32) -> Nsf2WavResult<()> {
        self.field(4, "u32", |c| c.write_u32::<LittleEndian>(v))
    }

    /// Write a 16-bit signed sample, least significant byte first.
    pub fn i16_le(&mut self, v: i16) -> Nsf2WavResult<()> {
        self.field(2, "i16", |c| c.write_i16::<LittleEndian>(v))
    }
}

/// Sequential reader over a byte slice.
///
/// Running out of data is an input error that names the field being read.
#[derive(Clone, Debug)]
pub struct FieldReader<'a> {
    cur: Cursor<&'a [u8]>,
}

impl<'a> FieldReader<'a> {
    /// Start reading at offset 0 of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cur: Cursor::new(data),
        }
    }

    fn data(&self) -> &'a [u8] {
        *self.cur.get_ref()
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.cur.position() as usize
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data().len().saturating_sub(self.position())
    }

    fn ensure(&self, len: usize, what: &str) -> Nsf2WavResult<()> {
        if self.remaining() < len {
            return Err(Nsf2WavError::input(format!(
                "unexpected end of data reading {what} at offset {} (need {len} bytes, have {})",
                self.position(),
                self.remaining()
            )));
        }
        Ok(())
    }

    fn field<T>(
        &mut self,
        len: usize,
        what: &str,
        read: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Nsf2WavResult<T> {
        self.ensure(len, what)?;
        read(&mut self.cur).map_err(|e| Nsf2WavError::input(format!("reading {what}: {e}")))
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize, what: &str) -> Nsf2WavResult<&'a [u8]> {
        self.ensure(len, what)?;
        let pos = self.position();
        let out = &self.data()[pos..pos + len];
        self.cur.set_position((pos + len) as u64);
        Ok(out)
    }

    /// Take everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = self.rest_view();
        self.cur.set_position(self.data().len() as u64);
        out
    }

    /// Read a four-character tag.
    pub fn tag(&mut self, what: &str) -> Nsf2WavResult<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.field(4, what, |c| io::Read::read_exact(c, &mut tag))?;
        Ok(tag)
    }

    /// Read one byte.
    pub fn u8(&mut self, what: &str) -> Nsf2WavResult<u8> {
        self.field(1, what, |c| c.read_u8())
    }

    /// Read a little-endian `u16`.
    pub fn u16_le(&mut self, what: &str) -> Nsf2WavResult<u16> {
        self.field(2, what, |c| c.read_u16::<LittleEndian>())
    }

    /// Read a little-endian 24-bit value.
    pub fn u24_le(&mut self, what: &str) -> Nsf2WavResult<u32> {
        self.field(3, what, |c| c.read_u24::<LittleEndian>())
    }

    /// Read a little-endian `u32`.
    pub fn u32_le(&mut self, what: &str) -> Nsf2WavResult<u32> {
        self.field(4, what, |c| c.read_u32::<LittleEndian>())
    }

    /// Read a little-endian `i32`.
    pub fn i32_le(&mut self, what: &str) -> Nsf2WavResult<i32> {
        self.field(4, what, |c| c.read_i32::<LittleEndian>())
    }

    /// Read a little-endian `i16`.
    pub fn i16_le(&mut self, what: &str) -> Nsf2WavResult<i16> {
        self.field(2, what, |c| c.read_i16::<LittleEndian>())
    }

    /// Read a NUL-terminated string; a missing terminator consumes the rest of the data.
    pub fn cstr(&mut self) -> String {
        let rest = self.rest_view();
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let s = String::from_utf8_lossy(&rest[..len]).into_owned();
        let advance = (len + 1).min(rest.len());
        self.cur.set_position((self.position() + advance) as u64);
        s
    }

    fn rest_view(&self) -> &'a [u8] {
        let data = self.data();
        &data[self.position().min(data.len())..]
    }
}

/// Decode a packed array of little-endian `i32` values; a trailing partial value is ignored.
pub fn i32_array_le(body: &[u8]) -> Vec<i32> {
    let count = body.len() / 4;
    let mut out = vec![0i32; count];
    LittleEndian::read_i32_into(&body[..count * 4], &mut out);
    out
}

/// Decode a fixed-width, NUL-padded text field.
pub fn padded_str(field: &[u8]) -> String {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..len]).trim_end().to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/bytes.rs"]
mod tests;
