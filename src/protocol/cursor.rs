//! Bounds-checked little-endian reader over a datagram.

use super::{Error, MAX_PACKET_SIZE, Malformed, Result};

/// Read position over an immutable byte slice.
///
/// Every read either returns a value and advances, or fails with
/// [`Error::OutOfBounds`] and leaves the offset untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Start reading at the beginning of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(Error::OutOfBounds {
                offset: self.offset,
                requested: len,
                len: self.data.len(),
            })?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    /// Advance without interpreting the bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Read `N` raw bytes.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read an IEEE-754 single.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read an IEEE-754 double.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Read three consecutive singles.
    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        let bytes = self.take(12)?;
        Ok([
            f32_at(bytes, 0),
            f32_at(bytes, 4),
            f32_at(bytes, 8),
        ])
    }

    /// Read four consecutive singles (x, y, z, w).
    pub fn read_quat(&mut self) -> Result<[f32; 4]> {
        let bytes = self.take(16)?;
        Ok([
            f32_at(bytes, 0),
            f32_at(bytes, 4),
            f32_at(bytes, 8),
            f32_at(bytes, 12),
        ])
    }

    /// Read a NUL-terminated string and advance past the terminator.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected. A missing
    /// terminator is an out-of-bounds read.
    pub fn read_cstr(&mut self) -> Result<String> {
        let rest = &self.data[self.offset..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(Error::OutOfBounds {
                offset: self.offset,
                requested: rest.len() + 1,
                len: self.data.len(),
            })?;
        let text = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.offset += nul + 1;
        Ok(text)
    }

    /// Read a 4-byte element count.
    ///
    /// Negative counts, and counts whose elements (each at least
    /// `min_element_size` bytes) could not fit in any datagram, are
    /// malformed. Counts that merely overrun this packet are left for the
    /// element reads to report as out-of-bounds.
    pub fn read_count(&mut self, field: &'static str, min_element_size: usize) -> Result<usize> {
        let start = self.offset;
        let count = self.read_i32()?;
        let rejected = if count < 0 {
            Some(Malformed::NegativeCount { field, count })
        } else if (count as usize).saturating_mul(min_element_size.max(1)) > MAX_PACKET_SIZE {
            Some(Malformed::CountTooLarge { field, count })
        } else {
            None
        };
        if let Some(reason) = rejected {
            self.offset = start;
            return Err(reason.into());
        }
        Ok(count as usize)
    }
}

fn f32_at(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
