//! Little-endian field codec for blob payloads
//!
//! ```text
//! u8 / u16 / u32 / u64      fixed width, little endian
//! bytes / string            u32 length prefix + raw bytes
//! count                     u32 number of following items
//! ```
//!
//! Readers are bound to a blob name so every decoding failure is reported as
//! `CorruptData` against that blob.

use crate::errors::{IndexError, IndexResult};

/// Append-only writer for one blob.
#[derive(Debug, Default)]
pub struct BlobWriter {
    buf: Vec<u8>,
}

impl BlobWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write an item count as u32
    pub fn put_count(&mut self, n: usize) -> IndexResult<()> {
        let n = u32::try_from(n)
            .map_err(|_| IndexError::BuildFailed(format!("{n} items exceed the u32 count limit")))?;
        self.put_u32(n);
        Ok(())
    }

    /// Write length-prefixed bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) -> IndexResult<()> {
        self.put_count(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string
    pub fn put_str(&mut self, s: &str) -> IndexResult<()> {
        self.put_bytes(s.as_bytes())
    }

    /// Write raw bytes without a prefix
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked reader over one blob.
#[derive(Debug)]
pub struct BlobReader<'a> {
    blob: &'a str,
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    pub fn new(blob: &'a str, data: &'a [u8]) -> Self {
        Self { blob, data, pos: 0 }
    }

    /// Build a corruption error against this blob
    pub fn corrupt(&self, reason: impl Into<String>) -> IndexError {
        IndexError::corrupt(self.blob, reason)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> IndexResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(self.corrupt(format!(
                "truncated: need {} bytes at offset {}, {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let data = self.data;
        let slice = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> IndexResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> IndexResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> IndexResult<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> IndexResult<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> IndexResult<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Read an item count, rejecting counts that cannot fit in the
    /// remaining bytes given the smallest encoded item size.
    pub fn read_count(&mut self, min_item_size: usize) -> IndexResult<usize> {
        let n = self.read_u32()? as usize;
        if n.saturating_mul(min_item_size) > self.remaining() {
            return Err(self.corrupt(format!(
                "count {} at offset {} exceeds remaining {} bytes",
                n,
                self.pos - 4,
                self.remaining()
            )));
        }
        Ok(n)
    }

    /// Read length-prefixed bytes
    pub fn read_bytes(&mut self) -> IndexResult<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    /// Read exactly `n` raw bytes
    pub fn read_raw(&mut self, n: usize) -> IndexResult<&'a [u8]> {
        self.take(n)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> IndexResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| self.corrupt(format!("invalid UTF-8: {e}")))
    }

    /// Require that the whole blob was consumed
    pub fn finish(self) -> IndexResult<()> {
        if self.remaining() != 0 {
            return Err(self.corrupt(format!("{} trailing bytes", self.remaining())));
        }
        Ok(())
    }
}
