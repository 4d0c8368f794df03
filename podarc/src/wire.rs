//! Little-endian primitive encode/decode helpers for index and subindex
//! block payloads, which are always fully decompressed into memory before
//! parsing.

use crate::errors::FormatError;

/// Cursor over a decompressed block payload.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Block label used in truncation errors ("index", "subindex", …).
    label: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8], label: &'static str) -> Self {
        Self { buf, pos: 0, label }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(FormatError::Truncated(self.label))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn u64(&mut self) -> Result<u64, FormatError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Consume a `u64` length prefix followed by that many bytes.
    pub fn bytes(&mut self) -> Result<&'a [u8], FormatError> {
        let len = self.u64()?;
        if len > self.buf.len() as u64 {
            return Err(FormatError::Truncated(self.label));
        }
        self.take(len as usize)
    }
}

pub(crate) fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub(crate) fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Emit a `u64` length prefix followed by the bytes themselves.
pub(crate) fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    put_u64(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_primitives() {
        let mut buf = Vec::new();
        put_u8(&mut buf, 0xab);
        put_u16(&mut buf, 0xbeef);
        put_u32(&mut buf, 0xdead_beef);
        put_u64(&mut buf, u64::MAX - 1);
        put_bytes(&mut buf, b"hello");

        let mut r = ByteReader::new(&buf, "test");
        assert_eq!(r.u8().unwrap(), 0xab);
        assert_eq!(r.u16().unwrap(), 0xbeef);
        assert_eq!(r.u32().unwrap(), 0xdead_beef);
        assert_eq!(r.u64().unwrap(), u64::MAX - 1);
        assert_eq!(r.bytes().unwrap(), b"hello");
        assert!(r.is_empty());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let mut r = ByteReader::new(&[1, 2, 3], "test");
        assert!(r.u64().is_err());
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        put_u64(&mut buf, u64::MAX);
        let mut r = ByteReader::new(&buf, "test");
        assert!(r.bytes().is_err());
    }
}
