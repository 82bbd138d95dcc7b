//! Bounds-checked cursor primitives over byte slices.
//!
//! All multi-byte accessors are big-endian, matching the Modbus wire format.

use crate::{DecodeError, EncodeError};

/// A zero-copy reader that advances through a byte slice.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = self
            .buf
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof);
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..start + len])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

/// A byte writer that encodes into a caller-owned buffer.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn as_written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        if self.remaining() < 1 {
            return Err(EncodeError::BufferTooSmall);
        }
        self.buf[self.pos] = value;
        self.pos += 1;
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        if self.remaining() < data.len() {
            return Err(EncodeError::BufferTooSmall);
        }
        let end = self.pos + data.len();
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteReader, ByteWriter};
    use crate::{DecodeError, EncodeError};

    #[test]
    fn reader_reads_values() {
        let mut r = ByteReader::new(&[0x01, 0x12, 0x34, 0x56]);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.read_slice(2).unwrap_err(), DecodeError::UnexpectedEof);
        assert_eq!(r.read_u8().unwrap(), 0x56);
        assert!(r.is_empty());
    }

    #[test]
    fn writer_writes_and_bounds() {
        let mut buf = [0u8; 3];
        let mut w = ByteWriter::new(&mut buf);
        w.write_u8(0x12).unwrap();
        w.write_u16(0x3456).unwrap();
        assert_eq!(w.as_written(), &[0x12, 0x34, 0x56]);
        assert_eq!(w.write_u8(0).unwrap_err(), EncodeError::BufferTooSmall);
    }
}
