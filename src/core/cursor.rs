//! Little-endian field codec over in-memory byte buffers.
//!
//! [`ByteReader`] borrows the input and tracks an absolute offset so errors
//! can point at the exact byte in the original file, even when reading a
//! sub-range such as a single chunk's content.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::util::{Error, Result};

/// Bounds-checked cursor over a byte slice.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader at the start of `data`, which begins at file offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Create a reader whose first byte sits at absolute offset `base`.
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Position relative to the start of this reader.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Absolute offset of the next byte to be read.
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check if every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread bytes without consuming them.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(Error::TruncatedInput {
                offset: self.offset(),
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Consume `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consume a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a u32 value (little-endian).
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Read an i32 value (little-endian).
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    /// Read an f32 value (little-endian IEEE 754).
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    /// Split off the next `len` bytes as an independent reader.
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(ByteReader::with_base(data, base))
    }
}

/// Growable little-endian writer.
#[derive(Clone, Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Written bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return its buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) {
        // Writing into a Vec cannot fail.
        let _ = self.buf.write_u32::<LittleEndian>(value);
    }

    /// Write an i32 value (little-endian).
    pub fn write_i32(&mut self, value: i32) {
        let _ = self.buf.write_i32::<LittleEndian>(value);
    }

    /// Write an f32 value (little-endian IEEE 754).
    pub fn write_f32(&mut self, value: f32) {
        let _ = self.buf.write_f32::<LittleEndian>(value);
    }

    /// Write a collection length as a u32 prefix.
    pub fn write_len(&mut self, len: usize) {
        self.write_u32(len as u32);
    }
}
