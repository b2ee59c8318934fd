//! Byte transports consumed by the codec.
//!
//! The encoder appends to an [`OutputStream`] and the decoder pulls bytes
//! from an [`InputStream`]. Both are deliberately tiny: the codec needs
//! byte-granular appends with a running total on one side, and byte reads
//! with absolute re-seek on the other. `Vec<u8>` and [`SliceInput`] are the
//! in-memory implementations; callers with their own buffering layer the
//! traits over it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Buffered byte sink the encoder writes blocks into.
///
/// Appends are infallible (buffering is the implementor's concern); only
/// [`flush`](Self::flush) may surface a transport error.
pub trait OutputStream {
    /// Append one byte.
    fn write_byte(&mut self, byte: u8);

    /// Append a run of bytes.
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// Total number of bytes appended so far.
    fn bytes_written(&self) -> u64;

    /// Flush buffered bytes through, returning the total written.
    fn flush(&mut self) -> Result<u64>;
}

impl OutputStream for Vec<u8> {
    #[inline]
    fn write_byte(&mut self, byte: u8) {
        self.push(byte);
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    #[inline]
    fn bytes_written(&self) -> u64 {
        self.len() as u64
    }

    fn flush(&mut self) -> Result<u64> {
        Ok(self.len() as u64)
    }
}

/// Seekable byte source the decoder reads runs from.
pub trait InputStream {
    /// Read the next byte, failing with [`Error::Parse`] at end of stream.
    fn read_byte(&mut self) -> Result<u8>;

    /// Current byte offset from the start of the stream.
    fn position(&self) -> u64;

    /// Reposition to an absolute byte offset.
    fn seek_to(&mut self, offset: u64) -> Result<()>;
}

/// In-memory [`InputStream`] over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct SliceInput<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceInput<'a> {
    #[inline]
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SliceInput { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl InputStream for SliceInput<'_> {
    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(Error::Parse("unexpected end of stream"))?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn seek_to(&mut self, offset: u64) -> Result<()> {
        if offset > self.data.len() as u64 {
            return Err(Error::OutOfRange {
                offset,
                len: self.data.len() as u64,
            });
        }
        self.pos = offset as usize;
        Ok(())
    }
}

/// A recorded point in the compressed stream: the byte offset of a block
/// boundary and the number of values to skip past inside that block.
///
/// [`Encoder::position`](crate::Encoder::position) produces these and
/// [`Decoder::seek`](crate::Decoder::seek) consumes them, in that order of
/// fields. Serializable so callers can persist seek indexes alongside the
/// encoded bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPosition {
    /// Byte offset of the block boundary in the compressed stream.
    pub byte_offset: u64,
    /// Values to skip within the block that starts at `byte_offset`.
    pub values_to_skip: u64,
}
