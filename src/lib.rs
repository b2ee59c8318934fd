//! `runpack` - ORC RLEv2-compatible integer run-length + bit-packing codec
//!
//! A bit-exact implementation of the RLEv2 integer encoding used for column
//! data in the ORC file format: streams of 64-bit signed or unsigned
//! integers compress into self-describing blocks of up to 512 values, each
//! block picking whichever of four sub-encodings fits its shape.
//!
//! # Features
//! - **Four sub-encodings**: short repeat, direct bit-packing, patched base
//!   (base reduction plus an outlier patch list), and delta
//! - **Adaptive selection**: per-block percentile bit-width statistics pick
//!   the tightest representation
//! - **Streaming**: `O(1)` buffered state, values append one at a time
//! - **Seekable**: skip over values without materializing them, or jump to
//!   any encoder-recorded position
//! - **Wire compatible**: byte streams interoperate with the ORC readers and
//!   writers
//!
//! # Example
//! ```
//! use runpack::{decode, Decoder, Encoder, SliceInput};
//!
//! let mut encoder = Encoder::new(Vec::new(), true);
//! for v in [7, 7, 7, 7, 7, 100, 110, 120, 130] {
//!     encoder.write(v);
//! }
//! encoder.flush().unwrap();
//! let bytes = encoder.into_sink();
//!
//! // one-shot decode
//! let values = decode(&bytes, 9, true).unwrap();
//! assert_eq!(values, [7, 7, 7, 7, 7, 100, 110, 120, 130]);
//!
//! // or stream, skipping what you don't need
//! let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
//! decoder.skip(5).unwrap();
//! let mut tail = [0i64; 4];
//! decoder.next(&mut tail, None).unwrap();
//! assert_eq!(tail, [100, 110, 120, 130]);
//! ```
//!
//! # Encoding Format
//!
//! Every block starts with a header byte whose top two bits select the
//! sub-encoding:
//!
//! - **SHORT_REPEAT** (`00`): 3-10 copies of one value, stored big-endian in
//!   1-8 bytes.
//! - **DIRECT** (`01`): 1-512 values bit-packed at a fixed width drawn from
//!   a 32-entry ladder (zig-zagged first when signed).
//! - **PATCHED_BASE** (`10`): values minus their minimum bit-packed at the
//!   95th-percentile width, outliers repaired from a (gap, patch) list; the
//!   base travels sign-magnitude.
//! - **DELTA** (`11`): a varint base and first delta, then any remaining
//!   deltas bit-packed as magnitudes (the first delta's sign sets the run's
//!   direction; width zero means one fixed delta).

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

mod constants;
mod decoder;
mod encoder;
mod error;
mod io;
mod packing;

#[cfg(test)]
mod tests;

pub use constants::{
    closest_aligned_fixed_bits, closest_fixed_bits, decode_bit_width, encode_bit_width,
    SubEncoding, FIXED_BIT_SIZES, MAX_LITERAL_SIZE, MAX_SHORT_REPEAT_LENGTH, MIN_REPEAT,
};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use io::{InputStream, OutputStream, SliceInput, StreamPosition};
pub use packing::{zigzag_decode, zigzag_encode};

/// Encode a slice of values into a fresh byte buffer.
///
/// # Errors
/// Only a failing sink flush can error, which a `Vec` sink never does.
pub fn encode(values: &[i64], signed: bool) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new(), signed);
    encoder.write_all(values);
    encoder.flush()?;
    Ok(encoder.into_sink())
}

/// Decode exactly `count` values from `bytes`.
///
/// # Errors
/// Fails with [`Error::Parse`] if the stream is malformed or holds fewer
/// than `count` values.
pub fn decode(bytes: &[u8], count: usize, signed: bool) -> Result<Vec<i64>> {
    let mut decoder = Decoder::new(SliceInput::new(bytes), signed);
    let mut values = vec![0i64; count];
    decoder.next(&mut values, None)?;
    Ok(values)
}
