#![forbid(unsafe_code)]

//! A zlib / DEFLATE decompressor.
//!
//! * [RFC 1950: ZLIB Compressed Data Format][rfc1950]
//! * [RFC 1951: DEFLATE Compressed Data Format][rfc1951]
//!
//! [rfc1950]: https://www.rfc-editor.org/rfc/rfc1950
//! [rfc1951]: https://www.rfc-editor.org/rfc/rfc1951
//!
//! The whole compressed stream must be a single slice, and the output goes
//! into a single buffer big enough for all of it. There's no streaming and no
//! separate sliding window: back-references are resolved directly against the
//! bytes already written to the output buffer.
//!
//! The pieces are usable on their own if you want to drive the decoding
//! yourself:
//!
//! * [`BitCursor`] reads bits out of the input.
//! * [`CanonicalHuffmanTable`] turns bits into symbols.
//! * [`read_block_header`], [`copy_stored`], and [`read_dynamic_tables`]
//!   handle the per-block structure.
//! * [`next_token`] and [`OutputWindow`] expand literals and back-references.
//!
//! Most people just want [`inflate_to_slice`], or [`inflate`] with the `alloc`
//! feature.

use crate::{DecodeError, DecodeResult};

#[allow(unused_imports)]
use log::{debug, trace, warn};

mod bit_cursor;
pub use bit_cursor::*;

mod huffman;
pub use huffman::*;

mod block;
pub use block::*;

mod lz77;
pub use lz77::*;

/// The info in the two byte zlib header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibHeader {
  /// Compression method, always 8 (deflate) for data we accept.
  pub method: u8,
  /// The window size the compressor used, in bytes.
  pub window_size: u32,
  /// The compression level hint (`0` fastest through `3` maximum).
  pub level: u8,
}

impl ZlibHeader {
  /// Checks and parses the `CMF` and `FLG` bytes.
  ///
  /// ## Failure
  /// * `(CMF * 256 + FLG)` isn't a multiple of 31.
  /// * A preset dictionary is requested (`FLG & 0x20`), which PNG never uses.
  /// * The method isn't deflate, or the window is bigger than 32k.
  pub const fn parse(cmf: u8, flg: u8) -> DecodeResult<Self> {
    if (cmf as u32 * 256 + flg as u32) % 31 != 0 || (flg & 0x20) != 0 {
      return Err(DecodeError::CorruptData);
    }
    let method = cmf & 0x0F;
    let info = cmf >> 4;
    if method != 8 || info > 7 {
      return Err(DecodeError::CorruptData);
    }
    Ok(Self { method, window_size: 1 << (8 + info as u32), level: flg >> 6 })
  }
}

/// Options for the zlib decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InflateOptions {
  /// Check the Adler-32 checksum that follows the final block.
  ///
  /// Off by default. By the time the checksum is read the data has already
  /// been decoded with every structural check passing, so for PNG data it
  /// mostly just costs time.
  pub verify_adler32: bool,
}

/// Decompresses a zlib stream into `out`, giving the number of bytes written.
///
/// ## Failure
/// * [`CorruptData`](DecodeError::CorruptData) for any format violation.
/// * [`OutOfData`](DecodeError::OutOfData) if the input ends early.
/// * [`BufferTooSmall`](DecodeError::BufferTooSmall) if `out` can't hold the
///   whole output. Whatever was decoded before running out of room is left in
///   `out`, but you should treat it as garbage.
#[inline]
pub fn inflate_to_slice(input: &[u8], out: &mut [u8]) -> DecodeResult<usize> {
  inflate_to_slice_with(input, out, InflateOptions::default())
}

/// As [`inflate_to_slice`], with explicit options.
pub fn inflate_to_slice_with(
  input: &[u8], out: &mut [u8], options: InflateOptions,
) -> DecodeResult<usize> {
  let (cmf, flg) = match input {
    [cmf, flg, ..] => (*cmf, *flg),
    _ => return Err(DecodeError::OutOfData),
  };
  let header = ZlibHeader::parse(cmf, flg)?;
  trace!("zlib header: {header:?}");

  let mut cursor = BitCursor::new(&input[2..]);
  let mut window = OutputWindow::new(out);
  inflate_blocks(&mut cursor, &mut window)?;

  cursor.align_to_byte();
  if options.verify_adler32 {
    let declared = cursor.read_u32_be()?;
    if declared != adler32(window.written()) {
      return Err(DecodeError::CorruptData);
    }
  } else if cursor.remaining_bytes() > 4 {
    warn!("{} bytes of trailing data after the zlib stream", cursor.remaining_bytes() - 4);
  }

  debug!("inflated {} bytes into {} bytes", input.len(), window.position());
  Ok(window.position())
}

/// Decodes DEFLATE blocks until the final block is finished.
///
/// This is the raw DEFLATE format, without the zlib header or checksum.
pub fn inflate_blocks(
  cursor: &mut BitCursor<'_>, out: &mut OutputWindow<'_>,
) -> DecodeResult<()> {
  loop {
    let header = read_block_header(cursor)?;
    trace!("block: {header:?} at byte {}", cursor.position());
    match header.kind {
      BlockKind::Stored => copy_stored(cursor, out)?,
      BlockKind::FixedHuffman => {
        expand_block(cursor, out, &FIXED_LIT_LEN_TABLE, &FIXED_DIST_TABLE)?
      }
      BlockKind::DynamicHuffman => {
        let (lit_len, dist) = read_dynamic_tables(cursor)?;
        expand_block(cursor, out, &lit_len, &dist)?
      }
      BlockKind::Reserved => return Err(DecodeError::CorruptData),
    }
    if header.is_final {
      return Ok(());
    }
  }
}

/// Expands tokens until the end of the block.
///
/// Every token either writes at least one byte or ends the block, so the
/// output buffer's size bounds the loop.
fn expand_block(
  cursor: &mut BitCursor<'_>, out: &mut OutputWindow<'_>, lit_len: &CanonicalHuffmanTable,
  dist: &CanonicalHuffmanTable,
) -> DecodeResult<()> {
  loop {
    let token = next_token(cursor, lit_len, dist)?;
    if out.apply(token)? {
      return Ok(());
    }
  }
}

/// Decompresses a zlib stream into a new `Vec`.
///
/// The output will never be allowed to grow past `output_capacity` bytes, if
/// the data needs more than that you get
/// [`BufferTooSmall`](DecodeError::BufferTooSmall).
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn inflate(input: &[u8], output_capacity: usize) -> DecodeResult<alloc::vec::Vec<u8>> {
  inflate_with(input, output_capacity, InflateOptions::default())
}

/// As [`inflate`], with explicit options.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn inflate_with(
  input: &[u8], output_capacity: usize, options: InflateOptions,
) -> DecodeResult<alloc::vec::Vec<u8>> {
  let mut out = alloc::vec::Vec::new();
  out.try_reserve_exact(output_capacity)?;
  out.resize(output_capacity, 0);
  let written = inflate_to_slice_with(input, &mut out, options)?;
  out.truncate(written);
  Ok(out)
}

/// The Adler-32 checksum zlib puts after the compressed data.
#[must_use]
pub fn adler32(bytes: &[u8]) -> u32 {
  const MOD_ADLER: u32 = 65521;
  // 5552 is the most bytes that can be summed before `b` could overflow.
  let (mut a, mut b) = (1_u32, 0_u32);
  for chunk in bytes.chunks(5552) {
    for &byte in chunk {
      a += u32::from(byte);
      b += a;
    }
    a %= MOD_ADLER;
    b %= MOD_ADLER;
  }
  (b << 16) | a
}

#[test]
fn test_zlib_header() {
  assert_eq!(
    ZlibHeader::parse(0x78, 0x9C),
    Ok(ZlibHeader { method: 8, window_size: 32 * 1024, level: 2 })
  );
  // 0x7801 passes the check value test (30721 = 31 * 991), it's the usual
  // header for level 0 data.
  assert_eq!(ZlibHeader::parse(0x78, 0x01).map(|h| h.level), Ok(0));
  assert_eq!(ZlibHeader::parse(0x78, 0x02), Err(DecodeError::CorruptData));
  // 0x78BB is a multiple of 31 but asks for a preset dictionary.
  assert_eq!(ZlibHeader::parse(0x78, 0xBB), Err(DecodeError::CorruptData));
  // method 15 with a valid check value.
  assert_eq!(ZlibHeader::parse(0x7F, 0x07), Err(DecodeError::CorruptData));
  // a 64k window (CINFO 8) with a valid check value.
  assert_eq!((0x88_u32 * 256 + 0x1C) % 31, 0);
  assert_eq!(ZlibHeader::parse(0x88, 0x1C), Err(DecodeError::CorruptData));
  assert_eq!(ZlibHeader::parse(0x78, 0xDA).map(|h| h.window_size), Ok(32 * 1024));
}

#[test]
fn test_inflate_fixed_block() {
  // zlib's compression of `a`
  let input = [0x78, 0x9C, 0x4B, 0x04, 0x00, 0x00, 0x62, 0x00, 0x62];
  let mut out = [0_u8; 4];
  assert_eq!(inflate_to_slice(&input, &mut out), Ok(1));
  assert_eq!(out[0], b'a');
  let strict = InflateOptions { verify_adler32: true };
  assert_eq!(inflate_to_slice_with(&input, &mut out, strict), Ok(1));
  let mut bad_sum = input;
  bad_sum[8] ^= 1;
  assert_eq!(inflate_to_slice_with(&bad_sum, &mut out, strict), Err(DecodeError::CorruptData));
  assert_eq!(inflate_to_slice_with(&input[..7], &mut out, strict), Err(DecodeError::OutOfData));
}

#[test]
fn test_inflate_stored_block() {
  let input = [0x78, 0x01, 0b001, 0x05, 0x00, 0xFA, 0xFF, b'H', b'E', b'L', b'L', b'O'];
  let mut out = [0_u8; 5];
  assert_eq!(inflate_to_slice(&input, &mut out), Ok(5));
  assert_eq!(&out, b"HELLO");
  let mut small = [0_u8; 4];
  assert_eq!(inflate_to_slice(&input, &mut small), Err(DecodeError::BufferTooSmall));
  let mut mismatched = input;
  mismatched[5] = 0xF9;
  assert_eq!(inflate_to_slice(&mismatched, &mut out), Err(DecodeError::CorruptData));
}

#[test]
fn test_inflate_rejects_reserved_block_and_bad_header() {
  let mut out = [0_u8; 8];
  assert_eq!(inflate_to_slice(&[0x78, 0x9C, 0b111], &mut out), Err(DecodeError::CorruptData));
  assert_eq!(inflate_to_slice(&[0x78, 0x02, 0b001], &mut out), Err(DecodeError::CorruptData));
  assert_eq!(inflate_to_slice(&[0x78], &mut out), Err(DecodeError::OutOfData));
  // not final, and then the data stops.
  assert_eq!(inflate_to_slice(&[0x78, 0x9C, 0x02, 0x00], &mut out), Err(DecodeError::OutOfData));
}

#[test]
fn test_adler32() {
  assert_eq!(adler32(b""), 1);
  assert_eq!(adler32(b"a"), 0x0062_0062);
  assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
}
