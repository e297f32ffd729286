#![forbid(unsafe_code)]

//! Module for working with PNG data.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! ## What Gets Decoded
//!
//! Any legal PNG header is accepted by [`parse_header`], but only
//! non-interlaced RGB and RGBA images with 8 or 16 bits per channel are
//! decoded. Everything else is reported as
//! [`NotImplemented`](DecodeError::NotImplemented), before any image data is
//! touched.
//!
//! ## Automatic Decoding
//!
//! Call [`load`](crate::load), or use [`Png`] through the [`ImageCodec`]
//! trait. This requires the `alloc` feature.
//!
//! ## Manual Decoding
//!
//! Without `alloc` you supply every buffer:
//!
//! 1) Call [`parse_header`] to get the [`ImageDescriptor`].
//! 2) Call [`gather_idat`] to copy all `IDAT` chunk data into one contiguous
//!    buffer. The total is never more than the length of the PNG itself. If
//!    there's only one `IDAT` chunk you can use [`walk_chunks`] to just grab
//!    that slice instead.
//! 3) Get a buffer of at least
//!    [`required_buffer_len`](ImageDescriptor::required_buffer_len) bytes.
//! 4) Call [`decode_idat_to_slice`]. The RGBA pixels end up at the start of
//!    the buffer.
//!
//! ## Chunk Handling
//!
//! * The first chunk must be `IHDR`.
//! * `IDAT` chunks are joined together in the order they appear.
//! * `PLTE` is allowed (a truecolor image may suggest a palette) but unused.
//! * Any other critical chunk is an error, since we can't know what it means.
//! * Ancillary chunks are skipped.
//! * `IEND` stops the walk. If it's missing that's logged but not an error.

use core::fmt::{Debug, Write};

use crate::{
  decompress::inflate_to_slice_with, ColorType, DecodeError, DecodeOptions, DecodeResult,
  ImageCodec, ImageDescriptor,
};

#[cfg(feature = "alloc")]
use crate::RgbaImage;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[allow(unused_imports)]
use log::{debug, trace, warn};

mod crc32;
pub use crc32::*;

mod chunk;
pub use chunk::*;

mod header;

mod unfilter;
pub use unfilter::*;

#[cfg(all(test, feature = "alloc"))]
mod tests;

/// The 8 bytes every PNG starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG's initial 8 bytes are correct.
#[inline]
#[must_use]
pub const fn is_png_signature(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

#[inline]
fn check_crc(chunk: &RawChunk<'_>, options: &DecodeOptions) -> DecodeResult<()> {
  if options.verify_crc && !chunk.crc_matches() {
    Err(DecodeError::CorruptData)
  } else {
    Ok(())
  }
}

/// Reads the image header.
///
/// ## Failure
/// Checked in this order:
/// * [`UnknownFormat`](DecodeError::UnknownFormat) without the PNG signature.
/// * [`OutOfData`](DecodeError::OutOfData) if there's no complete first chunk.
/// * [`CorruptData`](DecodeError::CorruptData) if the first chunk isn't a
///   legal `IHDR` (including a bad CRC, when checking those).
/// * [`DimensionsTooLarge`](DecodeError::DimensionsTooLarge) past
///   `options.max_dimension`.
/// * [`NotImplemented`](DecodeError::NotImplemented) for images this crate
///   doesn't decode.
pub fn parse_header(bytes: &[u8], options: &DecodeOptions) -> DecodeResult<ImageDescriptor> {
  if !is_png_signature(bytes) {
    return Err(DecodeError::UnknownFormat);
  }
  let ihdr = RawChunkIter::new(bytes).next().ok_or(DecodeError::OutOfData)?;
  if ihdr.chunk_type() != ChunkType::IHDR {
    return Err(DecodeError::CorruptData);
  }
  check_crc(&ihdr, options)?;
  let descriptor = ImageDescriptor::from_ihdr(ihdr.data())?;
  trace!("IHDR: {descriptor:?}");
  if descriptor.width > options.max_dimension || descriptor.height > options.max_dimension {
    return Err(DecodeError::DimensionsTooLarge);
  }
  descriptor.check_supported()?;
  Ok(descriptor)
}

/// Walks the chunks after `IHDR`, passing each `IDAT` payload to `on_idat` in
/// order.
///
/// ## Failure
/// * [`CorruptData`](DecodeError::CorruptData) for an unknown critical chunk,
///   or a critical chunk with a bad CRC (when checking those).
/// * Any error from `on_idat`.
pub fn walk_chunks<'b, F>(
  bytes: &'b [u8], options: &DecodeOptions, mut on_idat: F,
) -> DecodeResult<()>
where
  F: FnMut(&'b [u8]) -> DecodeResult<()>,
{
  if !is_png_signature(bytes) {
    return Err(DecodeError::UnknownFormat);
  }
  let mut chunks = RawChunkIter::new(bytes);
  match chunks.next() {
    Some(ihdr) if ihdr.chunk_type() == ChunkType::IHDR => check_crc(&ihdr, options)?,
    Some(_) => return Err(DecodeError::CorruptData),
    None => return Err(DecodeError::OutOfData),
  }
  for chunk in chunks {
    trace!("chunk: {chunk:?}");
    if options.verify_crc && !chunk.crc_matches() {
      if chunk.is_critical() {
        return Err(DecodeError::CorruptData);
      }
      warn!("skipping {:?} chunk with a bad CRC", chunk.chunk_type());
      continue;
    }
    match chunk.chunk_type() {
      ChunkType::IDAT => on_idat(chunk.data())?,
      ChunkType::IEND => return Ok(()),
      ChunkType::PLTE => (),
      _ if chunk.is_critical() => return Err(DecodeError::CorruptData),
      _ => (),
    }
  }
  warn!("PNG data ended without an IEND chunk");
  Ok(())
}

/// Copies all `IDAT` data into `out`, giving the number of bytes copied.
///
/// ## Failure
/// As [`walk_chunks`], and [`BufferTooSmall`](DecodeError::BufferTooSmall) if
/// the data doesn't fit.
pub fn gather_idat(
  bytes: &[u8], options: &DecodeOptions, out: &mut [u8],
) -> DecodeResult<usize> {
  let mut used = 0_usize;
  walk_chunks(bytes, options, |data| {
    let end = used + data.len();
    out.get_mut(used..end).ok_or(DecodeError::BufferTooSmall)?.copy_from_slice(data);
    used = end;
    Ok(())
  })?;
  Ok(used)
}

/// Joins all `IDAT` data into a new `Vec`.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn collect_idat(bytes: &[u8], options: &DecodeOptions) -> DecodeResult<Vec<u8>> {
  let mut idat = Vec::new();
  walk_chunks(bytes, options, |data| {
    idat.try_reserve(data.len())?;
    idat.extend_from_slice(data);
    Ok(())
  })?;
  Ok(idat)
}

/// Inflates the joined `IDAT` data and reconstructs the pixels, all within
/// `out`. Gives the length of the RGBA data at the start of `out`.
///
/// ## Failure
/// * [`BufferTooSmall`](DecodeError::BufferTooSmall) if `out` is shorter than
///   [`required_buffer_len`](ImageDescriptor::required_buffer_len), or the
///   zlib data decompresses to more than fits in `out`.
/// * [`OutOfData`](DecodeError::OutOfData) if the zlib data decompresses to
///   less than [`filtered_len`](ImageDescriptor::filtered_len).
/// * Anything from [`inflate_to_slice_with`] or [`reconstruct_in_place`].
pub fn decode_idat_to_slice(
  idat: &[u8], descriptor: &ImageDescriptor, options: &DecodeOptions, out: &mut [u8],
) -> DecodeResult<usize> {
  descriptor.check_supported()?;
  let required = descriptor.required_buffer_len()?;
  let out = out.get_mut(..required).ok_or(DecodeError::BufferTooSmall)?;
  let written = inflate_to_slice_with(idat, out, options.inflate_options())?;
  let expected = descriptor.filtered_len()?;
  if written < expected {
    return Err(DecodeError::OutOfData);
  }
  if written > expected {
    warn!("zlib data has {} more bytes than the image uses", written - expected);
  }
  reconstruct_in_place(out, descriptor)
}

/// The PNG [`ImageCodec`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Png;
impl ImageCodec for Png {
  #[inline]
  fn detect(&self, bytes: &[u8]) -> bool {
    is_png_signature(bytes)
  }

  #[inline]
  fn parse_header(&self, bytes: &[u8], options: &DecodeOptions) -> DecodeResult<ImageDescriptor> {
    parse_header(bytes, options)
  }

  #[cfg(feature = "alloc")]
  fn decode_body(
    &self, bytes: &[u8], descriptor: &ImageDescriptor, options: &DecodeOptions,
  ) -> DecodeResult<RgbaImage> {
    descriptor.check_supported()?;
    let idat = collect_idat(bytes, options)?;
    let required = descriptor.required_buffer_len()?;
    let mut pixels: Vec<u8> = Vec::new();
    pixels.try_reserve_exact(required)?;
    pixels.resize(required, 0);
    let rgba_len = decode_idat_to_slice(&idat, descriptor, options, &mut pixels)?;
    pixels.truncate(rgba_len);
    Ok(RgbaImage { width: descriptor.width, height: descriptor.height, pixels })
  }
}
