#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]

//! A small image loader with its own zlib decompressor.
//!
//! Currently PNG is the only supported format, and only the truecolor (RGB)
//! and truecolor with alpha (RGBA) color types, at 8 or 16 bits per channel,
//! non-interlaced. Everything decodes to 8-bit RGBA.
//!
//! ## Layers
//!
//! * [`decompress`]: a zlib / DEFLATE decoder that writes into any `&mut [u8]`
//!   you give it. Always available, never allocates.
//! * [`png`]: the PNG container (signature, chunks, `IHDR`, CRC) plus scanline
//!   reconstruction. Needs the `png` feature.
//! * [`load`] and [`load_with`]: sniff the format and do everything at once.
//!   Needs the `alloc` and `png` features.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade. It never installs a logger, so
//! unless the application sets one up all of the logging compiles down to
//! nothing much.

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

pub mod decompress;
#[cfg(feature = "alloc")]
pub use decompress::inflate;
pub use decompress::inflate_to_slice;

mod descriptor;
pub use descriptor::*;

mod image;
pub use image::*;

mod codec;
pub use codec::*;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod png;

/// Settings for a decode.
///
/// The [`Default`] is what [`load`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
  /// Images wider or taller than this fail with
  /// [`DimensionsTooLarge`](DecodeError::DimensionsTooLarge) before any
  /// buffer is allocated.
  pub max_dimension: u32,
  /// Check each chunk's CRC-32 while walking the chunks.
  pub verify_crc: bool,
  /// Check the zlib stream's Adler-32 checksum.
  pub verify_adler32: bool,
}
impl Default for DecodeOptions {
  #[inline]
  fn default() -> Self {
    // 17k on a side is already over 1GB of RGBA.
    Self { max_dimension: 17_000, verify_crc: true, verify_adler32: false }
  }
}
impl DecodeOptions {
  /// The zlib-level part of the options.
  #[inline]
  #[must_use]
  pub const fn inflate_options(&self) -> decompress::InflateOptions {
    decompress::InflateOptions { verify_adler32: self.verify_adler32 }
  }
}
