use core::{fmt, num::TryFromIntError};

/// An error from the `starlight` crate.
///
/// The first error aborts the whole decode. There are no partial results: the
/// input is a single deterministic byte stream, so retrying can't help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeError {
  /// The data violates the zlib, DEFLATE, or PNG format.
  ///
  /// This covers bad zlib headers, reserved block types, Huffman codes that
  /// don't resolve, out of range length or distance symbols, stored block
  /// length mismatches, bad filter types, and illegal PNG headers.
  CorruptData,

  /// The input ended before the decoder was done reading it.
  OutOfData,

  /// The output buffer can't hold everything the decoder wants to write.
  BufferTooSmall,

  /// The data is legal, but uses a feature this crate doesn't decode.
  ///
  /// Currently: interlaced images, and any color type other than RGB or RGBA.
  NotImplemented,

  /// None of the supported image formats recognized the bytes.
  UnknownFormat,

  /// The image dimensions exceed the configured limit, or computing a buffer
  /// size for them overflowed.
  DimensionsTooLarge,

  /// The allocator couldn't give us enough space.
  #[cfg(feature = "alloc")]
  Alloc,
}

/// Shorthand for results from this crate.
pub type DecodeResult<T> = Result<T, DecodeError>;

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::CorruptData => "data is corrupted",
      Self::OutOfData => "unexpected end of input",
      Self::BufferTooSmall => "output buffer is too small",
      Self::NotImplemented => "image feature is not supported",
      Self::UnknownFormat => "unknown image format",
      Self::DimensionsTooLarge => "image dimensions are too large",
      #[cfg(feature = "alloc")]
      Self::Alloc => "allocation failed",
    })
  }
}

#[cfg(feature = "alloc")]
impl From<alloc::collections::TryReserveError> for DecodeError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
impl From<TryFromIntError> for DecodeError {
  #[inline]
  fn from(_: TryFromIntError) -> Self {
    Self::DimensionsTooLarge
  }
}

#[test]
fn test_error_display() {
  use core::fmt::Write;
  struct Buf([u8; 64], usize);
  impl Write for Buf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
      let end = self.1 + s.len();
      self.0.get_mut(self.1..end).ok_or(fmt::Error)?.copy_from_slice(s.as_bytes());
      self.1 = end;
      Ok(())
    }
  }
  let mut buf = Buf([0; 64], 0);
  write!(buf, "{}", DecodeError::CorruptData).unwrap();
  assert_eq!(&buf.0[..buf.1], b"data is corrupted");
}
