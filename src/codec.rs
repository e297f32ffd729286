use crate::{DecodeOptions, DecodeResult, ImageDescriptor};

#[cfg(feature = "alloc")]
use crate::{DecodeError, RgbaImage};

#[allow(unused_imports)]
use log::{debug, trace};

/// The steps every supported image format provides.
///
/// Decoding is always: [`detect`](Self::detect) the format, then
/// [`parse_header`](Self::parse_header), then
/// [`decode_body`](Self::decode_body) with that header.
pub trait ImageCodec {
  /// If the bytes look like this format.
  ///
  /// This only checks the leading magic bytes, it doesn't validate anything.
  fn detect(&self, bytes: &[u8]) -> bool;

  /// Reads and validates the image header.
  ///
  /// This should be cheap, and should catch every unsupported or oversized
  /// image before the caller allocates anything.
  fn parse_header(&self, bytes: &[u8], options: &DecodeOptions) -> DecodeResult<ImageDescriptor>;

  /// Decodes the full image, using a header from
  /// [`parse_header`](Self::parse_header).
  #[cfg(feature = "alloc")]
  #[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
  fn decode_body(
    &self, bytes: &[u8], descriptor: &ImageDescriptor, options: &DecodeOptions,
  ) -> DecodeResult<RgbaImage>;
}

/// The image formats this build of the crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ImageFormat {
  /// Portable Network Graphics
  #[cfg(feature = "png")]
  Png,
}
impl ImageFormat {
  /// The first format that claims the bytes.
  #[inline]
  #[must_use]
  #[allow(unused_variables)]
  pub fn detect(bytes: &[u8]) -> Option<Self> {
    #[cfg(feature = "png")]
    if crate::png::Png.detect(bytes) {
      return Some(Self::Png);
    }
    None
  }

  /// The codec for this format.
  #[inline]
  #[must_use]
  pub fn codec(self) -> &'static dyn ImageCodec {
    match self {
      #[cfg(feature = "png")]
      Self::Png => &crate::png::Png,
    }
  }

  /// Forwards to the format's [`ImageCodec::parse_header`].
  #[inline]
  pub fn parse_header(
    self, bytes: &[u8], options: &DecodeOptions,
  ) -> DecodeResult<ImageDescriptor> {
    self.codec().parse_header(bytes, options)
  }

  /// Forwards to the format's [`ImageCodec::decode_body`].
  #[cfg(feature = "alloc")]
  #[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
  #[inline]
  pub fn decode_body(
    self, bytes: &[u8], descriptor: &ImageDescriptor, options: &DecodeOptions,
  ) -> DecodeResult<RgbaImage> {
    self.codec().decode_body(bytes, descriptor, options)
  }
}

/// Decodes an image of any supported format with the default options.
///
/// ## Failure
/// * [`UnknownFormat`](DecodeError::UnknownFormat) if no format claims the
///   bytes.
/// * Anything the format's decoder reports.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
#[inline]
pub fn load(bytes: &[u8]) -> DecodeResult<RgbaImage> {
  load_with(bytes, &DecodeOptions::default())
}

/// As [`load`], with explicit options.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn load_with(bytes: &[u8], options: &DecodeOptions) -> DecodeResult<RgbaImage> {
  let format = ImageFormat::detect(bytes).ok_or(DecodeError::UnknownFormat)?;
  let descriptor = format.parse_header(bytes, options)?;
  debug!("loading {format:?} image: {descriptor:?}");
  format.decode_body(bytes, &descriptor, options)
}

#[test]
#[cfg(feature = "alloc")]
fn test_load_unknown_format() {
  assert_eq!(load(b""), Err(DecodeError::UnknownFormat));
  assert_eq!(load(b"GIF89a\0\0\0\0"), Err(DecodeError::UnknownFormat));
}
