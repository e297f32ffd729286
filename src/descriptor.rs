use crate::{DecodeError, DecodeResult};

/// The color types an image's samples can be stored as.
///
/// The discriminants are the PNG `IHDR` color type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl ColorType {
  /// The number of samples that make up one pixel.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y | Self::Index => 1,
      Self::YA => 2,
      Self::RGB => 3,
      Self::RGBA => 4,
    }
  }
}
impl TryFrom<u8> for ColorType {
  type Error = DecodeError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::Y,
      2 => Self::RGB,
      3 => Self::Index,
      4 => Self::YA,
      6 => Self::RGBA,
      _ => return Err(DecodeError::CorruptData),
    })
  }
}

/// The geometry and sample layout of an image.
///
/// All of the size helpers use checked math, and any overflow is reported as
/// [`DimensionsTooLarge`](DecodeError::DimensionsTooLarge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per sample
  pub bit_depth: u8,
  /// how the samples of a pixel are arranged
  pub color_type: ColorType,
  /// if the image data is stored interlaced.
  pub is_interlaced: bool,
}
impl ImageDescriptor {
  /// Bits for one full pixel.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Bytes for one full pixel, rounded up to at least 1.
  ///
  /// This is the distance back to the "left" byte when reversing scanline
  /// filters.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    let bytes = self.bits_per_pixel() / 8;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Bytes of pixel data in one row, not counting any filter byte.
  #[inline]
  pub fn bytes_per_scanline(&self) -> DecodeResult<usize> {
    let bits = self
      .bits_per_pixel()
      .checked_mul(usize::try_from(self.width)?)
      .ok_or(DecodeError::DimensionsTooLarge)?;
    Ok(bits / 8 + usize::from(bits % 8 != 0))
  }

  /// Total number of pixels.
  #[inline]
  pub fn pixel_count(&self) -> DecodeResult<usize> {
    usize::try_from(self.width)?
      .checked_mul(usize::try_from(self.height)?)
      .ok_or(DecodeError::DimensionsTooLarge)
  }

  /// Bytes of 8-bit RGBA output for the whole image.
  #[inline]
  pub fn rgba_len(&self) -> DecodeResult<usize> {
    self.pixel_count()?.checked_mul(4).ok_or(DecodeError::DimensionsTooLarge)
  }

  /// Fails with [`NotImplemented`](DecodeError::NotImplemented) unless the
  /// image is non-interlaced 8 or 16 bit RGB or RGBA.
  ///
  /// Everything else can be perfectly legal, it's just not decoded by this
  /// crate.
  #[inline]
  pub const fn check_supported(&self) -> DecodeResult<()> {
    match (self.color_type, self.bit_depth, self.is_interlaced) {
      (ColorType::RGB | ColorType::RGBA, 8 | 16, false) => Ok(()),
      _ => Err(DecodeError::NotImplemented),
    }
  }
}

#[test]
fn test_descriptor_sizes() {
  let d = ImageDescriptor {
    width: 3,
    height: 2,
    bit_depth: 8,
    color_type: ColorType::RGB,
    is_interlaced: false,
  };
  assert_eq!(d.bytes_per_pixel(), 3);
  assert_eq!(d.bytes_per_scanline(), Ok(9));
  assert_eq!(d.rgba_len(), Ok(24));
  assert_eq!(d.check_supported(), Ok(()));

  let d16 = ImageDescriptor { bit_depth: 16, color_type: ColorType::RGBA, ..d };
  assert_eq!(d16.bytes_per_pixel(), 8);
  assert_eq!(d16.bytes_per_scanline(), Ok(24));

  // sub-byte pixels round up
  let y1 = ImageDescriptor { width: 9, bit_depth: 1, color_type: ColorType::Y, ..d };
  assert_eq!(y1.bytes_per_pixel(), 1);
  assert_eq!(y1.bytes_per_scanline(), Ok(2));
  assert_eq!(y1.check_supported(), Err(DecodeError::NotImplemented));

  let laced = ImageDescriptor { is_interlaced: true, ..d };
  assert_eq!(laced.check_supported(), Err(DecodeError::NotImplemented));
}
