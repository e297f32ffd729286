#![forbid(unsafe_code)]

//! The decoded output types.

use bytemuck::{Pod, Zeroable};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// An 8-bit per channel RGBA pixel, in that byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Pod, Zeroable)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8888 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
impl From<[u8; 4]> for RGBA8888 {
  #[inline]
  fn from([r, g, b, a]: [u8; 4]) -> Self {
    Self { r, g, b, a }
  }
}
impl From<RGBA8888> for [u8; 4] {
  #[inline]
  fn from(RGBA8888 { r, g, b, a }: RGBA8888) -> Self {
    [r, g, b, a]
  }
}

/// A decoded image, always 8-bit RGBA.
///
/// The `pixels` are row-major, top to bottom, 4 bytes per pixel, with no
/// padding between rows.
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct RgbaImage {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<u8>,
}
#[cfg(feature = "alloc")]
impl RgbaImage {
  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x < self.width && y < self.height {
      let i = (y as usize * self.width as usize + x as usize) * 4;
      let bytes = self.pixels.get(i..i + 4)?;
      Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    } else {
      None
    }
  }

  /// Views the bytes as typed pixels.
  #[inline]
  #[must_use]
  pub fn as_rgba8888(&self) -> &[RGBA8888] {
    bytemuck::cast_slice(&self.pixels)
  }
}

#[test]
#[cfg(feature = "alloc")]
fn test_rgba_image_access() {
  let image = RgbaImage {
    width: 2,
    height: 1,
    pixels: alloc::vec![1, 2, 3, 4, 5, 6, 7, 8],
  };
  assert_eq!(image.pixel(1, 0), Some([5, 6, 7, 8]));
  assert_eq!(image.pixel(2, 0), None);
  assert_eq!(image.pixel(0, 1), None);
  assert_eq!(image.as_rgba8888()[0], RGBA8888 { r: 1, g: 2, b: 3, a: 4 });
  assert_eq!(<[u8; 4]>::from(image.as_rgba8888()[1]), [5, 6, 7, 8]);
}
