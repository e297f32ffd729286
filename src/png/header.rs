use super::*;

impl ImageDescriptor {
  /// Parses the 13 bytes of `IHDR` chunk data.
  ///
  /// This accepts every legal PNG header, even the ones that this crate can't
  /// decode (see [`check_supported`](Self::check_supported)).
  ///
  /// ## Failure
  /// [`CorruptData`](DecodeError::CorruptData) if the data isn't exactly 13
  /// bytes, either dimension is 0, the bit depth isn't allowed for the color
  /// type, or any of the method bytes has an undefined value.
  pub fn from_ihdr(data: &[u8]) -> DecodeResult<Self> {
    match *data {
      [
        w0,
        w1,
        w2,
        w3,
        h0,
        h1,
        h2,
        h3,
        bit_depth,
        color_type,
        compression_method,
        filter_method,
        interlace_method,
      ] => {
        let width = u32::from_be_bytes([w0, w1, w2, w3]);
        let height = u32::from_be_bytes([h0, h1, h2, h3]);
        if width == 0 || height == 0 {
          return Err(DecodeError::CorruptData);
        }
        let color_type = ColorType::try_from(color_type)?;
        let depth_ok = match color_type {
          ColorType::Y => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
          ColorType::Index => matches!(bit_depth, 1 | 2 | 4 | 8),
          ColorType::RGB | ColorType::YA | ColorType::RGBA => matches!(bit_depth, 8 | 16),
        };
        if !depth_ok || compression_method != 0 || filter_method != 0 {
          return Err(DecodeError::CorruptData);
        }
        let is_interlaced = match interlace_method {
          0 => false,
          1 => true,
          _ => return Err(DecodeError::CorruptData),
        };
        Ok(Self { width, height, bit_depth, color_type, is_interlaced })
      }
      _ => Err(DecodeError::CorruptData),
    }
  }

  /// Bytes of filtered data the zlib stream has to produce: every row is one
  /// filter type byte and then the row's pixel data.
  #[inline]
  pub fn filtered_len(&self) -> DecodeResult<usize> {
    let per_row = self.bytes_per_scanline()?.checked_add(1).ok_or(DecodeError::DimensionsTooLarge)?;
    per_row.checked_mul(usize::try_from(self.height)?).ok_or(DecodeError::DimensionsTooLarge)
  }

  /// The smallest buffer that can hold both the filtered data and the final
  /// RGBA output, as [`reconstruct_in_place`] needs.
  #[inline]
  pub fn required_buffer_len(&self) -> DecodeResult<usize> {
    Ok(self.filtered_len()?.max(self.rgba_len()?))
  }
}

#[test]
fn test_from_ihdr() {
  let mut ihdr = [0, 0, 0, 2, 0, 0, 0, 3, 8, 6, 0, 0, 0];
  assert_eq!(
    ImageDescriptor::from_ihdr(&ihdr),
    Ok(ImageDescriptor {
      width: 2,
      height: 3,
      bit_depth: 8,
      color_type: ColorType::RGBA,
      is_interlaced: false
    })
  );
  let d = ImageDescriptor::from_ihdr(&ihdr).unwrap();
  assert_eq!(d.filtered_len(), Ok(27));
  assert_eq!(d.required_buffer_len(), Ok(27));

  // palette images can be 1 bit, legal but not supported.
  ihdr[8] = 1;
  ihdr[9] = 3;
  let d = ImageDescriptor::from_ihdr(&ihdr).unwrap();
  assert_eq!(d.check_supported(), Err(DecodeError::NotImplemented));
  // RGBA can't be.
  ihdr[9] = 6;
  assert_eq!(ImageDescriptor::from_ihdr(&ihdr), Err(DecodeError::CorruptData));
  ihdr[8] = 8;
  // interlace method 2 doesn't exist.
  ihdr[12] = 2;
  assert_eq!(ImageDescriptor::from_ihdr(&ihdr), Err(DecodeError::CorruptData));
  ihdr[12] = 1;
  assert!(ImageDescriptor::from_ihdr(&ihdr).unwrap().is_interlaced);
  // color type 1 doesn't exist.
  ihdr[9] = 1;
  assert_eq!(ImageDescriptor::from_ihdr(&ihdr), Err(DecodeError::CorruptData));
  ihdr[9] = 6;
  // zero width
  ihdr[3] = 0;
  assert_eq!(ImageDescriptor::from_ihdr(&ihdr), Err(DecodeError::CorruptData));
  assert_eq!(ImageDescriptor::from_ihdr(&ihdr[..12]), Err(DecodeError::CorruptData));
}

#[test]
fn test_rgb8_buffer_needs_room_to_widen() {
  // 1 filter byte + 3*w < 4*w once w > 1
  let d = ImageDescriptor {
    width: 4,
    height: 2,
    bit_depth: 8,
    color_type: ColorType::RGB,
    is_interlaced: false,
  };
  assert_eq!(d.filtered_len(), Ok(26));
  assert_eq!(d.rgba_len(), Ok(32));
  assert_eq!(d.required_buffer_len(), Ok(32));
}
