use super::*;

/// The per-row filters a PNG encoder can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterType {
  /// `raw = filtered`
  None = 0,
  /// `raw = filtered + left`
  Sub = 1,
  /// `raw = filtered + up`
  Up = 2,
  /// `raw = filtered + (left + up) / 2`
  Average = 3,
  /// `raw = filtered + paeth(left, up, upper_left)`
  Paeth = 4,
}
impl TryFrom<u8> for FilterType {
  type Error = DecodeError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(DecodeError::CorruptData),
    })
  }
}

/// The Paeth predictor from the PNG specification.
#[inline]
#[must_use]
pub const fn paeth_predict(left: u8, up: u8, upper_left: u8) -> u8 {
  let a = left as i16;
  let b = up as i16;
  let c = upper_left as i16;
  let p = a + b - c;
  let pa = (p - a).abs();
  let pb = (p - b).abs();
  let pc = (p - c).abs();
  // ties go to left, then up, and the order of these tests must not change.
  if pa <= pb && pa <= pc {
    left
  } else if pb <= pc {
    up
  } else {
    upper_left
  }
}

/// Reverses one filter on one row.
///
/// * `bpp` is the distance back to the "left" byte.
/// * `prev` is the already reconstructed previous row, or `None` for the first
///   row (which makes every "up" byte 0).
pub fn unfilter_row(filter: FilterType, bpp: usize, prev: Option<&[u8]>, row: &mut [u8]) {
  debug_assert!(prev.map_or(true, |p| p.len() == row.len()));
  match (filter, prev) {
    (FilterType::None, _) | (FilterType::Up, None) => (),
    // with no row above, paeth always picks `left`.
    (FilterType::Sub, _) | (FilterType::Paeth, None) => {
      for i in bpp..row.len() {
        row[i] = row[i].wrapping_add(row[i - bpp]);
      }
    }
    (FilterType::Up, Some(prev)) => {
      row.iter_mut().zip(prev).for_each(|(x, b)| *x = x.wrapping_add(*b));
    }
    (FilterType::Average, None) => {
      for i in bpp..row.len() {
        row[i] = row[i].wrapping_add(row[i - bpp] / 2);
      }
    }
    (FilterType::Average, Some(prev)) => {
      for i in 0..row.len() {
        let a = if i >= bpp { row[i - bpp] } else { 0 };
        // the sum needs 9 bits.
        let avg = ((u16::from(a) + u16::from(prev[i])) / 2) as u8;
        row[i] = row[i].wrapping_add(avg);
      }
    }
    (FilterType::Paeth, Some(prev)) => {
      for i in 0..row.len() {
        let (a, c) = if i >= bpp { (row[i - bpp], prev[i - bpp]) } else { (0, 0) };
        row[i] = row[i].wrapping_add(paeth_predict(a, prev[i], c));
      }
    }
  }
}

/// Unfilters scanlines in place, packing the rows together as it goes.
///
/// The buffer starts out holding filtered rows (`1 + stride` bytes each). Each
/// row is unfiltered where it sits and then moved down to `y * stride`,
/// dropping its filter byte. The write index trails the read index by one
/// byte per finished row, so it never passes it, and the previous row (which
/// the filters read from) is always already in its final place below the row
/// being worked on.
pub struct ScanlineReconstructor<'b> {
  buf: &'b mut [u8],
  stride: usize,
  bpp: usize,
  rows_left: u32,
  read: usize,
  write: usize,
}
impl Debug for ScanlineReconstructor<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ScanlineReconstructor")
      .field("stride", &self.stride)
      .field("bpp", &self.bpp)
      .field("rows_left", &self.rows_left)
      .field("read", &self.read)
      .field("write", &self.write)
      .finish()
  }
}
impl<'b> ScanlineReconstructor<'b> {
  /// Prepares to unfilter the image in `buf`.
  ///
  /// ## Failure
  /// * [`NotImplemented`](DecodeError::NotImplemented) for images that this
  ///   crate doesn't decode.
  /// * [`OutOfData`](DecodeError::OutOfData) if `buf` is shorter than
  ///   [`filtered_len`](ImageDescriptor::filtered_len).
  pub fn new(buf: &'b mut [u8], descriptor: &ImageDescriptor) -> DecodeResult<Self> {
    descriptor.check_supported()?;
    if buf.len() < descriptor.filtered_len()? {
      return Err(DecodeError::OutOfData);
    }
    Ok(Self {
      buf,
      stride: descriptor.bytes_per_scanline()?,
      bpp: descriptor.bytes_per_pixel(),
      rows_left: descriptor.height,
      read: 0,
      write: 0,
    })
  }

  /// Where the next filtered row starts (its filter byte).
  #[inline]
  #[must_use]
  pub const fn read_index(&self) -> usize {
    self.read
  }

  /// Where the next unfiltered row will be written.
  #[inline]
  #[must_use]
  pub const fn write_index(&self) -> usize {
    self.write
  }

  /// Unfilters the next row. Gives `false` once there are no more rows.
  pub fn unfilter_next_row(&mut self) -> DecodeResult<bool> {
    if self.rows_left == 0 {
      return Ok(false);
    }
    debug_assert!(self.read >= self.write);
    let filter = FilterType::try_from(self.buf[self.read])?;
    let row_start = self.read + 1;
    let row_end = row_start + self.stride;
    let (done, rest) = self.buf.split_at_mut(row_start);
    let prev = match self.write.checked_sub(self.stride) {
      Some(prev_start) if self.write > 0 => Some(&done[prev_start..self.write]),
      _ => None,
    };
    unfilter_row(filter, self.bpp, prev, &mut rest[..self.stride]);
    self.buf.copy_within(row_start..row_end, self.write);
    self.read = row_end;
    self.write += self.stride;
    self.rows_left -= 1;
    Ok(true)
  }

  /// Unfilters all remaining rows, giving the total unfiltered length.
  pub fn unfilter_all(&mut self) -> DecodeResult<usize> {
    while self.unfilter_next_row()? {}
    Ok(self.write)
  }
}

/// Turns filtered scanlines into 8-bit RGBA, in place.
///
/// The filtered data must be at the start of `buffer`, and `buffer` must be
/// at least [`required_buffer_len`](ImageDescriptor::required_buffer_len)
/// bytes (RGB data grows when the alpha channel is added). On success the
/// RGBA pixels are at the start of `buffer` and their length is returned.
///
/// * 16-bit samples keep their high byte.
/// * RGB pixels get an alpha of 255.
///
/// ## Failure
/// * [`NotImplemented`](DecodeError::NotImplemented) for unsupported images.
/// * [`BufferTooSmall`](DecodeError::BufferTooSmall) if `buffer` is too short.
/// * [`CorruptData`](DecodeError::CorruptData) for a filter type above 4.
///
/// The first two are checked before anything in `buffer` is changed.
pub fn reconstruct_in_place(
  buffer: &mut [u8], descriptor: &ImageDescriptor,
) -> DecodeResult<usize> {
  descriptor.check_supported()?;
  if buffer.len() < descriptor.required_buffer_len()? {
    return Err(DecodeError::BufferTooSmall);
  }
  ScanlineReconstructor::new(buffer, descriptor)?.unfilter_all()?;

  let samples = descriptor.pixel_count()? * descriptor.color_type.channel_count();
  if descriptor.bit_depth == 16 {
    // big-endian samples, so the high byte is the first one.
    for i in 0..samples {
      buffer[i] = buffer[i * 2];
    }
  }
  if descriptor.color_type == ColorType::RGB {
    // each pixel moves to a higher index, so work from the end.
    for p in (0..descriptor.pixel_count()?).rev() {
      let (r, g, b) = (buffer[p * 3], buffer[p * 3 + 1], buffer[p * 3 + 2]);
      buffer[p * 4..p * 4 + 4].copy_from_slice(&[r, g, b, 255]);
    }
  }
  let rgba_len = descriptor.rgba_len()?;
  debug!("reconstructed {}x{} image", descriptor.width, descriptor.height);
  Ok(rgba_len)
}

/// Allocating version of [`reconstruct_in_place`].
///
/// `filtered` is grown as needed and reused for the output.
///
/// ## Failure
/// As [`reconstruct_in_place`], and
/// [`OutOfData`](DecodeError::OutOfData) if `filtered` is shorter than
/// [`filtered_len`](ImageDescriptor::filtered_len).
#[cfg(feature = "alloc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "alloc")))]
pub fn reconstruct(
  mut filtered: Vec<u8>, descriptor: &ImageDescriptor,
) -> DecodeResult<RgbaImage> {
  descriptor.check_supported()?;
  if filtered.len() < descriptor.filtered_len()? {
    return Err(DecodeError::OutOfData);
  }
  let required = descriptor.required_buffer_len()?;
  if filtered.len() < required {
    filtered.try_reserve_exact(required - filtered.len())?;
    filtered.resize(required, 0);
  }
  let rgba_len = reconstruct_in_place(&mut filtered, descriptor)?;
  filtered.truncate(rgba_len);
  Ok(RgbaImage { width: descriptor.width, height: descriptor.height, pixels: filtered })
}

#[test]
fn test_paeth_predict() {
  // p = 10 + 20 - 15 = 15, distances 5, 5, 0
  assert_eq!(paeth_predict(10, 20, 15), 15);
  // p = 30, distances 10, 20, 30
  assert_eq!(paeth_predict(20, 10, 0), 20);
  // p = 10, pa = 10, pb = 0
  assert_eq!(paeth_predict(0, 10, 0), 10);
  // all equal picks left
  assert_eq!(paeth_predict(7, 7, 7), 7);
  // pa == pb beats pc: p = 5+5-0 = 10, pa = 5, pb = 5, pc = 10
  assert_eq!(paeth_predict(5, 5, 0), 5);
}

#[test]
fn test_unfilter_row_average_does_not_wrap() {
  let prev = [200, 200];
  let mut row = [0, 0];
  unfilter_row(FilterType::Average, 1, Some(&prev), &mut row);
  // (0 + 200) / 2 = 100, then (100 + 200) / 2 = 150
  assert_eq!(row, [100, 150]);
}

#[test]
fn test_unfilter_row_each_filter() {
  let prev = [10, 20, 30, 40];
  let mut row = [1, 2, 3, 4];
  unfilter_row(FilterType::None, 2, Some(&prev), &mut row);
  assert_eq!(row, [1, 2, 3, 4]);
  unfilter_row(FilterType::Sub, 2, Some(&prev), &mut row);
  assert_eq!(row, [1, 2, 4, 6]);
  let mut row = [1, 2, 3, 4];
  unfilter_row(FilterType::Up, 2, Some(&prev), &mut row);
  assert_eq!(row, [11, 22, 33, 44]);
  let mut row = [1, 2, 3, 4];
  unfilter_row(FilterType::Up, 2, None, &mut row);
  assert_eq!(row, [1, 2, 3, 4]);
  let mut row = [1, 2, 3, 4];
  unfilter_row(FilterType::Paeth, 2, None, &mut row);
  assert_eq!(row, [1, 2, 4, 6]);
  // first pixel: paeth(0, up, 0) is up. second: paeth(11, 30, 10) is 30
  let mut row = [1, 2, 3, 4];
  unfilter_row(FilterType::Paeth, 2, Some(&prev), &mut row);
  assert_eq!(row, [11, 22, 33, 44]);
}

#[test]
fn test_reconstructor_indices() {
  let descriptor = ImageDescriptor {
    width: 1,
    height: 2,
    bit_depth: 8,
    color_type: ColorType::RGBA,
    is_interlaced: false,
  };
  let mut buf = [0, 1, 2, 3, 4, 2, 1, 1, 1, 1];
  let mut r = ScanlineReconstructor::new(&mut buf, &descriptor).unwrap();
  assert_eq!(r.unfilter_next_row(), Ok(true));
  assert_eq!((r.read_index(), r.write_index()), (5, 4));
  assert_eq!(r.unfilter_next_row(), Ok(true));
  assert_eq!((r.read_index(), r.write_index()), (10, 8));
  assert_eq!(r.unfilter_next_row(), Ok(false));
  assert_eq!(&buf[..8], &[1, 2, 3, 4, 2, 3, 4, 5]);

  let mut short = [0_u8; 9];
  assert_eq!(
    ScanlineReconstructor::new(&mut short, &descriptor).map(|_| ()),
    Err(DecodeError::OutOfData)
  );
}
