use super::*;

/// The four ASCII bytes that name a chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  /// Image Header
  pub const IHDR: Self = Self(*b"IHDR");
  /// Palette
  pub const PLTE: Self = Self(*b"PLTE");
  /// Image Data
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image End
  pub const IEND: Self = Self(*b"IEND");

  /// If a decoder must understand this chunk to show the image.
  ///
  /// This is bit 5 of the first byte, so an uppercase first letter.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & 0x20) == 0
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for b in self.0 {
      f.write_char(if b.is_ascii_graphic() { b as char } else { '?' })?;
    }
    Ok(())
  }
}

/// An unparsed chunk from a PNG.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawChunk<'b> {
  chunk_type: ChunkType,
  data: &'b [u8],
  declared_crc: u32,
}
impl Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("chunk_type", &self.chunk_type)
      .field("len", &self.data.len())
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl<'b> RawChunk<'b> {
  /// The chunk's name.
  #[inline]
  #[must_use]
  pub const fn chunk_type(&self) -> ChunkType {
    self.chunk_type
  }

  /// The chunk's payload.
  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }

  /// The CRC stored after the payload.
  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }

  /// The CRC of the type and payload bytes.
  #[inline]
  #[must_use]
  pub fn actual_crc(&self) -> u32 {
    let mut crc = Crc32::new();
    crc.update(&self.chunk_type.0);
    crc.update(self.data);
    crc.finish()
  }

  /// If the declared CRC matches the actual one.
  #[inline]
  #[must_use]
  pub fn crc_matches(&self) -> bool {
    self.declared_crc == self.actual_crc()
  }

  /// See [`ChunkType::is_critical`].
  #[inline]
  #[must_use]
  pub const fn is_critical(&self) -> bool {
    self.chunk_type.is_critical()
  }
}

/// An iterator over the chunks of PNG bytes.
///
/// Iteration just stops if the data runs out partway through a chunk. Any
/// input at all is safe to iterate, it will never panic.
#[derive(Debug, Clone)]
pub struct RawChunkIter<'b>(&'b [u8]);
impl<'b> RawChunkIter<'b> {
  /// Pass the full PNG bytes, the 8 signature bytes are skipped (without
  /// checking them).
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }

  fn take(&mut self, count: usize) -> Option<&'b [u8]> {
    if self.0.len() < count {
      self.0 = &[];
      return None;
    }
    let (out, rest) = self.0.split_at(count);
    self.0 = rest;
    Some(out)
  }

  fn take_u32_be(&mut self) -> Option<u32> {
    match *self.take(4)? {
      [a, b, c, d] => Some(u32::from_be_bytes([a, b, c, d])),
      _ => None,
    }
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = RawChunk<'b>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    let len = usize::try_from(self.take_u32_be()?).ok()?;
    let chunk_type = match *self.take(4)? {
      [a, b, c, d] => ChunkType([a, b, c, d]),
      _ => return None,
    };
    let data = self.take(len)?;
    let declared_crc = self.take_u32_be()?;
    Some(RawChunk { chunk_type, data, declared_crc })
  }
}

#[test]
fn test_raw_chunk_iter() {
  #[rustfmt::skip]
  let bytes = [
    137, 80, 78, 71, 13, 10, 26, 10,
    0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82,
    0, 0, 0, 2, b't', b'E', b'X', b't', 1, 2, 0, 0, 0, 0,
    // truncated
    0, 0, 0, 9, b'I', b'D', b'A', b'T', 1,
  ];
  let mut it = RawChunkIter::new(&bytes);
  let iend = it.next().unwrap();
  assert_eq!(iend.chunk_type(), ChunkType::IEND);
  assert!(iend.is_critical());
  assert!(iend.crc_matches());
  let text = it.next().unwrap();
  assert_eq!(text.data(), &[1, 2]);
  assert!(!text.is_critical());
  assert!(!text.crc_matches());
  assert!(it.next().is_none());
  assert!(it.next().is_none());

  assert!(RawChunkIter::new(&[1, 2, 3]).next().is_none());
}
