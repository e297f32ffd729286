use super::*;

/// Reads bits out of a byte slice, least significant bit first.
///
/// This is the bit order DEFLATE uses for everything except Huffman codes,
/// which are packed starting with their most significant bit. Huffman decoding
/// handles that by reading one bit at a time (see [`CanonicalHuffmanTable`]).
///
/// The cursor only borrows the input. Reading past the end is always an
/// [`OutOfData`](DecodeError::OutOfData) error, and never moves the cursor.
#[derive(Clone)]
pub struct BitCursor<'b> {
  bytes: &'b [u8],
  position: usize,
  bit_offset: u32,
}

impl core::fmt::Debug for BitCursor<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("BitCursor")
      .field("position", &self.position)
      .field("bit_offset", &self.bit_offset)
      .field("len", &self.bytes.len())
      .field("current", &self.bytes.get(self.position))
      .finish()
  }
}

impl<'b> BitCursor<'b> {
  /// A cursor at the first bit of `bytes`.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, position: 0, bit_offset: 0 }
  }

  /// The index of the byte the next bit comes from.
  #[inline]
  #[must_use]
  pub const fn position(&self) -> usize {
    self.position
  }

  /// How many bits have been read out of the current byte (`0..8`).
  #[inline]
  #[must_use]
  pub const fn bit_offset(&self) -> u32 {
    self.bit_offset
  }

  /// Whole bytes not yet touched by any read.
  #[inline]
  #[must_use]
  pub fn remaining_bytes(&self) -> usize {
    let partial = (self.bit_offset != 0) as usize;
    self.bytes.len().saturating_sub(self.position + partial)
  }

  #[inline]
  fn remaining_bits(&self) -> u64 {
    match self.bytes.len().checked_sub(self.position) {
      None | Some(0) => 0,
      Some(whole) => (whole as u64) * 8 - u64::from(self.bit_offset),
    }
  }

  /// Reads one bit.
  #[inline]
  pub fn read_bit(&mut self) -> DecodeResult<u32> {
    let byte = *self.bytes.get(self.position).ok_or(DecodeError::OutOfData)?;
    let bit = (u32::from(byte) >> self.bit_offset) & 1;
    self.bit_offset += 1;
    if self.bit_offset == 8 {
      self.bit_offset = 0;
      self.position += 1;
    }
    Ok(bit)
  }

  /// Reads `count` bits as an unsigned value.
  ///
  /// The first bit read becomes bit 0 of the output, the next becomes bit 1,
  /// and so on. `count` must be 32 or less.
  #[inline]
  pub fn read_bits(&mut self, count: u32) -> DecodeResult<u32> {
    debug_assert!(count <= 32, "can't read {count} bits into a u32");
    if u64::from(count) > self.remaining_bits() {
      return Err(DecodeError::OutOfData);
    }
    let mut out = 0_u32;
    for k in 0..count {
      out |= self.read_bit()? << k;
    }
    Ok(out)
  }

  /// Discards any bits left in a partially read byte.
  #[inline]
  pub fn align_to_byte(&mut self) {
    if self.bit_offset != 0 {
      self.bit_offset = 0;
      self.position += 1;
    }
  }

  /// Reads two whole bytes as a little-endian `u16`.
  ///
  /// The cursor must be byte aligned.
  #[inline]
  pub fn read_u16_le(&mut self) -> DecodeResult<u16> {
    let [a, b] = self.take_array::<2>()?;
    Ok(u16::from_le_bytes([a, b]))
  }

  /// Reads four whole bytes as a big-endian `u32`.
  ///
  /// The cursor must be byte aligned.
  #[inline]
  pub fn read_u32_be(&mut self) -> DecodeResult<u32> {
    Ok(u32::from_be_bytes(self.take_array::<4>()?))
  }

  /// Takes the next `count` whole bytes as a sub-slice.
  ///
  /// The cursor must be byte aligned.
  #[inline]
  pub fn take_bytes(&mut self, count: usize) -> DecodeResult<&'b [u8]> {
    debug_assert_eq!(self.bit_offset, 0, "byte reads need an aligned cursor");
    let end = self.position.checked_add(count).ok_or(DecodeError::OutOfData)?;
    let out = self.bytes.get(self.position..end).ok_or(DecodeError::OutOfData)?;
    self.position = end;
    Ok(out)
  }

  #[inline]
  fn take_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
    let bytes = self.take_bytes(N)?;
    let mut out = [0_u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
  }
}

#[test]
fn test_read_bits_is_lsb_first() {
  // 0b1010_1100, 0b0000_0001
  let mut c = BitCursor::new(&[0xAC, 0x01]);
  assert_eq!(c.read_bit(), Ok(0));
  assert_eq!(c.read_bit(), Ok(0));
  assert_eq!(c.read_bit(), Ok(1));
  // the next bits are 1, 0, 1 going upward, so bit 0 of the output is the 1.
  assert_eq!(c.read_bits(3), Ok(0b101));
  assert_eq!(c.read_bits(3), Ok(0b110));
  assert_eq!((c.position(), c.bit_offset()), (1, 1));
  assert_eq!(c.read_bits(7), Ok(0));
  assert_eq!(c.read_bit(), Err(DecodeError::OutOfData));
}

#[test]
fn test_read_past_end_does_not_move() {
  let mut c = BitCursor::new(&[0xFF]);
  assert_eq!(c.read_bits(5), Ok(0b11111));
  assert_eq!(c.read_bits(4), Err(DecodeError::OutOfData));
  assert_eq!(c.read_bits(3), Ok(0b111));
  assert_eq!(c.read_bits(0), Ok(0));
}

#[test]
fn test_read_bits_full_width() {
  let mut c = BitCursor::new(&[0x78, 0x56, 0x34, 0x12, 0x01]);
  assert_eq!(c.read_bits(32), Ok(0x1234_5678));
  assert_eq!(c.read_bits(32), Err(DecodeError::OutOfData));
  assert_eq!(c.read_bits(8), Ok(0x01));
}

#[test]
fn test_aligned_reads() {
  let mut c = BitCursor::new(&[0b0000_0011, 0x05, 0x00, 0xFA, 0xFF, b'H']);
  assert_eq!(c.read_bits(3), Ok(0b011));
  c.align_to_byte();
  assert_eq!(c.read_u16_le(), Ok(5));
  assert_eq!(c.read_u16_le(), Ok(0xFFFA));
  assert_eq!(c.remaining_bytes(), 1);
  assert_eq!(c.take_bytes(2), Err(DecodeError::OutOfData));
  assert_eq!(c.take_bytes(1), Ok(&b"H"[..]));
  // aligning when already aligned does nothing.
  c.align_to_byte();
  assert_eq!(c.position(), 6);
}
