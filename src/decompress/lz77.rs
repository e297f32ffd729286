use super::*;

/// Base lengths for length symbols 257 through 285.
pub const LENGTH_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
  163, 195, 227, 258,
];

/// Extra bits read after each length symbol.
pub const LENGTH_EXTRA: [u8; 29] =
  [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

/// Base distances for distance symbols 0 through 29.
pub const DISTANCE_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
  2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits read after each distance symbol.
pub const DISTANCE_EXTRA: [u8; 30] = [
  0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
  13,
];

/// The literal/length symbol that ends a block.
pub const END_OF_BLOCK: u16 = 256;

/// One step of decoding a compressed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
  /// Output this byte.
  Literal(u8),
  /// The block is over.
  EndOfBlock,
  /// Copy `length` (3 to 258) bytes from `distance` (1 to 32,768) bytes back.
  #[allow(missing_docs)]
  Match { length: u16, distance: u16 },
}

#[test]
fn test_size_of_result_token() {
  use core::mem::size_of;
  // `DecodeResult<Token>` is returned once per symbol, keep it register sized.
  assert!(size_of::<DecodeResult<Token>>() <= size_of::<u64>());
}

/// Reads the next token using the block's two tables.
///
/// A length symbol is always followed by a distance symbol, so a match costs
/// two table decodes plus up to 5 + 13 extra bits.
pub fn next_token(
  cursor: &mut BitCursor<'_>, lit_len: &CanonicalHuffmanTable, dist: &CanonicalHuffmanTable,
) -> DecodeResult<Token> {
  let symbol = lit_len.decode(cursor)?;
  match symbol {
    0..=255 => Ok(Token::Literal(symbol as u8)),
    END_OF_BLOCK => Ok(Token::EndOfBlock),
    _ => {
      // symbols 286 and 287 have codes in the fixed table but no meaning.
      let i = usize::from(symbol - 257);
      let (&base, &extra) =
        LENGTH_BASE.get(i).zip(LENGTH_EXTRA.get(i)).ok_or(DecodeError::CorruptData)?;
      let length = base + cursor.read_bits(u32::from(extra))? as u16;

      let d = usize::from(dist.decode(cursor)?);
      let (&base, &extra) =
        DISTANCE_BASE.get(d).zip(DISTANCE_EXTRA.get(d)).ok_or(DecodeError::CorruptData)?;
      let distance = base + cursor.read_bits(u32::from(extra))? as u16;

      Ok(Token::Match { length, distance })
    }
  }
}

/// The decompression output: a caller-provided buffer plus a write position.
///
/// Every write is bounds checked against the buffer's length. The bytes
/// already written double as the LZ77 window, there's no separate history.
pub struct OutputWindow<'o> {
  buf: &'o mut [u8],
  pos: usize,
}

impl core::fmt::Debug for OutputWindow<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("OutputWindow")
      .field("pos", &self.pos)
      .field("capacity", &self.buf.len())
      .finish()
  }
}

impl<'o> OutputWindow<'o> {
  /// An empty window over `buf`.
  #[inline]
  #[must_use]
  pub fn new(buf: &'o mut [u8]) -> Self {
    Self { buf, pos: 0 }
  }

  /// Bytes written so far.
  #[inline]
  #[must_use]
  pub const fn position(&self) -> usize {
    self.pos
  }

  /// Everything written so far.
  #[inline]
  #[must_use]
  pub fn written(&self) -> &[u8] {
    &self.buf[..self.pos]
  }

  /// Appends one byte.
  #[inline]
  pub fn push(&mut self, byte: u8) -> DecodeResult<()> {
    let slot = self.buf.get_mut(self.pos).ok_or(DecodeError::BufferTooSmall)?;
    *slot = byte;
    self.pos += 1;
    Ok(())
  }

  /// Appends a run of bytes (a stored block).
  #[inline]
  pub fn extend_from_slice(&mut self, bytes: &[u8]) -> DecodeResult<()> {
    let end = self.pos.checked_add(bytes.len()).ok_or(DecodeError::BufferTooSmall)?;
    self.buf.get_mut(self.pos..end).ok_or(DecodeError::BufferTooSmall)?.copy_from_slice(bytes);
    self.pos = end;
    Ok(())
  }

  /// Replays `length` bytes starting `distance` bytes back.
  ///
  /// The source and destination can overlap (`distance < length`), and then
  /// the copy has to see its own output, so it goes one byte at a time. A
  /// distance of 1 is a run of the previous byte and is done as a fill.
  pub fn copy_match(&mut self, length: usize, distance: usize) -> DecodeResult<()> {
    if distance == 0 || distance > self.pos {
      return Err(DecodeError::CorruptData);
    }
    let end = self.pos.checked_add(length).ok_or(DecodeError::BufferTooSmall)?;
    if end > self.buf.len() {
      return Err(DecodeError::BufferTooSmall);
    }
    let mut src = self.pos - distance;
    if distance == 1 {
      let v = self.buf[src];
      self.buf[self.pos..end].fill(v);
    } else {
      for dst in self.pos..end {
        self.buf[dst] = self.buf[src];
        src += 1;
      }
    }
    self.pos = end;
    Ok(())
  }

  /// Applies one token. Gives `true` when the token ended the block.
  #[inline]
  pub fn apply(&mut self, token: Token) -> DecodeResult<bool> {
    match token {
      Token::Literal(byte) => self.push(byte).map(|_| false),
      Token::EndOfBlock => Ok(true),
      Token::Match { length, distance } => {
        self.copy_match(usize::from(length), usize::from(distance)).map(|_| false)
      }
    }
  }
}

#[test]
fn test_run_length_fill() {
  let mut buf = [0_u8; 8];
  let mut out = OutputWindow::new(&mut buf);
  out.push(0x41).unwrap();
  out.copy_match(5, 1).unwrap();
  assert_eq!(out.written(), &[0x41; 6]);
}

#[test]
fn test_overlapping_copy_repeats_pattern() {
  let mut buf = [0_u8; 10];
  let mut out = OutputWindow::new(&mut buf);
  out.extend_from_slice(b"abc").unwrap();
  out.copy_match(7, 3).unwrap();
  assert_eq!(out.written(), b"abcabcabca");
}

#[test]
fn test_copy_bounds() {
  let mut buf = [0_u8; 4];
  let mut out = OutputWindow::new(&mut buf);
  assert_eq!(out.copy_match(3, 1), Err(DecodeError::CorruptData));
  out.extend_from_slice(b"xy").unwrap();
  assert_eq!(out.copy_match(3, 3), Err(DecodeError::CorruptData));
  assert_eq!(out.copy_match(3, 2), Err(DecodeError::BufferTooSmall));
  // a failed copy writes nothing.
  assert_eq!(out.written(), b"xy");
  assert_eq!(out.apply(Token::Match { length: 2, distance: 2 }), Ok(false));
  assert_eq!(out.push(0), Err(DecodeError::BufferTooSmall));
  assert_eq!(out.extend_from_slice(b"z"), Err(DecodeError::BufferTooSmall));
  assert_eq!(out.written(), b"xyxy");
}

#[test]
fn test_next_token_with_fixed_tables() {
  // Fixed code for literal 'a' (0x61) is 0x30 + 0x61 = 0b1001_0001 (8 bits),
  // then end of block is 0b000_0000 (7 bits).
  //
  // stream bits: 1,0,0,1,0,0,0,1, 0,0,0,0,0,0,0
  let mut c = BitCursor::new(&[0b1000_1001, 0b0000_0000]);
  let (ll, d) = (&FIXED_LIT_LEN_TABLE, &FIXED_DIST_TABLE);
  assert_eq!(next_token(&mut c, ll, d), Ok(Token::Literal(b'a')));
  assert_eq!(next_token(&mut c, ll, d), Ok(Token::EndOfBlock));
}

#[test]
fn test_next_token_match() {
  // symbol 265 (length 11..=12, 1 extra bit) is fixed code 0b0001001 (7 bits),
  // extra bit 1 gives length 12. Distance symbol 4 (5..=6, 1 extra bit) is
  // 0b00100, extra bit 0 gives distance 5.
  //
  // stream bits: 0,0,0,1,0,0,1, 1, 0,0,1,0,0, 0
  let mut c = BitCursor::new(&[0b1100_1000, 0b0000_0100]);
  let t = next_token(&mut c, &FIXED_LIT_LEN_TABLE, &FIXED_DIST_TABLE);
  assert_eq!(t, Ok(Token::Match { length: 12, distance: 5 }));
}

#[test]
fn test_next_token_rejects_unused_symbols() {
  // literal/length symbol 286 is fixed code 0b11000110 (8 bits)
  // stream bits: 1,1,0,0,0,1,1,0
  let mut c = BitCursor::new(&[0b0110_0011]);
  let t = next_token(&mut c, &FIXED_LIT_LEN_TABLE, &FIXED_DIST_TABLE);
  assert_eq!(t, Err(DecodeError::CorruptData));

  // length symbol 257 (0b0000001), then distance symbol 30 (0b11110)
  // stream bits: 0,0,0,0,0,0,1, 1,1,1,1,0
  let mut c = BitCursor::new(&[0b1100_0000, 0b0000_0111]);
  let t = next_token(&mut c, &FIXED_LIT_LEN_TABLE, &FIXED_DIST_TABLE);
  assert_eq!(t, Err(DecodeError::CorruptData));
}
