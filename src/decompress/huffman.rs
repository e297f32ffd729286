use super::*;

/// The longest code DEFLATE allows.
pub const MAX_CODE_LENGTH: usize = 15;

/// The biggest alphabet DEFLATE uses (the literal/length alphabet).
pub const MAX_SYMBOLS: usize = 288;

/// A decode table for one canonical Huffman code.
///
/// The table is built from nothing but a list of per-symbol code lengths (`0`
/// meaning "unused"), using the algorithm from RFC 1951 section 3.2.2.
///
/// Lookups are keyed by a *sentinel-prefixed partial code*: the code bits read
/// so far with an extra `1` bit placed just above them. The sentinel makes
/// every (length, code) pair a distinct integer, so `0b01` (length 2) and
/// `0b001` (length 3) become keys `0b101` and `0b1001`. Within one length the
/// canonical codes form a contiguous run, so resolving a key is a range check
/// and a single array index, no tree walking and no allocation.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalHuffmanTable {
  /// How many symbols use each code length.
  counts: [u16; MAX_CODE_LENGTH + 1],
  /// The numerically smallest code of each length.
  first_code: [u16; MAX_CODE_LENGTH + 1],
  /// Where each length's run of symbols starts within `symbols`.
  offsets: [u16; MAX_CODE_LENGTH + 1],
  /// Symbols sorted by (code length, symbol index), which is code order.
  symbols: [u16; MAX_SYMBOLS],
  /// The code assigned to each symbol (meaningless if its length is 0).
  codes: [u16; MAX_SYMBOLS],
  lengths: [u8; MAX_SYMBOLS],
  symbol_count: u16,
  min_length: u8,
  max_length: u8,
}

impl core::fmt::Debug for CanonicalHuffmanTable {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("CanonicalHuffmanTable")
      .field("symbol_count", &self.symbol_count)
      .field("min_length", &self.min_length)
      .field("max_length", &self.max_length)
      .field("counts", &&self.counts[1..=usize::from(self.max_length)])
      .finish()
  }
}

impl CanonicalHuffmanTable {
  /// Builds a table from per-symbol code lengths.
  ///
  /// ## Failure
  /// * More than 288 symbols.
  /// * Any length greater than 15.
  /// * The lengths describe more codes than fit in the code space
  ///   (over-subscribed).
  ///
  /// An all-zero length list is accepted, but the resulting table can't decode
  /// anything: every [`decode`](Self::decode) call gives `CorruptData`.
  pub fn build(code_lengths: &[u8]) -> DecodeResult<Self> {
    let table = Self::try_from_lengths(code_lengths).ok_or(DecodeError::CorruptData)?;
    trace!(
      "huffman table: {} symbols, lengths {}..={}",
      table.symbol_count,
      table.min_length,
      table.max_length
    );
    Ok(table)
  }

  /// The `const` core of [`build`](Self::build), so that the fixed tables can
  /// be computed at compile time.
  pub(crate) const fn try_from_lengths(code_lengths: &[u8]) -> Option<Self> {
    if code_lengths.len() > MAX_SYMBOLS {
      return None;
    }
    let mut table = Self {
      counts: [0; MAX_CODE_LENGTH + 1],
      first_code: [0; MAX_CODE_LENGTH + 1],
      offsets: [0; MAX_CODE_LENGTH + 1],
      symbols: [0; MAX_SYMBOLS],
      codes: [0; MAX_SYMBOLS],
      lengths: [0; MAX_SYMBOLS],
      symbol_count: code_lengths.len() as u16,
      min_length: 0,
      max_length: 0,
    };

    // 1) Count the number of codes for each code length.
    let mut i = 0;
    while i < code_lengths.len() {
      let len = code_lengths[i] as usize;
      if len > MAX_CODE_LENGTH {
        return None;
      }
      table.lengths[i] = len as u8;
      if len != 0 {
        table.counts[len] += 1;
        if table.min_length == 0 || (len as u8) < table.min_length {
          table.min_length = len as u8;
        }
        if (len as u8) > table.max_length {
          table.max_length = len as u8;
        }
      }
      i += 1;
    }

    // 2) Find the numerical value of the smallest code for each code length.
    //    Length 0 never takes part, so the sum starts from zero.
    let mut next_code = [0_u16; MAX_CODE_LENGTH + 1];
    let mut code = 0_u32;
    let mut offset = 0_u16;
    let mut bits = 1;
    while bits <= MAX_CODE_LENGTH {
      let previous = if bits == 1 { 0 } else { table.counts[bits - 1] as u32 };
      code = (code + previous) << 1;
      // Codes of this length must fit in `bits` bits, or the lengths are
      // over-subscribed.
      if code + table.counts[bits] as u32 > (1 << bits) {
        return None;
      }
      table.first_code[bits] = code as u16;
      next_code[bits] = code as u16;
      table.offsets[bits] = offset;
      offset += table.counts[bits];
      bits += 1;
    }

    // 3) Assign consecutive codes to the symbols of each length, in symbol
    //    order. Unused symbols (length 0) get no code.
    let mut symbol = 0;
    while symbol < code_lengths.len() {
      let len = table.lengths[symbol] as usize;
      if len != 0 {
        let code = next_code[len];
        table.codes[symbol] = code;
        let slot = table.offsets[len] + (code - table.first_code[len]);
        table.symbols[slot as usize] = symbol as u16;
        next_code[len] += 1;
      }
      symbol += 1;
    }

    Some(table)
  }

  /// The number of symbols in the alphabet, used or not.
  #[inline]
  #[must_use]
  pub const fn symbol_count(&self) -> usize {
    self.symbol_count as usize
  }

  /// The shortest code length in use (0 if the table is empty).
  #[inline]
  #[must_use]
  pub const fn min_length(&self) -> u8 {
    self.min_length
  }

  /// The longest code length in use (0 if the table is empty).
  #[inline]
  #[must_use]
  pub const fn max_length(&self) -> u8 {
    self.max_length
  }

  /// The code length of a symbol, or 0 if it's unused or out of range.
  #[inline]
  #[must_use]
  pub fn length_of(&self, symbol: usize) -> u8 {
    if symbol < self.symbol_count() {
      self.lengths[symbol]
    } else {
      0
    }
  }

  /// The `(code, length)` assigned to a symbol, if it has one.
  #[inline]
  #[must_use]
  pub fn code_of(&self, symbol: usize) -> Option<(u16, u8)> {
    match self.length_of(symbol) {
      0 => None,
      len => Some((self.codes[symbol], len)),
    }
  }

  /// Resolves a sentinel-prefixed partial code to its symbol, if any symbol
  /// has exactly that code.
  #[inline]
  #[must_use]
  pub fn lookup(&self, key: u32) -> Option<u16> {
    if key < 2 {
      return None;
    }
    let len = (31 - key.leading_zeros()) as usize;
    if len > MAX_CODE_LENGTH {
      return None;
    }
    let code = key ^ (1 << len);
    let first = u32::from(self.first_code[len]);
    let count = u32::from(self.counts[len]);
    if code >= first && code < first + count {
      let slot = u32::from(self.offsets[len]) + (code - first);
      Some(self.symbols[slot as usize])
    } else {
      None
    }
  }

  /// Reads one symbol from the cursor.
  ///
  /// Huffman codes are packed most significant bit first, so each new bit is
  /// pushed onto the bottom of the key. The first `min_length` bits are read
  /// unconditionally since no code is shorter than that.
  pub fn decode(&self, cursor: &mut BitCursor<'_>) -> DecodeResult<u16> {
    if self.max_length == 0 {
      return Err(DecodeError::CorruptData);
    }
    let mut key = 1_u32;
    for _ in 0..self.min_length {
      key = (key << 1) | cursor.read_bit()?;
    }
    let mut len = self.min_length;
    loop {
      if let Some(symbol) = self.lookup(key) {
        return Ok(symbol);
      }
      if len == self.max_length {
        return Err(DecodeError::CorruptData);
      }
      key = (key << 1) | cursor.read_bit()?;
      len += 1;
    }
  }
}

#[test]
fn test_build_assigns_canonical_codes() {
  // the small example in RFC 1951.
  let t = CanonicalHuffmanTable::build(&[2, 1, 3, 3]).unwrap();
  assert_eq!(t.code_of(0), Some((0b10, 2)));
  assert_eq!(t.code_of(1), Some((0b0, 1)));
  assert_eq!(t.code_of(2), Some((0b110, 3)));
  assert_eq!(t.code_of(3), Some((0b111, 3)));

  // the bigger example.
  let t = CanonicalHuffmanTable::build(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();
  let expected = [
    (0b010, 3),
    (0b011, 3),
    (0b100, 3),
    (0b101, 3),
    (0b110, 3),
    (0b00, 2),
    (0b1110, 4),
    (0b1111, 4),
  ];
  for (symbol, code) in expected.iter().copied().enumerate() {
    assert_eq!(t.code_of(symbol), Some(code), "symbol {symbol}");
    assert_eq!(t.lookup(u32::from(code.0) | (1 << code.1)), Some(symbol as u16));
  }
  assert_eq!((t.min_length(), t.max_length()), (2, 4));
  // a prefix of a longer code is not itself a code.
  assert_eq!(t.lookup(0b111), None);
}

#[test]
fn test_fixed_literal_codes() {
  /* Table from the "compressed with fixed huffman codes" section

      Lit Value     Bits    Codes
      ---------     ----    ----
      0 - 143       8       00110000 through
                            10111111
      144 - 255     9       110010000 through
                            111111111
      256 - 279     7       0000000 through
                            0010111
      280 - 287     8       11000000 through
                            11000111
  */
  let t = &FIXED_LIT_LEN_TABLE;
  assert_eq!(t.code_of(0), Some((0b00110000, 8)));
  assert_eq!(t.code_of(143), Some((0b10111111, 8)));
  assert_eq!(t.code_of(144), Some((0b110010000, 9)));
  assert_eq!(t.code_of(255), Some((0b111111111, 9)));
  assert_eq!(t.code_of(256), Some((0b0000000, 7)));
  assert_eq!(t.code_of(279), Some((0b0010111, 7)));
  assert_eq!(t.code_of(280), Some((0b11000000, 8)));
  assert_eq!(t.code_of(287), Some((0b11000111, 8)));
  assert_eq!(FIXED_DIST_TABLE.code_of(31), Some((31, 5)));
}

#[test]
fn test_build_rejects_bad_lengths() {
  // three 1-bit codes can't exist.
  assert_eq!(CanonicalHuffmanTable::build(&[1, 1, 1]), Err(DecodeError::CorruptData));
  assert_eq!(CanonicalHuffmanTable::build(&[16, 1]), Err(DecodeError::CorruptData));
  assert_eq!(CanonicalHuffmanTable::build(&[1; 289]), Err(DecodeError::CorruptData));
  // incomplete codes are fine, DEFLATE uses them for one-symbol alphabets.
  assert!(CanonicalHuffmanTable::build(&[0, 1]).is_ok());
}

#[test]
fn test_decode_reads_msb_first() {
  let t = CanonicalHuffmanTable::build(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();
  // symbol 6 is `1110`, then symbol 5 is `00`, then symbol 0 is `010`. The
  // first code bit goes in the lowest bit of the byte.
  // bits in stream order: 1,1,1,0, 0,0, 0,1,0
  let mut c = BitCursor::new(&[0b1000_0111, 0b0000_0000]);
  assert_eq!(t.decode(&mut c), Ok(6));
  assert_eq!(t.decode(&mut c), Ok(5));
  assert_eq!(t.decode(&mut c), Ok(0));
  assert_eq!((c.position(), c.bit_offset()), (1, 1));
}

#[test]
fn test_decode_from_empty_table() {
  let t = CanonicalHuffmanTable::build(&[0, 0, 0]).unwrap();
  let mut c = BitCursor::new(&[0xFF]);
  assert_eq!(t.decode(&mut c), Err(DecodeError::CorruptData));

  // one used symbol: `0` decodes, `1` is a code nobody has.
  let t = CanonicalHuffmanTable::build(&[0, 1]).unwrap();
  let mut c = BitCursor::new(&[0b10]);
  assert_eq!(t.decode(&mut c), Ok(1));
  assert_eq!(t.decode(&mut c), Err(DecodeError::CorruptData));
}
