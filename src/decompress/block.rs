use super::*;

/// The order that code length code lengths are stored in a dynamic block
/// header.
pub const CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

const fn fixed_lit_len_lengths() -> [u8; 288] {
  let mut out = [0; 288];
  let mut i = 0;
  while i < 288 {
    out[i] = match i {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
    i += 1;
  }
  out
}

/// Code lengths of the fixed literal/length code.
pub const FIXED_LIT_LEN_LENGTHS: [u8; 288] = fixed_lit_len_lengths();

/// Code lengths of the fixed distance code.
pub const FIXED_DIST_LENGTHS: [u8; 32] = [5; 32];

/// The literal/length table used by every fixed Huffman block.
pub static FIXED_LIT_LEN_TABLE: CanonicalHuffmanTable =
  match CanonicalHuffmanTable::try_from_lengths(&FIXED_LIT_LEN_LENGTHS) {
    Some(table) => table,
    None => panic!("the fixed literal/length lengths are a complete code"),
  };

/// The distance table used by every fixed Huffman block.
pub static FIXED_DIST_TABLE: CanonicalHuffmanTable =
  match CanonicalHuffmanTable::try_from_lengths(&FIXED_DIST_LENGTHS) {
    Some(table) => table,
    None => panic!("the fixed distance lengths are a complete code"),
  };

/// How a block's data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
  /// `BTYPE=00`: raw bytes.
  Stored,
  /// `BTYPE=01`: Huffman coded with the fixed tables.
  FixedHuffman,
  /// `BTYPE=10`: Huffman coded with tables sent in the block header.
  DynamicHuffman,
  /// `BTYPE=11`: always an error.
  Reserved,
}

/// The first three bits of every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
  /// If this is the last block of the stream.
  pub is_final: bool,
  /// How the block's data is stored.
  pub kind: BlockKind,
}

/// Reads `BFINAL` and `BTYPE`.
pub fn read_block_header(cursor: &mut BitCursor<'_>) -> DecodeResult<BlockHeader> {
  let is_final = cursor.read_bit()? != 0;
  let kind = match cursor.read_bits(2)? {
    0b00 => BlockKind::Stored,
    0b01 => BlockKind::FixedHuffman,
    0b10 => BlockKind::DynamicHuffman,
    _ => BlockKind::Reserved,
  };
  Ok(BlockHeader { is_final, kind })
}

/// Copies the body of a stored block to the output.
///
/// The cursor should be just past the block header.
pub fn copy_stored(cursor: &mut BitCursor<'_>, out: &mut OutputWindow<'_>) -> DecodeResult<()> {
  cursor.align_to_byte();
  let len = cursor.read_u16_le()?;
  let nlen = cursor.read_u16_le()?;
  if len != !nlen {
    return Err(DecodeError::CorruptData);
  }
  out.extend_from_slice(cursor.take_bytes(usize::from(len))?)
}

/// Reads the header of a dynamic block, giving the literal/length and distance
/// tables for the block.
///
/// The cursor should be just past the block header.
pub fn read_dynamic_tables(
  cursor: &mut BitCursor<'_>,
) -> DecodeResult<(CanonicalHuffmanTable, CanonicalHuffmanTable)> {
  let lit_len_count = cursor.read_bits(5)? as usize + 257;
  let dist_count = cursor.read_bits(5)? as usize + 1;
  let code_length_count = cursor.read_bits(4)? as usize + 4;
  trace!("dynamic block: hlit={lit_len_count}, hdist={dist_count}, hclen={code_length_count}");

  let mut cl_lengths = [0_u8; 19];
  for &symbol in CODE_LENGTH_ORDER.iter().take(code_length_count) {
    cl_lengths[symbol] = cursor.read_bits(3)? as u8;
  }
  let cl_table = CanonicalHuffmanTable::build(&cl_lengths)?;

  // Both alphabets are sent as one run-length coded sequence, and a repeat is
  // allowed to cross from one alphabet into the other.
  let total = lit_len_count + dist_count;
  let mut lengths = [0_u8; MAX_SYMBOLS + 32];
  let mut acquired = 0_usize;
  while acquired < total {
    let (value, repeat) = match cl_table.decode(cursor)? {
      len @ 0..=15 => (len as u8, 1),
      16 => {
        let previous = *acquired
          .checked_sub(1)
          .and_then(|i| lengths.get(i))
          .ok_or(DecodeError::CorruptData)?;
        (previous, 3 + cursor.read_bits(2)? as usize)
      }
      17 => (0, 3 + cursor.read_bits(3)? as usize),
      18 => (0, 11 + cursor.read_bits(7)? as usize),
      _ => return Err(DecodeError::CorruptData),
    };
    let end = acquired + repeat;
    if end > total {
      return Err(DecodeError::CorruptData);
    }
    lengths[acquired..end].fill(value);
    acquired = end;
  }

  let (lit_len_lengths, dist_lengths) = lengths[..total].split_at(lit_len_count);
  if lit_len_lengths[usize::from(END_OF_BLOCK)] == 0 {
    // without an end of block code the block could never finish.
    return Err(DecodeError::CorruptData);
  }
  let lit_len = CanonicalHuffmanTable::build(lit_len_lengths)?;
  let dist = CanonicalHuffmanTable::build(dist_lengths)?;
  Ok((lit_len, dist))
}

#[test]
fn test_read_block_header() {
  // bits: 1, 0,1 (BTYPE is read lsb first, so 0b10)
  let mut c = BitCursor::new(&[0b101]);
  assert_eq!(
    read_block_header(&mut c),
    Ok(BlockHeader { is_final: true, kind: BlockKind::DynamicHuffman })
  );
  let mut c = BitCursor::new(&[0b110]);
  assert_eq!(
    read_block_header(&mut c),
    Ok(BlockHeader { is_final: false, kind: BlockKind::Reserved })
  );
  let mut c = BitCursor::new(&[0b010]);
  assert_eq!(
    read_block_header(&mut c),
    Ok(BlockHeader { is_final: false, kind: BlockKind::FixedHuffman })
  );
}

#[test]
fn test_copy_stored() {
  // the header bits are already consumed, the rest of the byte is padding.
  let bytes = [0b001, 0x05, 0x00, 0xFA, 0xFF, b'H', b'E', b'L', b'L', b'O'];
  let mut c = BitCursor::new(&bytes);
  read_block_header(&mut c).unwrap();
  let mut buf = [0_u8; 5];
  let mut out = OutputWindow::new(&mut buf);
  assert_eq!(copy_stored(&mut c, &mut out), Ok(()));
  assert_eq!(out.written(), b"HELLO");

  let bytes = [0b001, 0x05, 0x00, 0xF9, 0xFF, b'H', b'E', b'L', b'L', b'O'];
  let mut c = BitCursor::new(&bytes);
  read_block_header(&mut c).unwrap();
  let mut buf = [0_u8; 5];
  let mut out = OutputWindow::new(&mut buf);
  assert_eq!(copy_stored(&mut c, &mut out), Err(DecodeError::CorruptData));
  assert_eq!(out.position(), 0);

  // LEN says more than the input has.
  let bytes = [0b001, 0x06, 0x00, 0xF9, 0xFF, b'H', b'E', b'L', b'L', b'O'];
  let mut c = BitCursor::new(&bytes);
  read_block_header(&mut c).unwrap();
  let mut buf = [0_u8; 8];
  let mut out = OutputWindow::new(&mut buf);
  assert_eq!(copy_stored(&mut c, &mut out), Err(DecodeError::OutOfData));
}

/// Packs `(value, bit_count)` fields lsb first, the way a block header is
/// written. Huffman codes go in bit reversed, first bit of the code in bit 0.
#[cfg(test)]
fn pack_fields(parts: &[&[(u32, u32)]]) -> [u8; 64] {
  let mut out = [0_u8; 64];
  let mut at = 0;
  for &(value, count) in parts.iter().copied().flatten() {
    for k in 0..count {
      out[at / 8] |= (((value >> k) & 1) as u8) << (at % 8);
      at += 1;
    }
  }
  out
}

#[test]
fn test_read_dynamic_tables_rejects_bad_headers() {
  // HLIT=0 and HDIST=0, so 257 + 1 lengths are expected.
  let counts = [(0, 5), (0, 5)];

  // Code length codes 16 and 17 get one bit each: 16 is `0`, 17 is `1`.
  // The very first length is a repeat, with nothing before it to repeat.
  let cl_lengths = [(0, 4), (1, 3), (1, 3), (0, 3), (0, 3)];
  let bytes = pack_fields(&[&counts, &cl_lengths, &[(0, 1), (0, 2)]]);
  let mut c = BitCursor::new(&bytes);
  assert_eq!(read_dynamic_tables(&mut c).map(|_| ()), Err(DecodeError::CorruptData));

  // Code length codes 0 and 18 get one bit each: 0 is `0`, 18 is `1`.
  // Two runs of 138 zeros go past the 258 lengths.
  let cl_lengths = [(0, 4), (0, 3), (0, 3), (1, 3), (1, 3)];
  let runs = [(1, 1), (127, 7), (1, 1), (127, 7)];
  let bytes = pack_fields(&[&counts, &cl_lengths, &runs]);
  let mut c = BitCursor::new(&bytes);
  assert_eq!(read_dynamic_tables(&mut c).map(|_| ()), Err(DecodeError::CorruptData));

  // Code length code 0 is `0`, 1 is `10`, 18 is `11`. Symbol 1 is the 18th
  // in the send order. Literal 0 gets length 1, then zeros up through end of
  // block, then one distance code.
  #[rustfmt::skip]
  let cl_lengths = [
    (14, 4),
    (0, 3), (0, 3), (2, 3), (1, 3), (0, 3), (0, 3), (0, 3), (0, 3), (0, 3),
    (0, 3), (0, 3), (0, 3), (0, 3), (0, 3), (0, 3), (0, 3), (0, 3), (2, 3),
  ];
  let literals = [(0b01, 2), (0b11, 2), (127, 7), (0b11, 2), (106, 7)];
  let no_end_of_block = [(0, 1), (0b01, 2)];
  let bytes = pack_fields(&[&counts, &cl_lengths, &literals, &no_end_of_block]);
  let mut c = BitCursor::new(&bytes);
  assert_eq!(read_dynamic_tables(&mut c).map(|_| ()), Err(DecodeError::CorruptData));

  // The same header with end of block given a length reads fine.
  let with_end_of_block = [(0b01, 2), (0b01, 2)];
  let bytes = pack_fields(&[&counts, &cl_lengths, &literals, &with_end_of_block]);
  let mut c = BitCursor::new(&bytes);
  let (lit_len, dist) = read_dynamic_tables(&mut c).unwrap();
  assert_eq!(lit_len.length_of(0), 1);
  assert_eq!(lit_len.length_of(1), 0);
  assert_eq!(lit_len.length_of(usize::from(END_OF_BLOCK)), 1);
  assert_eq!(dist.length_of(0), 1);
}
