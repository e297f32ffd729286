//! The CRC-32 used by PNG chunks (ISO 3309, reflected, poly `0xEDB88320`).

static CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut table = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if (c & 1) != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    table[n] = c;
    n += 1;
  }
  table
}

/// A running CRC-32, for when the bytes aren't all in one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32(u32);
impl Crc32 {
  /// A fresh checksum.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(u32::MAX)
  }

  /// Feeds more bytes in.
  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    for &byte in bytes {
      let i = (self.0 ^ u32::from(byte)) as u8 as usize;
      self.0 = CRC_TABLE[i] ^ (self.0 >> 8);
    }
  }

  /// The checksum of everything fed in so far.
  #[inline]
  #[must_use]
  pub const fn finish(self) -> u32 {
    self.0 ^ u32::MAX
  }
}
impl Default for Crc32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

/// The CRC-32 of a single slice.
#[inline]
#[must_use]
pub fn crc32(bytes: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(bytes);
  crc.finish()
}

#[test]
fn test_crc32() {
  assert_eq!(crc32(b""), 0);
  assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
  // every IEND chunk has this CRC.
  assert_eq!(crc32(b"IEND"), 0xAE42_6082);
  let mut split = Crc32::new();
  split.update(b"IE");
  split.update(b"ND");
  assert_eq!(split.finish(), 0xAE42_6082);
}
