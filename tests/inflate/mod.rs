use miniz_oxide::deflate::compress_to_vec_zlib;
use starlight::{
  decompress::{adler32, inflate_to_slice, inflate_with, InflateOptions},
  inflate, DecodeError,
};

/// Random data is incompressible, so mix in runs and repeats to get matches
/// and dynamic blocks out of the compressor.
fn rand_corpus_entry() -> Vec<u8> {
  let len = (super::rand_u32() % 40_000) as usize;
  let mut out = super::rand_bytes(len);
  let mut i = 0;
  while i < out.len() {
    let r = super::rand_u32();
    let span = (r % 300) as usize;
    match r % 4 {
      0 => {
        let b = out[i];
        out[i..].iter_mut().take(span).for_each(|x| *x = b);
      }
      1 if i > 1000 => {
        let back = 1 + (r >> 8) as usize % 1000;
        for k in i..(i + span).min(out.len()) {
          out[k] = out[k - back];
        }
      }
      _ => (),
    }
    i += span + 1;
  }
  out
}

#[test]
fn test_inflate_matches_reference_compressor() {
  for level in 0..=10 {
    for _ in 0..6 {
      let plain = rand_corpus_entry();
      let packed = compress_to_vec_zlib(&plain, level);
      let unpacked = inflate(&packed, plain.len()).unwrap();
      assert_eq!(unpacked, plain, "level {level}, len {}", plain.len());
    }
  }
}

#[test]
fn test_inflate_text_and_empty() {
  let text = b"It was the best of times, it was the worst of times, it was the age of \
  wisdom, it was the age of foolishness, it was the epoch of belief, it was the epoch of \
  incredulity, it was the season of Light, it was the season of Darkness";
  for level in [1, 6, 9] {
    let packed = compress_to_vec_zlib(text, level);
    assert_eq!(inflate(&packed, text.len()).unwrap(), text);
  }
  let packed = compress_to_vec_zlib(b"", 6);
  assert_eq!(inflate(&packed, 0).unwrap(), b"");
}

#[test]
fn test_inflate_checks_adler32_when_asked() {
  let plain = rand_corpus_entry();
  let mut packed = compress_to_vec_zlib(&plain, 6);
  let strict = InflateOptions { verify_adler32: true };
  assert_eq!(inflate_with(&packed, plain.len(), strict).unwrap(), plain);
  let trailer = packed.len() - 4;
  assert_eq!(u32::from_be_bytes(packed[trailer..].try_into().unwrap()), adler32(&plain));
  packed[trailer] ^= 0x01;
  assert_eq!(inflate_with(&packed, plain.len(), strict), Err(DecodeError::CorruptData));
  // not checked by default
  assert_eq!(inflate(&packed, plain.len()).unwrap(), plain);
}

#[test]
fn test_inflate_output_too_small() {
  let plain = vec![7_u8; 5000];
  let packed = compress_to_vec_zlib(&plain, 6);
  assert_eq!(inflate(&packed, 4999), Err(DecodeError::BufferTooSmall));
  let mut out = vec![0; 5000];
  assert_eq!(inflate_to_slice(&packed, &mut out), Ok(5000));
  assert_eq!(out, plain);
  // extra room is fine, the length tells you what was written.
  assert_eq!(inflate(&packed, 6000).unwrap().len(), 5000);
}

#[test]
fn test_inflate_truncated_input() {
  let plain = rand_corpus_entry();
  let packed = compress_to_vec_zlib(&plain, 6);
  // the last 4 bytes are the checksum, which isn't read by default.
  for cut in [2, 3, packed.len() / 2, packed.len().saturating_sub(5)] {
    if cut >= packed.len() - 4 || plain.is_empty() {
      continue;
    }
    let result = inflate(&packed[..cut], plain.len());
    assert!(
      matches!(result, Err(DecodeError::OutOfData) | Err(DecodeError::CorruptData)),
      "cut {cut}: {result:?}"
    );
  }
}

#[test]
fn test_inflate_random_bytes_no_panics() {
  let mut out = vec![0_u8; 1 << 16];
  for _ in 0..200 {
    let mut v = super::rand_bytes(512);
    // a valid header, so the block decoder actually gets exercised.
    v[0] = 0x78;
    v[1] = 0x9C;
    let _ = inflate_to_slice(&v, &mut out);
  }
}
