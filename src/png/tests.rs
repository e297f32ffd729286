use super::*;
use crate::decompress::adler32;
use alloc::{vec, vec::Vec};

fn push_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
  png.extend_from_slice(&(data.len() as u32).to_be_bytes());
  png.extend_from_slice(chunk_type);
  png.extend_from_slice(data);
  let mut crc = Crc32::new();
  crc.update(chunk_type);
  crc.update(data);
  png.extend_from_slice(&crc.finish().to_be_bytes());
}

/// zlib data with a single stored block.
fn zlib_stored(data: &[u8]) -> Vec<u8> {
  let len = data.len() as u16;
  let mut out = vec![0x78, 0x01, 0b001];
  out.extend_from_slice(&len.to_le_bytes());
  out.extend_from_slice(&(!len).to_le_bytes());
  out.extend_from_slice(data);
  out.extend_from_slice(&adler32(data).to_be_bytes());
  out
}

fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> [u8; 13] {
  let [w0, w1, w2, w3] = width.to_be_bytes();
  let [h0, h1, h2, h3] = height.to_be_bytes();
  [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, 0, 0, 0]
}

fn simple_png(ihdr: [u8; 13], filtered: &[u8]) -> Vec<u8> {
  let mut png = PNG_SIGNATURE.to_vec();
  push_chunk(&mut png, b"IHDR", &ihdr);
  push_chunk(&mut png, b"IDAT", &zlib_stored(filtered));
  push_chunk(&mut png, b"IEND", &[]);
  png
}

const fn descriptor(
  width: u32, height: u32, bit_depth: u8, color_type: ColorType,
) -> ImageDescriptor {
  ImageDescriptor { width, height, bit_depth, color_type, is_interlaced: false }
}

#[test]
fn test_reconstruct_2x2_rgb_up_filter() {
  let d = descriptor(2, 2, 8, ColorType::RGB);
  #[rustfmt::skip]
  let mut buf = [
    0, 10, 20, 30, 40, 50, 60,
    2, 1, 2, 3, 4, 5, 6,
    0, 0,
  ];
  #[rustfmt::skip]
  let expected = [
    10, 20, 30, 255, 40, 50, 60, 255,
    11, 22, 33, 255, 44, 55, 66, 255,
  ];
  assert_eq!(reconstruct_in_place(&mut buf, &d), Ok(16));
  assert_eq!(buf, expected);
}

#[test]
fn test_reconstruct_rejects_filter_5() {
  let d = descriptor(1, 1, 8, ColorType::RGBA);
  let mut buf = [5, 1, 2, 3, 4];
  assert_eq!(reconstruct_in_place(&mut buf, &d), Err(DecodeError::CorruptData));
}

#[test]
fn test_reconstruct_unsupported_writes_nothing() {
  for color_type in [ColorType::Y, ColorType::Index, ColorType::YA] {
    let d = descriptor(2, 2, 8, color_type);
    let mut buf = [0xAA_u8; 64];
    assert_eq!(reconstruct_in_place(&mut buf, &d), Err(DecodeError::NotImplemented));
    assert!(buf.iter().all(|&b| b == 0xAA));
  }
  let laced = ImageDescriptor { is_interlaced: true, ..descriptor(2, 2, 8, ColorType::RGBA) };
  let mut buf = [0xAA_u8; 64];
  assert_eq!(reconstruct_in_place(&mut buf, &laced), Err(DecodeError::NotImplemented));
  assert!(buf.iter().all(|&b| b == 0xAA));
}

#[test]
fn test_reconstruct_buffer_too_small() {
  let d = descriptor(2, 2, 8, ColorType::RGB);
  // enough for the filtered data, but not the RGBA output.
  let mut buf = [0_u8; 15];
  assert_eq!(reconstruct_in_place(&mut buf, &d), Err(DecodeError::BufferTooSmall));
  assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn test_reconstruct_16_bit_keeps_high_byte() {
  let d = descriptor(1, 1, 16, ColorType::RGB);
  let mut buf = [0, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
  assert_eq!(reconstruct_in_place(&mut buf, &d), Ok(4));
  assert_eq!(&buf[..4], &[0x12, 0x56, 0x9A, 255]);

  // Sub reaches back a whole 8 byte pixel.
  let d = descriptor(2, 1, 16, ColorType::RGBA);
  let mut buf = [1, 1, 0, 2, 0, 3, 0, 4, 0, 1, 1, 1, 1, 1, 1, 1, 1];
  assert_eq!(reconstruct_in_place(&mut buf, &d), Ok(8));
  assert_eq!(&buf[..8], &[1, 2, 3, 4, 2, 3, 4, 5]);
}

#[test]
fn test_reconstruct_vec() {
  let d = descriptor(1, 2, 8, ColorType::RGB);
  let image = reconstruct(vec![0, 1, 2, 3, 1, 4, 5, 6], &d).unwrap();
  assert_eq!(image.pixels, [1, 2, 3, 255, 4, 5, 6, 255]);
  assert_eq!(reconstruct(vec![0, 1, 2, 3], &d), Err(DecodeError::OutOfData));
}

#[test]
fn test_load_simple_png() {
  let png = simple_png(ihdr(1, 2, 8, 6), &[0, 1, 2, 3, 4, 1, 5, 6, 7, 8]);
  let image = crate::load(&png).unwrap();
  assert_eq!((image.width, image.height), (1, 2));
  assert_eq!(image.pixels, [1, 2, 3, 4, 5, 6, 7, 8]);

  let strict = DecodeOptions { verify_adler32: true, ..DecodeOptions::default() };
  assert_eq!(crate::load_with(&png, &strict), Ok(image));
}

#[test]
fn test_parse_header_order() {
  let options = DecodeOptions::default();
  assert_eq!(parse_header(b"not a png", &options), Err(DecodeError::UnknownFormat));
  assert_eq!(parse_header(&PNG_SIGNATURE, &options), Err(DecodeError::OutOfData));

  let mut not_ihdr = PNG_SIGNATURE.to_vec();
  push_chunk(&mut not_ihdr, b"IDAT", &ihdr(1, 1, 8, 6));
  assert_eq!(parse_header(&not_ihdr, &options), Err(DecodeError::CorruptData));

  let big = simple_png(ihdr(17_001, 1, 8, 6), &[]);
  assert_eq!(parse_header(&big, &options), Err(DecodeError::DimensionsTooLarge));
  let tiny_limit = DecodeOptions { max_dimension: 8, ..options };
  let nine = simple_png(ihdr(1, 9, 8, 6), &[]);
  assert_eq!(parse_header(&nine, &tiny_limit), Err(DecodeError::DimensionsTooLarge));

  // the size check comes before the support check.
  let big_grey = simple_png(ihdr(17_001, 1, 8, 0), &[]);
  assert_eq!(parse_header(&big_grey, &options), Err(DecodeError::DimensionsTooLarge));
  let grey = simple_png(ihdr(1, 1, 8, 0), &[0, 0]);
  assert_eq!(parse_header(&grey, &options), Err(DecodeError::NotImplemented));
  assert_eq!(crate::load(&grey), Err(DecodeError::NotImplemented));

  let mut bad_crc = simple_png(ihdr(1, 1, 8, 6), &[0, 0, 0, 0, 0]);
  bad_crc[8 + 8 + 13] ^= 0xFF;
  assert_eq!(parse_header(&bad_crc, &options), Err(DecodeError::CorruptData));
  let lax = DecodeOptions { verify_crc: false, ..options };
  assert!(parse_header(&bad_crc, &lax).is_ok());
  assert!(crate::load_with(&bad_crc, &lax).is_ok());
}

#[test]
fn test_walk_chunks_rules() {
  let filtered = [0, 9, 8, 7, 6];
  let zlib = zlib_stored(&filtered);
  let (first, second) = zlib.split_at(4);

  let mut png = PNG_SIGNATURE.to_vec();
  push_chunk(&mut png, b"IHDR", &ihdr(1, 1, 8, 6));
  push_chunk(&mut png, b"tEXt", b"Comment\0hello");
  push_chunk(&mut png, b"PLTE", &[0, 0, 0]);
  push_chunk(&mut png, b"IDAT", first);
  let crc_at = png.len() + 8;
  push_chunk(&mut png, b"zzZz", &[1, 2, 3]);
  png[crc_at + 3] ^= 1;
  push_chunk(&mut png, b"IDAT", second);
  let with_iend_len = png.len() + 12;
  push_chunk(&mut png, b"IEND", &[]);
  assert_eq!(png.len(), with_iend_len);

  let options = DecodeOptions::default();
  let mut pieces = 0;
  walk_chunks(&png, &options, |_| {
    pieces += 1;
    Ok(())
  })
  .unwrap();
  assert_eq!(pieces, 2);

  let mut joined = [0_u8; 64];
  let n = gather_idat(&png, &options, &mut joined).unwrap();
  assert_eq!(&joined[..n], &zlib[..]);
  assert_eq!(gather_idat(&png, &options, &mut [0_u8; 5]), Err(DecodeError::BufferTooSmall));
  assert_eq!(crate::load(&png).unwrap().pixels, [9, 8, 7, 6]);

  // without IEND it still decodes.
  let no_iend = &png[..png.len() - 12];
  assert_eq!(crate::load(no_iend).unwrap().pixels, [9, 8, 7, 6]);

  // data after IEND is never looked at.
  let mut trailing = png.clone();
  push_chunk(&mut trailing, b"QUUX", &[]);
  assert!(crate::load(&trailing).is_ok());

  // an unknown critical chunk before IEND.
  let mut unknown = png[..png.len() - 12].to_vec();
  push_chunk(&mut unknown, b"QUUX", &[]);
  assert_eq!(crate::load(&unknown), Err(DecodeError::CorruptData));
}

#[test]
fn test_bad_idat_crc() {
  let mut png = simple_png(ihdr(1, 1, 8, 6), &[0, 1, 2, 3, 4]);
  let idat_crc = 8 + 25 + 8 + zlib_stored(&[0; 5]).len();
  png[idat_crc] ^= 0xFF;
  assert_eq!(crate::load(&png), Err(DecodeError::CorruptData));
  let lax = DecodeOptions { verify_crc: false, ..DecodeOptions::default() };
  assert_eq!(crate::load_with(&png, &lax).unwrap().pixels, [1, 2, 3, 4]);
}

#[test]
fn test_zlib_data_too_short() {
  // two rows declared, one row given.
  let png = simple_png(ihdr(1, 2, 8, 6), &[0, 1, 2, 3, 4]);
  assert_eq!(crate::load(&png), Err(DecodeError::OutOfData));
}

#[test]
fn test_decode_idat_to_slice_without_alloc_types() {
  let png = simple_png(ihdr(2, 1, 8, 2), &[1, 1, 2, 3, 1, 1, 1]);
  let options = DecodeOptions::default();
  let d = parse_header(&png, &options).unwrap();
  let mut idat = [0_u8; 64];
  let idat_len = gather_idat(&png, &options, &mut idat).unwrap();
  let mut out = [0_u8; 8];
  assert_eq!(decode_idat_to_slice(&idat[..idat_len], &d, &options, &mut out), Ok(8));
  assert_eq!(out, [1, 2, 3, 255, 2, 3, 4, 255]);
  let mut small = [0_u8; 7];
  assert_eq!(
    decode_idat_to_slice(&idat[..idat_len], &d, &options, &mut small),
    Err(DecodeError::BufferTooSmall)
  );
}
