use miniz_oxide::deflate::compress_to_vec_zlib;
use starlight::{
  load, load_with,
  png::{crc32, is_png_signature, parse_header, Crc32, RawChunkIter, PNG_SIGNATURE},
  ColorType, DecodeError, DecodeOptions, ImageCodec, ImageFormat,
};
use walkdir::WalkDir;

fn push_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
  png.extend_from_slice(&(data.len() as u32).to_be_bytes());
  png.extend_from_slice(chunk_type);
  png.extend_from_slice(data);
  let mut crc = Crc32::new();
  crc.update(chunk_type);
  crc.update(data);
  png.extend_from_slice(&crc.finish().to_be_bytes());
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
  let (a_, b_, c_) = (i32::from(a), i32::from(b), i32::from(c));
  let p = a_ + b_ - c_;
  let (pa, pb, pc) = ((p - a_).abs(), (p - b_).abs(), (p - c_).abs());
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Filters the raw rows, using filter type `y % 5` for row `y`.
fn filter_rows(raw: &[u8], stride: usize, bpp: usize) -> Vec<u8> {
  let mut out = Vec::new();
  let zero_row = vec![0_u8; stride];
  for (y, row) in raw.chunks_exact(stride).enumerate() {
    let up_row = if y == 0 { &zero_row[..] } else { &raw[(y - 1) * stride..y * stride] };
    let filter = (y % 5) as u8;
    out.push(filter);
    for x in 0..stride {
      let a = if x >= bpp { row[x - bpp] } else { 0 };
      let b = up_row[x];
      let c = if x >= bpp { up_row[x - bpp] } else { 0 };
      let predicted = match filter {
        0 => 0,
        1 => a,
        2 => b,
        3 => ((u16::from(a) + u16::from(b)) / 2) as u8,
        _ => paeth(a, b, c),
      };
      out.push(row[x].wrapping_sub(predicted));
    }
  }
  out
}

/// Encodes random pixels, giving the PNG bytes and the RGBA8 we expect back.
fn rand_png(
  width: u32, height: u32, bit_depth: u8, color_type: ColorType,
) -> (Vec<u8>, Vec<u8>) {
  let channels = color_type.channel_count();
  let bytes_per_sample = usize::from(bit_depth / 8);
  let bpp = channels * bytes_per_sample;
  let stride = width as usize * bpp;
  let raw = super::rand_bytes(stride * height as usize);

  let mut expected = Vec::new();
  for pixel in raw.chunks_exact(bpp) {
    for sample in pixel.chunks_exact(bytes_per_sample) {
      expected.push(sample[0]);
    }
    if channels == 3 {
      expected.push(255);
    }
  }

  let mut ihdr = Vec::new();
  ihdr.extend_from_slice(&width.to_be_bytes());
  ihdr.extend_from_slice(&height.to_be_bytes());
  ihdr.extend_from_slice(&[bit_depth, color_type as u8, 0, 0, 0]);
  let zlib = compress_to_vec_zlib(&filter_rows(&raw, stride, bpp), 6);

  let mut png = PNG_SIGNATURE.to_vec();
  push_chunk(&mut png, b"IHDR", &ihdr);
  push_chunk(&mut png, b"gAMA", &45455_u32.to_be_bytes());
  // split the image data over several chunks
  for part in zlib.chunks(100) {
    push_chunk(&mut png, b"IDAT", part);
  }
  push_chunk(&mut png, b"IEND", &[]);
  (png, expected)
}

#[test]
fn test_decode_all_supported_formats() {
  for color_type in [ColorType::RGB, ColorType::RGBA] {
    for bit_depth in [8, 16] {
      for (width, height) in [(1, 1), (1, 7), (5, 5), (17, 11), (64, 3)] {
        let (png, expected) = rand_png(width, height, bit_depth, color_type);
        let image = load(&png).unwrap();
        assert_eq!((image.width, image.height), (width, height));
        assert!(
          image.pixels == expected,
          "{color_type:?} {bit_depth} bit, {width}x{height}"
        );
        assert_eq!(image.as_rgba8888().len(), (width * height) as usize);

        let strict = DecodeOptions { verify_adler32: true, ..DecodeOptions::default() };
        assert_eq!(load_with(&png, &strict).unwrap(), image);
      }
    }
  }
}

#[test]
fn test_format_dispatch() {
  let (png, _) = rand_png(2, 2, 8, ColorType::RGBA);
  assert!(is_png_signature(&png));
  assert_eq!(ImageFormat::detect(&png), Some(ImageFormat::Png));
  assert_eq!(ImageFormat::detect(b"BM\0\0\0\0"), None);
  let codec = ImageFormat::Png.codec();
  assert!(codec.detect(&png));
  let options = DecodeOptions::default();
  let header = codec.parse_header(&png, &options).unwrap();
  assert_eq!(header, parse_header(&png, &options).unwrap());
  assert_eq!(codec.decode_body(&png, &header, &options), load(&png));
}

#[test]
fn test_truncated_png_errors() {
  let (png, _) = rand_png(20, 20, 8, ColorType::RGB);
  for cut in [7, 8, 20, 33, png.len() / 2, png.len() - 120] {
    assert!(load(&png[..cut]).is_err(), "cut at {cut}");
  }
  assert_eq!(load(&png[..4]), Err(DecodeError::UnknownFormat));
}

#[test]
fn test_crc32_matches_chunks() {
  let (png, _) = rand_png(3, 3, 8, ColorType::RGBA);
  for chunk in RawChunkIter::new(&png) {
    assert!(chunk.crc_matches(), "{chunk:?}");
    let mut typed = chunk.chunk_type().0.to_vec();
    typed.extend_from_slice(chunk.data());
    assert_eq!(crc32(&typed), chunk.declared_crc());
  }
}

#[test]
fn test_RawChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in RawChunkIter::new(&v) {
      //
    }
    let _ = load(&v);
  }
  // even totally random data should never panic the iterator!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for _ in RawChunkIter::new(&v) {
      //
    }
  }
}

#[test]
fn test_random_png_bodies_no_panics() {
  let (png, _) = rand_png(8, 8, 8, ColorType::RGBA);
  let lax = DecodeOptions { verify_crc: false, ..DecodeOptions::default() };
  for _ in 0..200 {
    let mut v = png.clone();
    // flip some bytes after the IHDR chunk.
    let noise = super::rand_bytes(8);
    for pair in noise.chunks_exact(2) {
      let i = 33 + usize::from(pair[0]) % (v.len() - 33);
      v[i] ^= pair[1];
    }
    let _ = load_with(&v, &lax);
  }
  for _ in 0..50 {
    let mut v = PNG_SIGNATURE.to_vec();
    v.extend(super::rand_bytes(256));
    let _ = load(&v);
  }
}
