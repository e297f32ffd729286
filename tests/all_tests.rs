#![allow(bad_style)]

mod inflate;
mod png;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

fn rand_u32() -> u32 {
  let mut buffer = [0; 4];
  getrandom::getrandom(&mut buffer).unwrap();
  u32::from_le_bytes(buffer)
}
