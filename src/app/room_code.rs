use rand::Rng;

pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LENGTH: usize = 6;

pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
  (0..ROOM_CODE_LENGTH)
    .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
    .collect()
}

/// Uppercases and trims user input. Returns `None` unless the result has the
/// room-code length and only alphanumeric characters.
pub fn normalize_room_code(value: &str) -> Option<String> {
  let code = value.trim().to_ascii_uppercase();
  if code.len() != ROOM_CODE_LENGTH || !code.chars().all(|ch| ch.is_ascii_alphanumeric()) {
    return None;
  }
  Some(code)
}
