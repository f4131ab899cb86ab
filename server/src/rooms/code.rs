//! Room code generation.

use rand::Rng;

/// Length of a room code.
pub const CODE_LEN: usize = 8;

/// Characters a room code is drawn from.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random 8-character uppercase alphanumeric room code.
///
/// Collision handling is the caller's job (the registry retries until the
/// code is unused).
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of a client-supplied code: trimmed and uppercased.
/// Lookups are case-insensitive.
#[must_use]
pub fn canonicalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
