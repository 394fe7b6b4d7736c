//! Fixed-length random identifiers

use rand::Rng;

/// Length of every generated identifier
pub const IDENTIFIER_LEN: usize = 26;

/// Characters identifiers are drawn from
pub const IDENTIFIER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate one identifier of [`IDENTIFIER_LEN`] characters
///
/// 36^26 possible values make collisions negligible; they are not
/// deduplicated.
pub fn generate_identifier<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut id = String::with_capacity(IDENTIFIER_LEN);
    for _ in 0..IDENTIFIER_LEN {
        let idx = rng.gen_range(0..IDENTIFIER_ALPHABET.len());
        id.push(IDENTIFIER_ALPHABET[idx] as char);
    }
    id
}
