//! Key derivation functions
//!
//! `custody_key`: PBKDF2-HMAC-SHA512, derives the 32-byte AES key that seals
//!   an account's signing key at rest.
//!
//! The round count, hash and output length are part of the envelope format:
//! an envelope sealed with one set of parameters cannot be opened with another.

use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use zeroize::ZeroizeOnDrop;

/// PBKDF2 iteration count. The only brake on offline guessing of a captured envelope.
pub const PBKDF2_ROUNDS: u32 = 100_000;
pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// 32-byte custody key derived from a password. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct CustodyKey(pub [u8; KEY_LEN]);

/// Derive the custody key from a password + 16-byte salt.
pub fn custody_key(password: &[u8], salt: &[u8; SALT_LEN]) -> CustodyKey {
    let mut output = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, PBKDF2_ROUNDS, &mut output);
    CustodyKey(output)
}

/// Fresh random salt; one per seal, never reused.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Fresh random CTR initial counter block.
pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custody_key_matches_reference() {
        let salt: [u8; 16] = hex::decode("00110011001100110011001100110011")
            .unwrap()
            .try_into()
            .unwrap();
        let key = custody_key(b"correct-horse", &salt);
        assert_eq!(
            hex::encode(key.0),
            "af6e699873e263884a58a1b8f863149cb2f983364c98446a0e86762341ac6ace"
        );
    }

    #[test]
    fn salts_and_ivs_are_not_repeated() {
        assert_ne!(generate_salt(), generate_salt());
        assert_ne!(generate_iv(), generate_iv());
    }
}
