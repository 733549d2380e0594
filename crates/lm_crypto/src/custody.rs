//! Key-Custody Codec
//!
//! Seals an account's signing-key secret under the account password so the
//! server can store it without being able to use it. Only the client, which
//! knows the password, can unseal it.
//!
//! Scheme (fixed, see `kdf` for parameters):
//!   key        = PBKDF2-HMAC-SHA512(password, salt, 100 000 rounds, 32 bytes)
//!   ciphertext = AES-256-CTR(key, iv, secret)      (128-bit big-endian counter)
//!
//! Wire format (JSON, every field lowercase hex):
//!   { "salt": <16 bytes>, "iv": <16 bytes>, "encryptedData": <len(secret) bytes> }
//!
//! Authentication gap
//! ------------------
//! CTR mode carries no tag. Unsealing with the wrong password does NOT fail:
//! it yields garbage of the same length. Callers must validate the result
//! downstream (e.g. the derived ledger address must match the account's)
//! before trusting it. Adding a tag would change the wire format and needs a
//! new envelope version.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf::{custody_key, generate_iv, generate_salt, IV_LEN, SALT_LEN};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// A signing-key secret sealed under a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEnvelope {
    /// Hex-encoded 16-byte PBKDF2 salt.
    pub salt: String,
    /// Hex-encoded 16-byte CTR initial counter block.
    pub iv: String,
    /// Hex-encoded ciphertext, same length as the sealed secret.
    #[serde(rename = "encryptedData", alias = "ciphertext")]
    pub encrypted_data: String,
}

impl KeyEnvelope {
    pub fn salt_bytes(&self) -> Result<[u8; SALT_LEN], CryptoError> {
        fixed_hex(&self.salt, "salt")
    }

    pub fn iv_bytes(&self) -> Result<[u8; IV_LEN], CryptoError> {
        fixed_hex(&self.iv, "iv")
    }

    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        hex::decode(&self.encrypted_data)
            .map_err(|e| CryptoError::InvalidEnvelope(format!("encryptedData: {e}")))
    }

    pub fn to_json(&self) -> Result<String, CryptoError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(s).map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))
    }
}

fn fixed_hex<const N: usize>(field: &str, name: &str) -> Result<[u8; N], CryptoError> {
    let bytes =
        hex::decode(field).map_err(|e| CryptoError::InvalidEnvelope(format!("{name}: {e}")))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CryptoError::InvalidEnvelope(format!("{name} must be {N} bytes, got {len}"))
    })
}

/// Seal `secret` under `password` with a fresh random salt and IV.
pub fn seal(secret: &[u8], password: &str) -> KeyEnvelope {
    seal_with(secret, password, &generate_salt(), &generate_iv())
}

/// Seal with caller-chosen salt and IV. Only for reproducing fixed vectors;
/// production sealing must go through [`seal`].
pub fn seal_with(
    secret: &[u8],
    password: &str,
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
) -> KeyEnvelope {
    let key = custody_key(password.as_bytes(), salt);
    let mut buf = Zeroizing::new(secret.to_vec());
    Aes256Ctr::new(&key.0.into(), &(*iv).into()).apply_keystream(&mut buf);

    KeyEnvelope {
        salt: hex::encode(salt),
        iv: hex::encode(iv),
        encrypted_data: hex::encode(buf.as_slice()),
    }
}

/// Unseal an envelope. Only structural problems are errors; a wrong password
/// produces wrong bytes of the right length (see module docs).
pub fn unseal(envelope: &KeyEnvelope, password: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let salt = envelope.salt_bytes()?;
    let iv = envelope.iv_bytes()?;
    let mut buf = Zeroizing::new(envelope.ciphertext_bytes()?);

    let key = custody_key(password.as_bytes(), &salt);
    Aes256Ctr::new(&key.0.into(), &iv.into()).apply_keystream(&mut buf);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_salt() -> [u8; 16] {
        [0x00, 0x11].repeat(8).try_into().unwrap()
    }

    fn fixed_iv() -> [u8; 16] {
        [0x22, 0x33].repeat(8).try_into().unwrap()
    }

    #[test]
    fn reference_vector() {
        let env = seal_with(b"0xabc123secretkey", "correct-horse", &fixed_salt(), &fixed_iv());
        assert_eq!(env.salt, "00110011001100110011001100110011");
        assert_eq!(env.iv, "22332233223322332233223322332233");
        assert_eq!(env.encrypted_data, "32511325cd834b5ef80f979c7f4203a276");

        let opened = unseal(&env, "correct-horse").unwrap();
        assert_eq!(opened.as_slice(), b"0xabc123secretkey");
    }

    #[test]
    fn wrong_password_yields_same_length_garbage() {
        let env = seal_with(b"0xabc123secretkey", "correct-horse", &fixed_salt(), &fixed_iv());
        let opened = unseal(&env, "wrong-password").unwrap();
        assert_eq!(opened.len(), 17);
        assert_ne!(opened.as_slice(), b"0xabc123secretkey");
        assert_eq!(hex::encode(opened.as_slice()), "67753ca9a9544015c0975da16d262ac5b0");
    }

    #[test]
    fn seal_uses_fresh_salt_and_iv() {
        let a = seal(b"secret", "pw");
        let b = seal(b"secret", "pw");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_eq!(a.salt.len(), 32);
        assert_eq!(a.iv.len(), 32);
        assert_eq!(a.encrypted_data.len(), 12);
    }

    #[test]
    fn malformed_envelopes_are_rejected() {
        let good = seal_with(b"k", "pw", &fixed_salt(), &fixed_iv());

        let short_salt = KeyEnvelope { salt: "0011".into(), ..good.clone() };
        assert!(matches!(unseal(&short_salt, "pw"), Err(CryptoError::InvalidEnvelope(_))));

        let bad_iv = KeyEnvelope { iv: "zz".repeat(16), ..good.clone() };
        assert!(matches!(unseal(&bad_iv, "pw"), Err(CryptoError::InvalidEnvelope(_))));

        let odd_ct = KeyEnvelope { encrypted_data: "abc".into(), ..good };
        assert!(matches!(unseal(&odd_ct, "pw"), Err(CryptoError::InvalidEnvelope(_))));
    }

    #[test]
    fn json_field_names() {
        let env = seal_with(b"k", "pw", &fixed_salt(), &fixed_iv());
        let value: serde_json::Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();
        assert!(value.get("salt").is_some());
        assert!(value.get("iv").is_some());
        assert!(value.get("encryptedData").is_some());

        let aliased = format!(
            r#"{{"salt":"{}","iv":"{}","ciphertext":"{}"}}"#,
            env.salt, env.iv, env.encrypted_data
        );
        assert_eq!(KeyEnvelope::from_json(&aliased).unwrap(), env);
    }
}
