//! Channel Codec
//!
//! Two participants reach the same channel key with no exchange at all:
//!
//!   key = join(sort([a, b]), "_secret_")
//!
//! and every chat line between them is sealed under that key with the
//! OpenSSL passphrase format (the one browser clients already write to the
//! ledger):
//!
//!   "Salted__" || salt (8) || AES-256-CBC/PKCS#7(key', iv', plaintext)
//!   (key', iv') = EVP_BytesToKey(MD5, passphrase, salt, 1 round)
//!
//! base64-encoded as a single string.
//!
//! Threat model limitation
//! -----------------------
//! The channel key is NOT a secret. Usernames are public through the ledger
//! registry and the derivation is fixed, so anyone who knows both names can
//! read the conversation. Confidentiality rests on obscurity of the formula
//! only. Changing the derivation would orphan every ciphertext already on the
//! ledger, so it stays as is; do not treat this module as a security boundary.

use std::fmt;

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const CHANNEL_SEPARATOR: &str = "_secret_";
const SALTED_MAGIC: &[u8; 8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const BLOCK_LEN: usize = 16;

/// Symmetric passphrase shared by exactly one unordered pair of usernames.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelKey(Zeroizing<String>);

impl ChannelKey {
    /// Order-independent: `derive(a, b) == derive(b, a)`.
    ///
    /// Names are ordered by UTF-16 code unit, as browser clients sort them.
    /// This differs from `str` ordering once one name has characters above
    /// U+FFFF and the other has characters in U+E000..=U+FFFF.
    pub fn derive(participant_a: &str, participant_b: &str) -> Self {
        let (first, second) = if participant_a.encode_utf16().le(participant_b.encode_utf16()) {
            (participant_a, participant_b)
        } else {
            (participant_b, participant_a)
        };
        Self(Zeroizing::new(format!("{first}{CHANNEL_SEPARATOR}{second}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChannelKey(..)")
    }
}

/// EVP_BytesToKey with MD5 and a single round: D_i = MD5(D_{i-1} || pass || salt).
fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN + BLOCK_LEN]> {
    let mut out = Zeroizing::new([0u8; KEY_LEN + BLOCK_LEN]);
    let mut filled = 0;
    let mut prev: Option<md5::digest::Output<Md5>> = None;
    while filled < out.len() {
        let mut h = Md5::new();
        if let Some(p) = prev.as_ref() {
            h.update(p);
        }
        h.update(passphrase);
        h.update(salt);
        let digest = h.finalize();
        let take = (out.len() - filled).min(digest.len());
        out[filled..filled + take].copy_from_slice(&digest[..take]);
        filled += take;
        prev = Some(digest);
    }
    out
}

/// Encrypt a chat line under the channel key with a fresh random salt.
pub fn encrypt(plaintext: &str, key: &ChannelKey) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    encrypt_with_salt(plaintext, key, &salt)
}

/// Deterministic variant of [`encrypt`] for fixed vectors.
pub fn encrypt_with_salt(plaintext: &str, key: &ChannelKey, salt: &[u8; SALT_LEN]) -> String {
    let material = evp_bytes_to_key(key.as_str().as_bytes(), salt);
    let (k, iv) = material.split_at(KEY_LEN);
    let ct = Aes256CbcEnc::new(k.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut blob = Vec::with_capacity(SALTED_MAGIC.len() + SALT_LEN + ct.len());
    blob.extend_from_slice(SALTED_MAGIC);
    blob.extend_from_slice(salt);
    blob.extend_from_slice(&ct);
    STANDARD.encode(blob)
}

/// Decrypt a channel ciphertext.
///
/// Every failure collapses to [`CryptoError::ChannelDecrypt`]: to a caller
/// scanning a mailbox, "wrong key" and "garbage" mean the same thing.
pub fn decrypt(ciphertext: &str, key: &ChannelKey) -> Result<String, CryptoError> {
    let blob = STANDARD
        .decode(ciphertext.trim())
        .map_err(|_| CryptoError::ChannelDecrypt)?;
    let header = SALTED_MAGIC.len() + SALT_LEN;
    if blob.len() < header + BLOCK_LEN
        || (blob.len() - header) % BLOCK_LEN != 0
        || &blob[..SALTED_MAGIC.len()] != SALTED_MAGIC
    {
        return Err(CryptoError::ChannelDecrypt);
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&blob[SALTED_MAGIC.len()..header]);
    let material = evp_bytes_to_key(key.as_str().as_bytes(), &salt);
    let (k, iv) = material.split_at(KEY_LEN);

    let pt = Aes256CbcDec::new(k.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&blob[header..])
        .map_err(|_| CryptoError::ChannelDecrypt)?;
    let text = String::from_utf8(pt).map_err(|_| CryptoError::ChannelDecrypt)?;
    if text.is_empty() {
        return Err(CryptoError::ChannelDecrypt);
    }
    Ok(text)
}
