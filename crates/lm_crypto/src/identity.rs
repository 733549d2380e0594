//! Ledger identity
//!
//! Each account owns one Ed25519 `SigningKey`, generated server-side at
//! signup and never stored in plaintext. The account's ledger `Address` is
//! derived from the verifying half:
//!
//!   address = "0x" || hex(SHA-256(verifying_key)[12..32])
//!
//! The address doubles as the only integrity check available after an
//! unseal: a key recovered with the wrong password derives a different
//! address (see `custody`).

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::VerifyingKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

pub const ADDRESS_LEN: usize = 20;
pub const SECRET_LEN: usize = 32;

// ── Address ──────────────────────────────────────────────────────────────────

/// 20-byte ledger address, `0x`-prefixed lowercase hex on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Returned by the registry for names that were never registered.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
        Self(out)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits.to_ascii_lowercase())?;
        let len = bytes.len();
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("Address must be {ADDRESS_LEN} bytes, got {len}"))
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Signing key ──────────────────────────────────────────────────────────────

/// Long-term account signing key. Drop clears memory via ZeroizeOnDrop.
#[derive(ZeroizeOnDrop)]
pub struct SigningKey {
    secret_bytes: [u8; SECRET_LEN],
}

impl SigningKey {
    pub fn generate() -> Self {
        let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        Self { secret_bytes: key.to_bytes() }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SECRET_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "Signing key must be {SECRET_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut secret_bytes = [0u8; SECRET_LEN];
        secret_bytes.copy_from_slice(bytes);
        Ok(Self { secret_bytes })
    }

    /// Parse the `0x`-prefixed hex form produced by [`SigningKey::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = Zeroizing::new(hex::decode(digits)?);
        Self::from_bytes(&bytes)
    }

    /// `0x` + 64 hex digits. This text is what gets sealed into a `KeyEnvelope`.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.secret_bytes)))
    }

    fn dalek(&self) -> ed25519_dalek::SigningKey {
        ed25519_dalek::SigningKey::from_bytes(&self.secret_bytes)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.dalek().verifying_key()
    }

    pub fn address(&self) -> Address {
        Address::from_verifying_key(&self.verifying_key())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("address", &self.address()).finish_non_exhaustive()
    }
}
