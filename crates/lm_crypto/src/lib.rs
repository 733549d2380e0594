//! lm_crypto: Ledger Messenger cryptographic codecs
//!
//! # Design principles
//! - NO custom primitives; PBKDF2, AES, MD5 and Ed25519 come from RustCrypto / dalek.
//! - Zeroize all secret material on drop.
//! - Wire formats are frozen: they must stay readable by clients already in the field.
//!
//! # Module layout
//! - `kdf`: PBKDF2-HMAC-SHA512 custody key derivation, salt/IV generation
//! - `custody`: Key-Custody Codec: seal/unseal a signing key under a password
//! - `channel`: Channel Codec: pairwise channel key + passphrase message cipher
//! - `identity`: Ed25519 signing key and the ledger address derived from it
//! - `error`: unified error type

pub mod channel;
pub mod custody;
pub mod error;
pub mod identity;
pub mod kdf;

pub use channel::ChannelKey;
pub use custody::KeyEnvelope;
pub use error::CryptoError;
pub use identity::{Address, SigningKey};
