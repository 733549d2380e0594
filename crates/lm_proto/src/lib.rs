//! lm_proto: Wire types and text formats for Ledger Messenger
//!
//! # Modules
//! - `message`: Plaintext chat line grammar (inside the channel ciphertext)
//! - `envelope`: Message records as the ledger returns them
//! - `api`: Signup/login request and response bodies

pub mod api;
pub mod envelope;
pub mod message;

pub use envelope::StoredMessage;
pub use message::{ChatLine, Direction, ProtoError};
