//! Message records as held by the ledger.
//!
//! The ledger sees only:
//!   - the two participant addresses (routing; cannot be avoided)
//!   - the block timestamp
//!   - the channel ciphertext (opaque string)
//!
//! It cannot see usernames, bodies or the chat line timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lm_crypto::Address;

/// One entry of `getMyMessages`, seen from the caller's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    /// Channel ciphertext (see `lm_crypto::channel`).
    pub encrypted_content: String,
    /// Ledger timestamp, unix seconds.
    pub timestamp: u64,
    /// The participant that is not the caller.
    pub other_party: Address,
}

impl StoredMessage {
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}
