//! Database row models: these map to/from SQL rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lm_crypto::{Address, KeyEnvelope};

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// `0x`-prefixed ledger address
    pub ledger_address: String,
    /// Sealed signing key, KeyEnvelope JSON
    pub encrypted_key: String,
    pub created_at: DateTime<Utc>,
}

impl AccountRow {
    pub fn address(&self) -> Result<Address, StoreError> {
        self.ledger_address.parse().map_err(|e: lm_crypto::CryptoError| {
            StoreError::CorruptRow { username: self.username.clone(), reason: e.to_string() }
        })
    }

    pub fn envelope(&self) -> Result<KeyEnvelope, StoreError> {
        KeyEnvelope::from_json(&self.encrypted_key).map_err(|e| StoreError::CorruptRow {
            username: self.username.clone(),
            reason: e.to_string(),
        })
    }
}

/// Input for [`crate::AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub address: Address,
    pub envelope: KeyEnvelope,
}
