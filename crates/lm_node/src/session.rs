//! Client-side key session.
//!
//! A `Session` holds what login returned: the account address and the
//! sealed key. The signing key exists in plaintext only inside an
//! `UnlockedKey`, which is created by `unlock` and zeroized when dropped,
//! whichever way the caller's scope ends.

use tracing::{debug, warn};
use zeroize::Zeroizing;

use lm_crypto::{custody, Address, KeyEnvelope, SigningKey};
use lm_proto::api::LoginResponse;

use crate::error::NodeError;

#[derive(Debug, Clone)]
pub struct Session {
    username: String,
    address: Address,
    envelope: KeyEnvelope,
}

/// Signing key recovered from the envelope. Cleared on drop.
#[derive(Debug)]
pub struct UnlockedKey {
    key: SigningKey,
}

impl Session {
    pub fn from_login(res: LoginResponse) -> Self {
        Self { username: res.username, address: res.eth_address, envelope: res.encrypted_key }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Unseal the signing key. Unsealing itself cannot tell a wrong password
    /// from a right one, so the recovered key must derive this account's
    /// address or it is discarded.
    pub fn unlock(&self, password: &str) -> Result<UnlockedKey, NodeError> {
        let opened = custody::unseal(&self.envelope, password)?;
        let key = std::str::from_utf8(&opened)
            .ok()
            .and_then(|hex| SigningKey::from_hex(hex).ok())
            .filter(|key| key.address() == self.address);

        match key {
            Some(key) => {
                debug!(username = %self.username, "signing key unlocked");
                Ok(UnlockedKey { key })
            }
            None => {
                warn!(username = %self.username, "unsealed key does not match account address");
                Err(NodeError::WrongPassword)
            }
        }
    }
}

impl Session {
    /// [`Session::unlock`] on the blocking pool, for callers on the async
    /// runtime. PBKDF2 at 100 000 rounds must not stall a worker thread.
    pub async fn unlock_blocking(&self, password: &str) -> Result<UnlockedKey, NodeError> {
        let session = self.clone();
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || session.unlock(&password))
            .await
            .map_err(|e| NodeError::Internal(format!("unlock worker: {e}")))?
    }
}

impl UnlockedKey {
    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}
