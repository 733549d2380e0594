//! Account service: signup and login.
//!
//! Signup generates the account's signing key, funds and registers it on the
//! ledger, then seals it under the user's password before anything is
//! written to the store. Login never opens the envelope; it checks the
//! password verifier and hands the envelope to the client.

use std::sync::Arc;

use tracing::{info, warn};
use zeroize::Zeroizing;

use lm_crypto::channel::CHANNEL_SEPARATOR;
use lm_crypto::{custody, Address, SigningKey};
use lm_proto::api::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use lm_proto::message::MAX_NAME_CHARS;
use lm_store::{verifier, AccountStore, NewAccount};

use crate::error::NodeError;
use crate::ledger::Ledger;

/// Stipend paid to every new account before it registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Funding {
    pub sender: Address,
    pub amount_wei: u128,
}

pub struct Registrar<L: ?Sized> {
    store: AccountStore,
    ledger: Arc<L>,
    funding: Option<Funding>,
}

/// Usernames end up quoted inside every chat line and joined into channel
/// keys; a name holding the key separator could alias another pair's key.
fn check_username(username: &str) -> Result<(), NodeError> {
    let bad = username != username.trim()
        || username.chars().count() > MAX_NAME_CHARS
        || username.contains(CHANNEL_SEPARATOR)
        || username.contains('"')
        || username.chars().any(char::is_control);
    if bad {
        return Err(NodeError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

impl<L: Ledger + ?Sized> Registrar<L> {
    pub fn new(store: AccountStore, ledger: Arc<L>, funding: Option<Funding>) -> Self {
        Self { store, ledger, funding }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<SignupResponse, NodeError> {
        if req.username.is_empty() || req.password.is_empty() {
            return Err(NodeError::MissingCredentials);
        }
        check_username(&req.username)?;
        if self.store.find_by_username(&req.username).await?.is_some() {
            return Err(NodeError::UsernameTaken(req.username.clone()));
        }

        let key = SigningKey::generate();
        let address = key.address();

        if let Some(funding) = self.funding {
            self.ledger.fund(&funding.sender, &address, funding.amount_wei).await?;
        }
        self.ledger.register(&key, &req.username).await?;

        // PBKDF2 and Argon2 are both deliberately slow; keep them off the runtime.
        let password = Zeroizing::new(req.password.clone());
        let (envelope, password_hash) = tokio::task::spawn_blocking(move || {
            let envelope = custody::seal(key.to_hex().as_bytes(), &password);
            verifier::hash_password(&password).map(|hash| (envelope, hash))
        })
        .await
        .map_err(|e| NodeError::Internal(format!("signup worker: {e}")))??;

        self.store
            .create_account(&NewAccount {
                username: req.username.clone(),
                password_hash,
                address,
                envelope,
            })
            .await?;

        info!(username = %req.username, %address, "account created");
        Ok(SignupResponse { message: "User registered successfully!".to_string(), eth_address: address })
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, NodeError> {
        if req.username.is_empty() || req.password.is_empty() {
            return Err(NodeError::MissingCredentials);
        }
        let row = self
            .store
            .find_by_username(&req.username)
            .await?
            .ok_or_else(|| NodeError::UserNotFound(req.username.clone()))?;

        let password = Zeroizing::new(req.password.clone());
        let phc = row.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verifier::verify_password(&password, &phc))
            .await
            .map_err(|e| NodeError::Internal(format!("login worker: {e}")))??;
        if !matches {
            warn!(username = %req.username, "login rejected");
            return Err(NodeError::InvalidPassword);
        }

        info!(username = %row.username, "login accepted");
        Ok(LoginResponse {
            eth_address: row.address()?,
            encrypted_key: row.envelope()?,
            username: row.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_must_be_quotable() {
        assert!(check_username("alice").is_ok());
        assert!(check_username("\u{e9}mile_2").is_ok());
        let too_long = "n".repeat(MAX_NAME_CHARS + 1);
        for bad in ["al\"ice", " alice", "alice\n", "a\tb", "b_secret_c", "_secret_", too_long.as_str()] {
            assert!(matches!(check_username(bad), Err(NodeError::InvalidUsername(_))), "{bad:?}");
        }
    }
}
