//! The ledger collaborator.
//!
//! The messenger needs five things from its ledger: a stipend transfer at
//! signup, a username registry, name lookup, an append-only message log and
//! a per-caller view of that log. `Ledger` captures exactly those; the
//! contract client for a real chain implements it out of tree.
//!
//! `MemoryLedger` is the in-process implementation used by the CLI and the
//! tests. With a snapshot path it persists its whole state as JSON after
//! every write, so separate CLI invocations see the same ledger.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use lm_crypto::{Address, SigningKey};
use lm_proto::StoredMessage;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Name already registered: {0}")]
    NameTaken(String),

    #[error("Address {0} is already registered")]
    AlreadyRegistered(Address),

    #[error("Address {0} has no registered name")]
    NotRegistered(Address),

    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger snapshot error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Transfer `amount_wei` from `from` to `to`.
    async fn fund(&self, from: &Address, to: &Address, amount_wei: u128)
        -> Result<(), LedgerError>;

    /// Bind `username` to the signer's address. Both must be unused.
    async fn register(&self, signer: &SigningKey, username: &str) -> Result<(), LedgerError>;

    /// `None` for names that were never registered.
    async fn address_of(&self, username: &str) -> Result<Option<Address>, LedgerError>;

    /// Append a ciphertext from the signer to `receiver`.
    async fn send_message(
        &self,
        signer: &SigningKey,
        receiver: &Address,
        ciphertext: &str,
    ) -> Result<(), LedgerError>;

    /// Every message sent or received by `caller`, in ledger order.
    async fn my_messages(&self, caller: &Address) -> Result<Vec<StoredMessage>, LedgerError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerRecord {
    sender: Address,
    receiver: Address,
    encrypted_content: String,
    timestamp: u64,
}

impl LedgerRecord {
    fn seen_by(&self, caller: &Address) -> Option<StoredMessage> {
        let other_party = if self.sender == *caller {
            self.receiver
        } else if self.receiver == *caller {
            self.sender
        } else {
            return None;
        };
        Some(StoredMessage {
            encrypted_content: self.encrypted_content.clone(),
            timestamp: self.timestamp,
            other_party,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    names: BTreeMap<String, Address>,
    balances: BTreeMap<Address, u128>,
    messages: Vec<LedgerRecord>,
}

impl LedgerState {
    fn name_of(&self, address: &Address) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, a)| *a == address)
            .map(|(name, _)| name.as_str())
    }
}

pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    snapshot: Option<PathBuf>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    /// Volatile ledger; state is lost on drop.
    pub fn new() -> Self {
        Self { state: RwLock::new(LedgerState::default()), snapshot: None }
    }

    /// Ledger backed by a JSON snapshot at `path`, loaded if it exists.
    pub async fn open(path: &Path) -> Result<Self, LedgerError> {
        let state = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), "ledger snapshot loaded");
        Ok(Self { state: RwLock::new(state), snapshot: Some(path.to_path_buf()) })
    }

    pub async fn balance_of(&self, address: &Address) -> u128 {
        self.state.read().await.balances.get(address).copied().unwrap_or(0)
    }

    /// Apply `change` to a copy of the state, persist the copy, and only
    /// then make it current. A failed check or a failed write leaves the
    /// ledger exactly as it was.
    async fn commit<F>(&self, change: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut LedgerState) -> Result<(), LedgerError> + Send,
    {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        change(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    async fn persist(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn fund(
        &self,
        from: &Address,
        to: &Address,
        amount_wei: u128,
    ) -> Result<(), LedgerError> {
        self.commit(|state| {
            let balance = state.balances.entry(*to).or_insert(0);
            *balance = balance.saturating_add(amount_wei);
            Ok(())
        })
        .await?;
        debug!(%from, %to, amount_wei = %amount_wei, "stipend transferred");
        Ok(())
    }

    async fn register(&self, signer: &SigningKey, username: &str) -> Result<(), LedgerError> {
        let address = signer.address();
        self.commit(|state| {
            if state.names.contains_key(username) {
                return Err(LedgerError::NameTaken(username.to_string()));
            }
            if state.name_of(&address).is_some() {
                return Err(LedgerError::AlreadyRegistered(address));
            }
            state.names.insert(username.to_string(), address);
            Ok(())
        })
        .await?;
        info!(username, %address, "name registered");
        Ok(())
    }

    async fn address_of(&self, username: &str) -> Result<Option<Address>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.names.get(username).copied().filter(|a| !a.is_zero()))
    }

    async fn send_message(
        &self,
        signer: &SigningKey,
        receiver: &Address,
        ciphertext: &str,
    ) -> Result<(), LedgerError> {
        let sender = signer.address();
        let timestamp = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        self.commit(|state| {
            if state.name_of(&sender).is_none() {
                return Err(LedgerError::NotRegistered(sender));
            }
            if state.name_of(receiver).is_none() {
                return Err(LedgerError::NotRegistered(*receiver));
            }
            state.messages.push(LedgerRecord {
                sender,
                receiver: *receiver,
                encrypted_content: ciphertext.to_string(),
                timestamp,
            });
            Ok(())
        })
        .await?;
        debug!(%sender, %receiver, bytes = ciphertext.len(), "message appended");
        Ok(())
    }

    async fn my_messages(&self, caller: &Address) -> Result<Vec<StoredMessage>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.messages.iter().filter_map(|r| r.seen_by(caller)).collect())
    }
}
