use thiserror::Error;

use lm_crypto::CryptoError;
use lm_proto::ProtoError;
use lm_store::StoreError;

use crate::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid password")]
    InvalidPassword,

    /// The envelope opened but the result is not this account's key.
    #[error("Decryption failed. Wrong password?")]
    WrongPassword,

    #[error("Invalid recipient: {0:?}")]
    InvalidRecipient(String),

    #[error("Message rejected: {0}")]
    Message(#[from] ProtoError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NodeError {
    /// HTTP-style status for the account service surface.
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingCredentials
            | Self::InvalidUsername(_)
            | Self::UsernameTaken(_)
            | Self::InvalidRecipient(_)
            | Self::Message(_) => 400,
            Self::InvalidPassword | Self::WrongPassword => 401,
            Self::UserNotFound(_) => 404,
            _ => 500,
        }
    }
}

impl From<StoreError> for NodeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UsernameTaken(name) => Self::UsernameTaken(name),
            StoreError::NotFound(name) => Self::UserNotFound(name),
            other => Self::Store(other),
        }
    }
}

impl From<LedgerError> for NodeError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NameTaken(name) => Self::UsernameTaken(name),
            other => Self::Ledger(other),
        }
    }
}
