//! lm_node: Ledger Messenger orchestration
//!
//! Thin glue around the codecs in `lm_crypto`:
//! - `registrar`: signup (key generation, funding, ledger registration,
//!   sealing) and login (envelope hand-out)
//! - `session`: unseal the signing key into a scoped `UnlockedKey` that
//!   zeroizes on drop
//! - `conversation`: compose/encrypt/send chat lines, decrypt-and-filter history
//! - `ledger`: the external ledger as a trait, plus an in-process ledger
//! - `config`: environment-driven configuration
//! - `error`: `NodeError`, with HTTP-style status mapping

pub mod config;
pub mod conversation;
pub mod error;
pub mod ledger;
pub mod registrar;
pub mod session;

pub use config::NodeConfig;
pub use conversation::{Conversation, HistoryEntry};
pub use error::NodeError;
pub use ledger::{Ledger, LedgerError, MemoryLedger};
pub use registrar::{Funding, Registrar};
pub use session::{Session, UnlockedKey};
