//! Node configuration, read from the environment.
//!
//! | variable                | default                          |
//! |-------------------------|----------------------------------|
//! | `LM_DATA_DIR`           | platform data dir (`directories`)|
//! | `LM_DB_PATH`            | `$LM_DATA_DIR/accounts.db`       |
//! | `LM_LEDGER_PATH`        | `$LM_DATA_DIR/ledger.json`       |
//! | `LM_FUNDING_SENDER`     | unset (no funding at signup)     |
//! | `LM_FUNDING_AMOUNT_WEI` | 10^18 (1 ETH)                    |

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use lm_crypto::Address;

use crate::error::NodeError;
use crate::registrar::Funding;

pub const APP_QUALIFIER: &str = "org";
pub const APP_ORG: &str = "ledger-messenger";
pub const APP_NAME: &str = "lm-node";

pub const DEFAULT_FUNDING_WEI: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub ledger_path: PathBuf,
    /// Account that pays the signup stipend. `None` disables funding.
    pub funding_sender: Option<Address>,
    pub funding_amount_wei: u128,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, NodeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NodeError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match get("LM_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let db_path = get("LM_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("accounts.db"));
        let ledger_path = get("LM_LEDGER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("ledger.json"));

        let funding_sender = get("LM_FUNDING_SENDER")
            .map(|raw| {
                raw.trim()
                    .parse::<Address>()
                    .map_err(|e| NodeError::Config(format!("LM_FUNDING_SENDER: {e}")))
            })
            .transpose()?;
        let funding_amount_wei = match get("LM_FUNDING_AMOUNT_WEI") {
            Some(raw) => raw
                .trim()
                .parse::<u128>()
                .map_err(|e| NodeError::Config(format!("LM_FUNDING_AMOUNT_WEI: {e}")))?,
            None => DEFAULT_FUNDING_WEI,
        };

        Ok(Self { data_dir, db_path, ledger_path, funding_sender, funding_amount_wei })
    }

    pub fn funding(&self) -> Option<Funding> {
        self.funding_sender.map(|sender| Funding { sender, amount_wei: self.funding_amount_wei })
    }
}

fn default_data_dir() -> Result<PathBuf, NodeError> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| NodeError::Config("cannot determine data directory".into()))?;
    Ok(dirs.data_dir().to_path_buf())
}
