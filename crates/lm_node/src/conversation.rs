//! One pairwise conversation.
//!
//! Lines are composed, rendered through the chat grammar and encrypted
//! under the pair's channel key before they reach the ledger. History
//! decrypts everything the ledger returns for the caller and keeps what
//! opens under this pair's key, parses, and names exactly this pair.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use lm_crypto::channel::{self, ChannelKey};
use lm_crypto::Address;
use lm_proto::{ChatLine, Direction, StoredMessage};

use crate::error::NodeError;
use crate::ledger::Ledger;
use crate::session::UnlockedKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub line: ChatLine,
    pub direction: Direction,
    /// When the ledger accepted the message.
    pub stored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    me: String,
    peer: String,
    peer_address: Address,
    key: ChannelKey,
}

impl Conversation {
    pub async fn open<L: Ledger + ?Sized>(
        ledger: &L,
        me: &str,
        peer: &str,
    ) -> Result<Self, NodeError> {
        let peer = peer.trim();
        if peer.is_empty() || peer == me {
            return Err(NodeError::InvalidRecipient(peer.to_string()));
        }
        let peer_address = ledger
            .address_of(peer)
            .await?
            .ok_or_else(|| NodeError::UserNotFound(peer.to_string()))?;

        Ok(Self {
            me: me.to_string(),
            peer: peer.to_string(),
            peer_address,
            key: ChannelKey::derive(me, peer),
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn peer_address(&self) -> Address {
        self.peer_address
    }

    /// Compose a line from `me` to the peer and encrypt it.
    pub fn seal_line(&self, body: &str, at: NaiveDateTime) -> Result<(ChatLine, String), NodeError> {
        let line = ChatLine::compose(&self.me, &self.peer, body, at)?;
        let ciphertext = channel::encrypt(&line.to_string(), &self.key);
        Ok((line, ciphertext))
    }

    pub async fn send<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        signer: &UnlockedKey,
        body: &str,
        at: NaiveDateTime,
    ) -> Result<ChatLine, NodeError> {
        let (line, ciphertext) = self.seal_line(body, at)?;
        ledger.send_message(signer.signing_key(), &self.peer_address, &ciphertext).await?;
        info!(peer = %self.peer, "message sent");
        Ok(line)
    }

    /// `None` for anything that is not a line of this conversation.
    pub fn read(&self, stored: &StoredMessage) -> Option<ChatLine> {
        let text = channel::decrypt(&stored.encrypted_content, &self.key).ok()?;
        ChatLine::parse(&text).filter(|line| line.is_between(&self.me, &self.peer))
    }

    pub async fn history<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        my_address: &Address,
    ) -> Result<Vec<HistoryEntry>, NodeError> {
        let stored = ledger.my_messages(my_address).await?;
        let entries: Vec<HistoryEntry> = stored
            .iter()
            .filter_map(|m| {
                self.read(m).map(|line| HistoryEntry {
                    direction: line.direction(&self.me),
                    stored_at: m.stored_at(),
                    line,
                })
            })
            .collect();
        debug!(peer = %self.peer, fetched = stored.len(), kept = entries.len(), "history filtered");
        Ok(entries)
    }
}
