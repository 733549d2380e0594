use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Stored envelope is structurally broken (non-hex, wrong salt/IV length).
    #[error("Invalid key envelope: {0}")]
    InvalidEnvelope(String),

    /// Channel ciphertext did not open under the supplied key.
    #[error("Channel decryption failed")]
    ChannelDecrypt,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
