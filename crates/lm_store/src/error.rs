use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] lm_crypto::CryptoError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Corrupt account row for {username}: {reason}")]
    CorruptRow { username: String, reason: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Domain errors (as opposed to database or I/O failures).
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::UsernameTaken(_) | Self::NotFound(_))
    }
}
