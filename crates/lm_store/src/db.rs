//! Account store over SQLite via sqlx.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::migrations::run_migrations;
use crate::models::{AccountRow, NewAccount};

/// Central store handle. Cheap to clone (Arc internally).
#[derive(Clone)]
pub struct AccountStore {
    pub pool: SqlitePool,
}

impl AccountStore {
    /// Open (or create) the SQLite database at `db_path`.
    /// Runs all pending migrations automatically.
    ///
    /// WAL mode is set on the connection, not in a migration: SQLite refuses
    /// to change `journal_mode` inside the transaction sqlx wraps migrations in.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(opts).await?;
        run_migrations(&pool).await?;
        info!(path = %db_path.display(), "account store opened");
        Ok(Self { pool })
    }

    /// Private in-memory database. One connection, or every checkout would
    /// see its own empty database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert a new account. Usernames are unique; a clash is reported as
    /// [`StoreError::UsernameTaken`], never as a raw database error.
    pub async fn create_account(&self, account: &NewAccount) -> Result<AccountRow, StoreError> {
        if self.find_by_username(&account.username).await?.is_some() {
            return Err(StoreError::UsernameTaken(account.username.clone()));
        }

        let envelope_json = account.envelope.to_json()?;
        let inserted = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO accounts (username, password_hash, ledger_address, encrypted_key, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, username, password_hash, ledger_address, encrypted_key, created_at",
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.address.to_string())
        .bind(&envelope_json)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => {
                debug!(username = %row.username, id = row.id, "account row inserted");
                Ok(row)
            }
            // Lost a race with a concurrent signup for the same name.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::UsernameTaken(account.username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<AccountRow>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, password_hash, ledger_address, encrypted_key, created_at \
             FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get(&self, username: &str) -> Result<AccountRow, StoreError> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
