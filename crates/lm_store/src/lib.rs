//! lm_store: Account store for Ledger Messenger
//!
//! # What is stored
//! One row per username:
//! - an Argon2id password verifier (PHC string), checked at login
//! - the ledger address of the account
//! - the sealed signing key (`KeyEnvelope` JSON). The store can read the
//!   envelope but cannot open it; only the password holder can.
//!
//! Rows are written once at signup and never updated.
//!
//! # Migration
//! SQLx migrations in `migrations/` are run on open.

pub mod db;
pub mod error;
pub mod migrations;
pub mod models;
pub mod verifier;

pub use db::AccountStore;
pub use error::StoreError;
pub use models::{AccountRow, NewAccount};
