use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use zeroize::Zeroizing;

use lm_crypto::ChannelKey;
use lm_node::{Conversation, MemoryLedger, NodeConfig, Registrar, Session};
use lm_proto::api::{LoginRequest, SignupRequest};
use lm_proto::Direction;
use lm_store::AccountStore;

#[derive(Parser)]
#[command(name = "lm-node")]
#[command(about = "Ledger Messenger account and chat node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and register it on the ledger
    Signup {
        username: String,
    },

    /// Check a password and unlock the account key
    Login {
        username: String,
    },

    /// Send one message to another registered user
    Send {
        /// Sending account
        #[arg(long)]
        from: String,
        /// Receiving username
        #[arg(long)]
        to: String,
        /// Message body (max 150 characters)
        message: String,
    },

    /// Show the conversation between two users
    History {
        /// Reading account
        #[arg(long)]
        user: String,
        /// Other participant
        #[arg(long)]
        with: String,
    },

    /// Print the channel key two users share
    ChannelKey {
        a: String,
        b: String,
    },
}

struct Node {
    registrar: Registrar<MemoryLedger>,
    ledger: Arc<MemoryLedger>,
}

impl Node {
    async fn open(config: &NodeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating {}", config.data_dir.display()))?;
        let store = AccountStore::open(&config.db_path).await?;
        let ledger = Arc::new(MemoryLedger::open(&config.ledger_path).await?);
        let registrar = Registrar::new(store, ledger.clone(), config.funding());
        Ok(Self { registrar, ledger })
    }

    async fn session(&self, username: &str, password: &str) -> Result<Session> {
        let res = self
            .registrar
            .login(&LoginRequest { username: username.to_string(), password: password.to_string() })
            .await?;
        Ok(Session::from_login(res))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lm_node=info,lm_store=info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Commands::ChannelKey { a, b } = &cli.command {
        println!("{}", ChannelKey::derive(a, b).as_str());
        return Ok(());
    }

    let config = NodeConfig::from_env()?;
    let node = Node::open(&config).await?;

    match cli.command {
        Commands::Signup { username } => {
            let password = prompt_password_twice("Choose a password: ")?;
            let res = node
                .registrar
                .signup(&SignupRequest { username, password: password.to_string() })
                .await?;
            println!("{}", res.message);
            println!("Ledger address: {}", res.eth_address);
        }
        Commands::Login { username } => {
            let password = prompt_password_once("Password: ")?;
            let session = node.session(&username, &password).await?;
            let key = session.unlock_blocking(&password).await?;
            println!("Logged in as {} ({})", session.username(), key.address());
        }
        Commands::Send { from, to, message } => {
            let password = prompt_password_once("Password: ")?;
            let session = node.session(&from, &password).await?;
            let key = session.unlock_blocking(&password).await?;
            let convo = Conversation::open(node.ledger.as_ref(), &from, &to).await?;
            let line = convo
                .send(node.ledger.as_ref(), &key, &message, Local::now().naive_local())
                .await?;
            println!("{line}");
        }
        Commands::History { user, with } => {
            let password = prompt_password_once("Password: ")?;
            let session = node.session(&user, &password).await?;
            let convo = Conversation::open(node.ledger.as_ref(), &user, &with).await?;
            let entries = convo.history(node.ledger.as_ref(), &session.address()).await?;
            if entries.is_empty() {
                println!("No messages with {}", convo.peer());
            }
            for entry in entries {
                let arrow = match entry.direction {
                    Direction::Sent => "->",
                    Direction::Received => "<-",
                };
                let stored = entry
                    .stored_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} {} {} (ledger {})", entry.line.timestamp, arrow, entry.line.body, stored);
            }
        }
        Commands::ChannelKey { .. } => {}
    }
    Ok(())
}

fn prompt_password_once(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("LM_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }
    let pw = rpassword::prompt_password(prompt).map_err(|e| anyhow!("password prompt: {e}"))?;
    Ok(Zeroizing::new(pw))
}

fn prompt_password_twice(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("LM_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }
    let first = prompt_password_once(prompt)?;
    let second = Zeroizing::new(
        rpassword::prompt_password("Confirm password: ")
            .map_err(|e| anyhow!("password prompt: {e}"))?,
    );
    if *first != *second {
        return Err(anyhow!("passwords do not match"));
    }
    Ok(first)
}
