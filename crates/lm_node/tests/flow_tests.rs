//! End-to-end flows: signup, login, unlock, send and read back.
//!
//! Every signup and unlock pays for PBKDF2 and Argon2, so each test keeps
//! its account count small.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use lm_node::{Conversation, Funding, Ledger, MemoryLedger, NodeError, Registrar, Session};
use lm_proto::api::{LoginRequest, SignupRequest};
use lm_proto::Direction;
use lm_store::AccountStore;

fn at(hh: u32, mm: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(hh, mm, 0).unwrap()
}

fn signup_req(username: &str, password: &str) -> SignupRequest {
    SignupRequest { username: username.into(), password: password.into() }
}

fn login_req(username: &str, password: &str) -> LoginRequest {
    LoginRequest { username: username.into(), password: password.into() }
}

async fn registrar(ledger: Arc<MemoryLedger>) -> Registrar<MemoryLedger> {
    let store = AccountStore::open_in_memory().await.expect("open store");
    Registrar::new(store, ledger, None)
}

#[tokio::test]
async fn signup_login_send_and_read_back() {
    let ledger = Arc::new(MemoryLedger::new());
    let reg = registrar(ledger.clone()).await;

    let alice = reg.signup(&signup_req("alice", "alice-pw")).await.unwrap();
    let bob = reg.signup(&signup_req("bob", "bob-pw")).await.unwrap();
    assert_eq!(alice.message, "User registered successfully!");
    assert_eq!(ledger.address_of("alice").await.unwrap(), Some(alice.eth_address));

    let alice_session = Session::from_login(reg.login(&login_req("alice", "alice-pw")).await.unwrap());
    assert_eq!(alice_session.address(), alice.eth_address);
    let alice_key = alice_session.unlock_blocking("alice-pw").await.unwrap();

    let to_bob = Conversation::open(ledger.as_ref(), "alice", "bob").await.unwrap();
    assert_eq!(to_bob.peer_address(), bob.eth_address);
    to_bob.send(ledger.as_ref(), &alice_key, "hi", at(10, 30)).await.unwrap();

    let bob_session = Session::from_login(reg.login(&login_req("bob", "bob-pw")).await.unwrap());
    let bob_key = bob_session.unlock_blocking("bob-pw").await.unwrap();
    let to_alice = Conversation::open(ledger.as_ref(), "bob", "alice").await.unwrap();
    to_alice
        .send(ledger.as_ref(), &bob_key, r#"she said "yes""#, at(10, 31))
        .await
        .unwrap();

    let seen_by_bob = to_alice.history(ledger.as_ref(), &bob_session.address()).await.unwrap();
    assert_eq!(seen_by_bob.len(), 2);
    assert_eq!(seen_by_bob[0].line.to_string(), r#"05-01-2024 10:30 "alice" to "bob" "hi""#);
    assert_eq!(seen_by_bob[0].direction, Direction::Received);
    assert_eq!(seen_by_bob[1].line.body, r#"she said "yes""#);
    assert_eq!(seen_by_bob[1].direction, Direction::Sent);
    assert!(seen_by_bob.iter().all(|e| e.stored_at.is_some()));

    let seen_by_alice = to_bob.history(ledger.as_ref(), &alice_session.address()).await.unwrap();
    let directions: Vec<_> = seen_by_alice.iter().map(|e| e.direction).collect();
    assert_eq!(directions, [Direction::Sent, Direction::Received]);
}

#[tokio::test]
async fn other_conversations_stay_out_of_history() {
    let ledger = Arc::new(MemoryLedger::new());
    let reg = registrar(ledger.clone()).await;
    for name in ["alice", "bob", "carol"] {
        reg.signup(&signup_req(name, "pw")).await.unwrap();
    }
    let alice = Session::from_login(reg.login(&login_req("alice", "pw")).await.unwrap());
    let key = alice.unlock("pw").unwrap();

    let with_bob = Conversation::open(ledger.as_ref(), "alice", "bob").await.unwrap();
    let with_carol = Conversation::open(ledger.as_ref(), "alice", "carol").await.unwrap();
    with_bob.send(ledger.as_ref(), &key, "to bob", at(9, 0)).await.unwrap();
    with_carol.send(ledger.as_ref(), &key, "to carol", at(9, 1)).await.unwrap();

    assert_eq!(ledger.my_messages(&alice.address()).await.unwrap().len(), 2);

    let bob_view = with_bob.history(ledger.as_ref(), &alice.address()).await.unwrap();
    assert_eq!(bob_view.len(), 1);
    assert_eq!(bob_view[0].line.body, "to bob");

    let carol_view = with_carol.history(ledger.as_ref(), &alice.address()).await.unwrap();
    assert_eq!(carol_view.len(), 1);
    assert_eq!(carol_view[0].line.body, "to carol");
}

#[tokio::test]
async fn login_failures_are_distinct() {
    let ledger = Arc::new(MemoryLedger::new());
    let reg = registrar(ledger).await;
    reg.signup(&signup_req("alice", "right")).await.unwrap();

    let err = reg.login(&login_req("alice", "wrong")).await.unwrap_err();
    assert!(matches!(err, NodeError::InvalidPassword));
    assert_eq!(err.status(), 401);

    let err = reg.login(&login_req("ghost", "whatever")).await.unwrap_err();
    assert!(matches!(err, NodeError::UserNotFound(_)));
    assert_eq!(err.status(), 404);

    let err = reg.login(&login_req("", "")).await.unwrap_err();
    assert!(matches!(err, NodeError::MissingCredentials));
}

#[tokio::test]
async fn envelope_opened_with_wrong_password_is_rejected() {
    let ledger = Arc::new(MemoryLedger::new());
    let reg = registrar(ledger).await;
    reg.signup(&signup_req("alice", "right")).await.unwrap();

    let session = Session::from_login(reg.login(&login_req("alice", "right")).await.unwrap());
    let err = session.unlock("wrong").unwrap_err();
    assert!(matches!(err, NodeError::WrongPassword));
}

#[tokio::test]
async fn signup_rejects_bad_requests() {
    let ledger = Arc::new(MemoryLedger::new());
    let reg = registrar(ledger.clone()).await;

    let err = reg.signup(&signup_req("alice", "")).await.unwrap_err();
    assert!(matches!(err, NodeError::MissingCredentials));
    assert_eq!(err.status(), 400);

    let err = reg.signup(&signup_req("al\"ice", "pw")).await.unwrap_err();
    assert!(matches!(err, NodeError::InvalidUsername(_)));

    let err = reg.signup(&signup_req("b_secret_c", "pw")).await.unwrap_err();
    assert!(matches!(err, NodeError::InvalidUsername(_)));

    reg.signup(&signup_req("alice", "pw")).await.unwrap();
    let err = reg.signup(&signup_req("alice", "other")).await.unwrap_err();
    assert!(matches!(err, NodeError::UsernameTaken(_)));
    assert_eq!(reg.store().count().await.unwrap(), 1);
}

#[tokio::test]
async fn name_taken_on_ledger_is_reported_as_taken() {
    let ledger = Arc::new(MemoryLedger::new());
    let squatter = lm_crypto::SigningKey::generate();
    ledger.register(&squatter, "alice").await.unwrap();

    let reg = registrar(ledger).await;
    let err = reg.signup(&signup_req("alice", "pw")).await.unwrap_err();
    assert!(matches!(err, NodeError::UsernameTaken(_)));
    assert_eq!(reg.store().count().await.unwrap(), 0);
}

#[tokio::test]
async fn opening_a_conversation_checks_the_peer() {
    let ledger = Arc::new(MemoryLedger::new());
    let reg = registrar(ledger.clone()).await;
    reg.signup(&signup_req("alice", "pw")).await.unwrap();

    for peer in ["", "   ", "alice"] {
        let err = Conversation::open(ledger.as_ref(), "alice", peer).await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidRecipient(_)), "{peer:?}");
    }
    let err = Conversation::open(ledger.as_ref(), "alice", "nobody").await.unwrap_err();
    assert!(matches!(err, NodeError::UserNotFound(ref u) if u == "nobody"));
}

#[tokio::test]
async fn signup_pays_the_configured_stipend() {
    let ledger = Arc::new(MemoryLedger::new());
    let store = AccountStore::open_in_memory().await.unwrap();
    let faucet = lm_crypto::SigningKey::generate().address();
    let reg = Registrar::new(
        store,
        ledger.clone(),
        Some(Funding { sender: faucet, amount_wei: 1_000_000_000_000_000_000 }),
    );

    let res = reg.signup(&signup_req("alice", "pw")).await.unwrap();
    assert_eq!(ledger.balance_of(&res.eth_address).await, 1_000_000_000_000_000_000);
}

#[tokio::test]
async fn ledger_snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let (alice, bob) = (lm_crypto::SigningKey::generate(), lm_crypto::SigningKey::generate());
    {
        let ledger = MemoryLedger::open(&path).await.unwrap();
        ledger.register(&alice, "alice").await.unwrap();
        ledger.register(&bob, "bob").await.unwrap();
        ledger.send_message(&alice, &bob.address(), "opaque").await.unwrap();
    }

    let reopened = MemoryLedger::open(&path).await.unwrap();
    assert_eq!(reopened.address_of("bob").await.unwrap(), Some(bob.address()));
    let inbox = reopened.my_messages(&bob.address()).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].encrypted_content, "opaque");
    assert_eq!(inbox[0].other_party, alice.address());
}
