//! Integration tests for envelope reconciliation.
//!
//! Each test wires a [`HashReconciler`] to an in-memory ledger and drives it
//! on a paused tokio clock, so attempt counts and the time spent between
//! attempts can be asserted exactly without really sleeping.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use omniswap_protocol::address::Address;
use omniswap_protocol::cell::{serialize_base64, Cell, CellBuilder};
use omniswap_protocol::config::{ReconcilerConfig, RECONCILE_RETRY_DELAY, TRANSACTION_WINDOW};
use omniswap_protocol::ledger::memory::synthetic_record;
use omniswap_protocol::ledger::{LedgerError, MemoryLedger, TransactionRecord};
use omniswap_protocol::message::{
    CommonMsgInfo, CurrencyCollection, InternalMessageInfo, Message,
};
use omniswap_protocol::reconcile::{HashReconciler, ReconcileError, RetryPolicy};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn owner() -> Address {
    "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N"
        .parse()
        .expect("owner address")
}

/// A wallet-style signed request: 512-bit signature, then seqno and expiry.
fn wallet_envelope(seqno: u32) -> Message {
    let mut body = CellBuilder::new();
    body.store_bytes(&[seqno as u8; 64]).unwrap();
    body.store_uint(seqno as u64, 32).unwrap();
    body.store_uint(1_700_000_600, 32).unwrap();
    Message::external_in(owner(), body.build().unwrap())
}

fn boc(message: &Message) -> String {
    serialize_base64(&message.to_cell().unwrap())
}

fn record(lt: u64, message: Option<&Message>) -> TransactionRecord {
    synthetic_record(&owner(), lt, message.map(|m| m.to_cell().unwrap())).unwrap()
}

fn incoming_transfer(lt: u64) -> TransactionRecord {
    let message = Message {
        info: CommonMsgInfo::Internal(InternalMessageInfo {
            ihr_disabled: true,
            bounce: false,
            bounced: false,
            src: Some(Address::new(0, [0x99; 32])),
            dest: owner(),
            value: CurrencyCollection::new(2_000_000_000),
            ihr_fee: 0,
            fwd_fee: 266_669,
            created_lt: lt - 1,
            created_at: 1_700_000_000,
        }),
        init: None,
        body: None,
    };
    record(lt, Some(&message))
}

/// Five unrelated transactions, newest first.
fn unrelated_window() -> Vec<TransactionRecord> {
    vec![
        record(50, Some(&wallet_envelope(9))),
        incoming_transfer(40),
        record(30, None),
        record(20, Some(&wallet_envelope(8))),
        incoming_transfer(10),
    ]
}

fn wallet_envelopes() -> serde_json::Value {
    serde_json::from_str(include_str!("fixtures/wallet_envelopes.json")).unwrap()
}

/// Records decoded from a captured `getTransactions` page, newest first.
fn indexer_history() -> Vec<TransactionRecord> {
    let page: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/get_transactions.json")).unwrap();
    page["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tx| TransactionRecord::from_boc(0, tx["data"].as_str().unwrap()).unwrap())
        .collect()
}

fn reconciler(ledger: Arc<MemoryLedger>) -> HashReconciler<Arc<MemoryLedger>> {
    HashReconciler::with_defaults(ledger)
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn second_of_three_matches_on_first_attempt() {
    let envelope = wallet_envelope(10);
    let history = vec![
        record(300, Some(&wallet_envelope(11))),
        record(200, Some(&envelope)),
        incoming_transfer(100),
    ];
    let expected = history[1].hash;
    let ledger = Arc::new(MemoryLedger::new(history));

    let start = Instant::now();
    let id = reconciler(ledger.clone())
        .reconcile(&boc(&envelope), &owner().to_string())
        .await
        .unwrap();

    assert_eq!(id, expected);
    assert_eq!(ledger.query_count(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(ledger.last_query(), Some((owner(), TRANSACTION_WINDOW)));
}

#[tokio::test(start_paused = true)]
async fn match_appearing_later_stops_the_loop() {
    let envelope = wallet_envelope(12);
    let ledger = Arc::new(MemoryLedger::new(vec![]));
    for _ in 0..3 {
        ledger.push_response(Ok(unrelated_window()));
    }
    let mut landed = unrelated_window();
    landed.insert(0, record(60, Some(&envelope)));
    let expected = landed[0].hash;
    ledger.set_history(landed);

    let start = Instant::now();
    let id = reconciler(ledger.clone())
        .reconcile(&boc(&envelope), &owner().to_string())
        .await
        .unwrap();

    assert_eq!(id, expected);
    assert_eq!(ledger.query_count(), 4);
    assert_eq!(start.elapsed(), RECONCILE_RETRY_DELAY * 3);
}

#[tokio::test(start_paused = true)]
async fn reconciliation_is_idempotent() {
    let envelope = wallet_envelope(13);
    let history = vec![record(70, Some(&envelope)), incoming_transfer(60)];
    let ledger = Arc::new(MemoryLedger::new(history));
    let reconciler = reconciler(ledger.clone());

    let first = reconciler
        .reconcile(&boc(&envelope), &owner().to_string())
        .await
        .unwrap();
    let second = reconciler
        .reconcile(&boc(&envelope), &owner().to_raw_string())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(ledger.query_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn deploying_envelope_with_state_init_matches() {
    // Deploy request: state init inline on the root, four-transfer body by
    // reference, as the wallet lays it out.
    let envelope = &wallet_envelopes()["envelopes"][0];
    let history = indexer_history();
    let ledger = Arc::new(MemoryLedger::new(history));

    let id = reconciler(ledger.clone())
        .reconcile(envelope["boc"].as_str().unwrap(), &owner().to_string())
        .await
        .unwrap();
    assert_eq!(
        id.to_hex(),
        "f21e764a2c7857f0ed1be54a29bae4a0e78f108b6ba72d332bdc81e71793a457"
    );
    assert_eq!(ledger.query_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn indexer_history_resolves_each_wallet_envelope() {
    let expected = [
        "f21e764a2c7857f0ed1be54a29bae4a0e78f108b6ba72d332bdc81e71793a457",
        "677981339dafed65c1935fd83e18e5d748248d3cd393b70f5bd9399689ce1361",
    ];
    let vectors = wallet_envelopes();
    let ledger = Arc::new(MemoryLedger::new(indexer_history()));
    let reconciler = reconciler(ledger);

    for (envelope, tx) in vectors["envelopes"].as_array().unwrap().iter().zip(expected) {
        let id = reconciler
            .reconcile(envelope["boc"].as_str().unwrap(), vectors["wallet"].as_str().unwrap())
            .await
            .unwrap();
        assert_eq!(id.to_hex(), tx, "{}", envelope["name"]);
    }
}

#[tokio::test(start_paused = true)]
async fn url_safe_envelope_encoding_is_accepted() {
    let envelope = wallet_envelope(14);
    let history = vec![record(80, Some(&envelope))];
    let expected = history[0].hash;
    let ledger = Arc::new(MemoryLedger::new(history));

    let url_safe = boc(&envelope).replace('+', "-").replace('/', "_");
    let id = reconciler(ledger)
        .reconcile(&url_safe, &owner().to_string())
        .await
        .unwrap();
    assert_eq!(id, expected);
}

// ---------------------------------------------------------------------------
// Exhaustion
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn no_match_gives_up_after_thirty_attempts() {
    let ledger = Arc::new(MemoryLedger::new(unrelated_window()));

    let start = Instant::now();
    let err = reconciler(ledger.clone())
        .reconcile(&boc(&wallet_envelope(15)), &owner().to_string())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ReconcileError::NotFound {
            attempts: 30,
            last_error: None
        }
    );
    assert_eq!(ledger.query_count(), 30);
    assert_eq!(start.elapsed(), RECONCILE_RETRY_DELAY * 29);
}

#[tokio::test(start_paused = true)]
async fn custom_policy_bounds_attempts_and_delay() {
    let ledger = Arc::new(MemoryLedger::new(vec![]));
    let config = ReconcilerConfig {
        window: 3,
        retry: RetryPolicy::new(4, Duration::from_millis(250)),
    };
    let reconciler = HashReconciler::new(ledger.clone(), config);

    let start = Instant::now();
    let err = reconciler
        .reconcile(&boc(&wallet_envelope(16)), &owner().to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound { attempts: 4, .. }));
    assert_eq!(ledger.query_count(), 4);
    assert_eq!(start.elapsed(), Duration::from_millis(750));
    assert_eq!(ledger.last_query(), Some((owner(), 3)));
}

// ---------------------------------------------------------------------------
// Ledger failures
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transient_ledger_errors_are_retried() {
    let envelope = wallet_envelope(17);
    let history = vec![record(90, Some(&envelope))];
    let expected = history[0].hash;
    let ledger = Arc::new(MemoryLedger::new(history));
    ledger.push_response(Err(LedgerError::Transport("connection reset".into())));
    ledger.push_response(Err(LedgerError::Api {
        code: 429,
        message: "Ratelimit exceed".into(),
    }));

    let start = Instant::now();
    let id = reconciler(ledger.clone())
        .reconcile(&boc(&envelope), &owner().to_string())
        .await
        .unwrap();

    assert_eq!(id, expected);
    assert_eq!(ledger.query_count(), 3);
    assert_eq!(start.elapsed(), RECONCILE_RETRY_DELAY * 2);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_reports_last_ledger_error() {
    let ledger = Arc::new(MemoryLedger::new(unrelated_window()));
    let config = ReconcilerConfig {
        retry: RetryPolicy::new(3, RECONCILE_RETRY_DELAY),
        ..ReconcilerConfig::default()
    };
    ledger.push_response(Err(LedgerError::Transport("timed out".into())));
    ledger.push_response(Err(LedgerError::Api {
        code: 503,
        message: "unavailable".into(),
    }));

    let err = HashReconciler::new(ledger.clone(), config)
        .reconcile(&boc(&wallet_envelope(18)), &owner().to_string())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ReconcileError::NotFound {
            attempts: 3,
            last_error: Some(LedgerError::Api {
                code: 503,
                message: "unavailable".into()
            }),
        }
    );
    assert!(err.to_string().contains("unavailable"));
}

// ---------------------------------------------------------------------------
// Invalid arguments
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn missing_inputs_never_query_the_ledger() {
    let ledger = Arc::new(MemoryLedger::new(unrelated_window()));
    let reconciler = reconciler(ledger.clone());
    let envelope = boc(&wallet_envelope(19));

    let cases = [
        ("", owner().to_string()),
        (envelope.as_str(), String::new()),
        ("", String::new()),
        ("***", owner().to_string()),
        (envelope.as_str(), "not-an-address".to_string()),
    ];
    for (envelope_arg, address) in cases {
        let err = reconciler.reconcile(envelope_arg, &address).await.unwrap_err();
        assert!(
            matches!(err, ReconcileError::InvalidArgument { .. }),
            "unexpected {err:?}"
        );
    }
    assert_eq!(ledger.query_count(), 0);
}

// ---------------------------------------------------------------------------
// Skipping
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn ineligible_records_are_never_matched() {
    let envelope = wallet_envelope(20);

    // Same body delivered as an internal message.
    let internal = Message {
        info: CommonMsgInfo::Internal(InternalMessageInfo {
            ihr_disabled: true,
            bounce: true,
            bounced: false,
            src: Some(Address::new(0, [1; 32])),
            dest: owner(),
            value: CurrencyCollection::new(0),
            ihr_fee: 0,
            fwd_fee: 0,
            created_lt: 1,
            created_at: 1,
        }),
        init: None,
        body: envelope.body.clone(),
    };
    let mut bodyless = envelope.clone();
    bodyless.body = None;

    let history = vec![
        record(5, None),
        record(4, Some(&internal)),
        record(3, Some(&bodyless)),
        synthetic_record(&owner(), 2, Some(Cell::empty())).unwrap(),
    ];
    let ledger = Arc::new(MemoryLedger::new(history));
    let config = ReconcilerConfig {
        retry: RetryPolicy::new(2, Duration::from_millis(10)),
        ..ReconcilerConfig::default()
    };

    let err = HashReconciler::new(ledger.clone(), config)
        .reconcile(&boc(&envelope), &owner().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound { attempts: 2, last_error: None }));
    assert_eq!(ledger.query_count(), 2);
}
