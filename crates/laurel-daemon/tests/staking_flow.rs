// crates/laurel-daemon/tests/staking_flow.rs
//
// Integration tests for the daemon's wiring: a RocksDB ledger in a temp
// directory behind the staking service and the RPC dispatcher.
//
// The daemon is a binary crate with no lib.rs, so these tests assemble the
// same pieces from the library crates directly.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use laurel_core::{LedgerStore, ManualClock, StakeKey, StakeStatus, Timestamp};
use laurel_rpc::{JsonRpcRequest, LaurelRpcServer, RpcConfig};
use laurel_staking::{StakingConfig, StakingService, StaticOwnershipRegistry};
use laurel_store::RocksLedger;

const DAY: u64 = 86_400;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a temporary directory path using UUID to avoid conflicts.
fn temp_db_path(label: &str) -> String {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("laurel_test_{}_{}", label, Uuid::now_v7()));
    path.to_string_lossy().to_string()
}

fn registry() -> Arc<StaticOwnershipRegistry> {
    Arc::new(
        StaticOwnershipRegistry::from_pairs([("100", "0xalice"), ("200", "0xbob")]).unwrap(),
    )
}

fn server_over(
    store: Arc<dyn LedgerStore>,
    clock: Arc<ManualClock>,
) -> LaurelRpcServer {
    let service =
        StakingService::new(store, registry(), clock, StakingConfig::default()).unwrap();
    LaurelRpcServer::new(RpcConfig::default(), Arc::new(service)).with_store_backend("rocks")
}

fn call(method: &str, params: serde_json::Value) -> JsonRpcRequest {
    JsonRpcRequest {
        method: method.to_string(),
        params,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_lifecycle_over_rocksdb() {
    let store: Arc<dyn LedgerStore> = Arc::new(RocksLedger::open(&temp_db_path("lifecycle")).unwrap());
    let clock = Arc::new(ManualClock::new(Timestamp::new(0)));
    let server = server_over(store.clone(), clock.clone());
    let alice = json!({"ownerId": "0xalice", "tokenId": "100"});

    let resp = server.dispatch(call("staking/stake", alice.clone())).await;
    assert!(resp.success, "{:?}", resp.error);

    // Half a day: one point pending, claim pays it and advances by 8h only.
    clock.set(Timestamp::new(43_200));
    let resp = server.dispatch(call("staking/pending", alice.clone())).await;
    assert_eq!(resp.result.unwrap()["pendingPoints"], 1);
    let resp = server.dispatch(call("staking/claim", alice.clone())).await;
    assert_eq!(resp.result.unwrap()["pointsAwarded"], 1);

    let key = StakeKey::parse("0xalice", "100").unwrap();
    let record = store.get_record(&key).await.unwrap().unwrap();
    assert_eq!(record.last_settled_at, Timestamp::new(28_800));
    assert_eq!(record.accrued_points_balance, 1);

    // Retried claim: nothing new.
    let resp = server.dispatch(call("staking/claim", alice.clone())).await;
    assert_eq!(resp.error_kind.as_deref(), Some("NoPendingPoints"));

    // Two days later, unstake pays whole points since 8h: 2.5 days -> 7
    // over the whole stake, 6 of them now.
    clock.set(Timestamp::new(43_200 + 2 * DAY));
    let resp = server.dispatch(call("staking/unstake", alice.clone())).await;
    let result = resp.result.unwrap();
    assert_eq!(result["status"], "Unstaked");
    assert_eq!(result["pointsAwarded"], 6);
    assert_eq!(result["newBalance"], 7);

    let resp = server
        .dispatch(call("staking/is_staked", json!({"tokenId": "100"})))
        .await;
    assert_eq!(resp.result.unwrap()["staked"], false);
}

#[tokio::test]
async fn test_mutual_exclusion_over_rocksdb() {
    let store: Arc<dyn LedgerStore> = Arc::new(RocksLedger::open(&temp_db_path("exclusive")).unwrap());
    let clock = Arc::new(ManualClock::new(Timestamp::new(0)));
    let server = server_over(store, clock);

    let resp = server
        .dispatch(call("staking/stake", json!({"ownerId": "0xbob", "tokenId": "200"})))
        .await;
    assert!(resp.success);

    // Alice does not own 200.
    let resp = server
        .dispatch(call("staking/stake", json!({"ownerId": "0xalice", "tokenId": "200"})))
        .await;
    assert_eq!(resp.error_kind.as_deref(), Some("NotOwner"));

    let resp = server
        .dispatch(call("staking/unstake", json!({"ownerId": "0xalice", "tokenId": "200"})))
        .await;
    assert_eq!(resp.error_kind.as_deref(), Some("NotOwner"));

    let resp = server
        .dispatch(call("staking/tokens", json!({"ownerId": "0xbob"})))
        .await;
    assert_eq!(resp.result.unwrap()["tokenIds"], json!(["200"]));
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let path = temp_db_path("reopen");
    let key = StakeKey::parse("0xalice", "100").unwrap();

    {
        let ledger = Arc::new(RocksLedger::open(&path).unwrap());
        let clock = Arc::new(ManualClock::new(Timestamp::new(0)));
        let service =
            StakingService::new(ledger, registry(), clock.clone(), StakingConfig::default())
                .unwrap();
        service.stake(&key).await.unwrap();
        clock.set(Timestamp::new(DAY));
        service.claim(&key).await.unwrap();
    }

    let ledger = RocksLedger::open(&path).unwrap();
    let record = ledger.get_record(&key).await.unwrap().unwrap();
    assert_eq!(record.status, StakeStatus::Staked);
    assert_eq!(record.accrued_points_balance, 3);
    assert_eq!(record.last_settled_at, Timestamp::new(DAY));
    assert_eq!(record.revision, 1);
    assert_eq!(
        ledger.staker_of(&key.token).await.unwrap(),
        Some(key.owner.clone())
    );
}

#[tokio::test]
async fn test_settle_receipt_is_queryable() {
    let store: Arc<dyn LedgerStore> = Arc::new(RocksLedger::open(&temp_db_path("receipt")).unwrap());
    let clock = Arc::new(ManualClock::new(Timestamp::new(0)));
    let server = server_over(store, clock.clone());
    let alice = json!({"ownerId": "0xalice", "tokenId": "100"});

    server.dispatch(call("staking/stake", alice)).await;
    clock.set(Timestamp::new(DAY));
    let resp = server
        .dispatch(call(
            "staking/settle",
            json!({"ownerId": "0xalice", "tokenId": "100", "asOf": DAY}),
        ))
        .await;
    assert_eq!(resp.result.unwrap()["pointsAwarded"], 3);

    let key = StakeKey::parse("0xalice", "100").unwrap();
    let dedup = laurel_core::dedup_key(&key.owner, &key.token, Timestamp::new(0), 0);
    let resp = server
        .dispatch(call("staking/receipt", json!({ "dedupKey": dedup })))
        .await;
    let result = resp.result.unwrap();
    let receipt = &result["receipt"];
    assert_eq!(receipt["pointsAwarded"], 3);
    assert_eq!(receipt["newBalance"], 3);
    assert_eq!(receipt["newLastSettledAt"], DAY);
    assert!(receipt.get("points_awarded").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_settles_over_rocksdb_pay_once() {
    let store: Arc<dyn LedgerStore> =
        Arc::new(RocksLedger::open(&temp_db_path("concurrent")).unwrap());
    let clock = Arc::new(ManualClock::new(Timestamp::new(0)));
    let svc = Arc::new(
        StakingService::new(
            store.clone(),
            registry(),
            clock.clone(),
            StakingConfig {
                max_commit_attempts: 16,
                backoff_base_ms: 1,
                ..StakingConfig::default()
            },
        )
        .unwrap(),
    );
    let k = StakeKey::parse("0xalice", "100").unwrap();
    svc.stake(&k).await.unwrap();
    clock.set(Timestamp::new(DAY * 4));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = svc.clone();
        let k = k.clone();
        handles.push(tokio::spawn(async move { svc.settle(&k, None).await }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap().unwrap().points_awarded;
    }
    assert_eq!(total, 12);

    let record = store.get_record(&k).await.unwrap().unwrap();
    assert_eq!(record.accrued_points_balance, 12);
    assert_eq!(record.last_settled_at, Timestamp::new(DAY * 4));
    assert_eq!(record.revision, 1);
}
