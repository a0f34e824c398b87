// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::response::Response;
use fitrank::clients::{MemoryContract, MemoryFhe, MemoryVault};
use fitrank::config::Config;
use fitrank::models::{Address, RecordData, WorkoutForm};
use fitrank::routes::create_router;
use fitrank::services::{Coordinator, Notifier, WalletSession};
use fitrank::AppState;
use std::sync::Arc;
use std::time::Duration;

#[allow(dead_code)]
pub const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
#[allow(dead_code)]
pub const BOB: &str = "0xb0b0000000000000000000000000000000000002";

pub type TestCoordinator = Coordinator<MemoryContract, MemoryFhe>;

/// In-memory collaborators wired to a coordinator.
pub struct Harness {
    #[allow(dead_code)]
    pub vault: Arc<MemoryVault>,
    pub contract: Arc<MemoryContract>,
    pub fhe: Arc<MemoryFhe>,
    pub coordinator: Arc<TestCoordinator>,
}

#[allow(dead_code)]
pub fn address(raw: &str) -> Address {
    Address::parse(raw).unwrap()
}

/// Fresh, disconnected harness.
pub fn harness() -> Harness {
    let vault = MemoryVault::new();
    let contract = Arc::new(MemoryContract::new(vault.clone()));
    let fhe = Arc::new(MemoryFhe::new(vault.clone()));
    let coordinator = Arc::new(Coordinator::new(
        contract.clone(),
        fhe.clone(),
        Notifier::default(),
    ));
    Harness {
        vault,
        contract,
        fhe,
        coordinator,
    }
}

impl Harness {
    /// Connect `account` (also as the contract signer) and wait for the
    /// initial load.
    #[allow(dead_code)]
    pub async fn connect(&self, account: &str) {
        let account = address(account);
        self.contract.set_signer(&account).await;
        self.coordinator.connect(account).await.unwrap();
    }
}

/// Harness already connected as Alice.
#[allow(dead_code)]
pub async fn connected() -> Harness {
    let h = harness();
    h.connect(ALICE).await;
    h
}

#[allow(dead_code)]
pub fn record_data(name: &str, creator: &str, verified: Option<u64>) -> RecordData {
    RecordData {
        name: name.to_string(),
        public_value1: 30,
        public_value2: 200,
        timestamp: 1_704_103_200,
        creator: creator.to_string(),
        is_verified: verified.is_some(),
        decrypted_value: verified.unwrap_or(0),
    }
}

#[allow(dead_code)]
pub fn workout(name: &str, steps: &str, duration: &str, calories: &str) -> WorkoutForm {
    WorkoutForm {
        name: name.to_string(),
        steps: steps.to_string(),
        duration: duration.to_string(),
        calories: calories.to_string(),
    }
}

/// Create a test app with in-memory collaborators.
/// Returns the router, the shared state and the harness behind it.
#[allow(dead_code)]
pub async fn create_test_app() -> (
    axum::Router,
    Arc<AppState<MemoryContract, MemoryFhe>>,
    Harness,
) {
    let h = harness();
    let wallet = WalletSession::new();
    let _follower = h.coordinator.clone().follow_wallet(wallet.subscribe());
    // Let the follower consume the initial (disconnected) value first.
    tokio::task::yield_now().await;

    let state = Arc::new(AppState {
        config: Config::default(),
        coordinator: h.coordinator.clone(),
        wallet,
    });

    (create_router(state.clone()), state, h)
}

/// Parse a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn json_body(value: serde_json::Value) -> Body {
    Body::from(serde_json::to_vec(&value).unwrap())
}

/// Poll `condition` until it holds or a second passes.
#[allow(dead_code)]
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
