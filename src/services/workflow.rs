// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workflow coordinator.
//!
//! Drives the encrypt → submit → confirm → decrypt-verify → reload loop and
//! owns the session: active account, FHE readiness, the ledger and the
//! upload form. Collaborators are reached through the [`LeaderboardContract`]
//! and [`FheSdk`] ports.
//!
//! Session state sits behind a plain mutex and is only touched inside short
//! closures, so no lock is ever held across an await.
//! Every connect/disconnect bumps a session epoch; a load that finishes
//! under an older epoch drops its results.

use crate::clients::contract::{LeaderboardContract, NewRecord, RECORD_CATEGORY};
use crate::clients::fhe::{DecryptionProof, DecryptionSubmitter, FheSdk};
use crate::error::WorkflowError;
use crate::models::{
    Address, FheStatus, FitnessRecord, SessionSnapshot, TransactionStatus, UploadFormState,
    UserStats, WorkoutForm,
};
use crate::services::leaderboard;
use crate::services::notifier::Notifier;
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Per-record fetches in flight during a load.
const LOAD_CONCURRENCY: usize = 8;

// ─── Status messages ────────────────────────────────────────────────────────

pub const MSG_CONNECT_WALLET: &str = "Please connect wallet first";
pub const MSG_FHE_INIT_FAILED: &str = "FHE initialization failed";
pub const MSG_FHE_NOT_READY: &str = "FHE system is not ready yet";
pub const MSG_LOAD_FAILED: &str = "Failed to load data";
pub const MSG_ENCRYPTING: &str = "Encrypting fitness data with FHE...";
pub const MSG_UPLOADING: &str = "Uploading encrypted data...";
pub const MSG_UPLOADED: &str = "Fitness data uploaded successfully!";
pub const MSG_REJECTED: &str = "Transaction rejected";
pub const MSG_ALREADY_VERIFIED: &str = "Steps already verified";
pub const MSG_VERIFYING: &str = "Verifying steps...";
pub const MSG_VERIFIED: &str = "Steps verified successfully!";
pub const MSG_RACE_VERIFIED: &str = "Data already verified";
pub const MSG_DECRYPT_FAILED: &str = "Decryption failed";
pub const MSG_AVAILABLE: &str = "FHE System is available!";
pub const MSG_AVAILABILITY_FAILED: &str = "Availability check failed";

/// Result of one ledger reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    /// Records that made it into the fetched set
    pub loaded: usize,
    /// Records whose fetch or decode failed
    pub skipped: usize,
    /// False if the session changed while loading and the results were dropped
    pub applied: bool,
}

/// How a verification request ended.
enum Verification {
    /// Already verified on-chain; nothing was decrypted
    Stored(u64),
    /// Decrypted and accepted by the contract just now
    Revealed(u64),
}

// ─── Ledger ─────────────────────────────────────────────────────────────────

/// Records in fetch order plus an id index.
#[derive(Default)]
struct Ledger {
    records: Vec<FitnessRecord>,
    index: HashMap<String, usize>,
}

impl Ledger {
    fn replace(&mut self, records: Vec<FitnessRecord>) {
        self.index.clear();
        for (pos, record) in records.iter().enumerate() {
            self.index.entry(record.id.clone()).or_insert(pos);
        }
        self.records = records;
    }

    fn clear(&mut self) {
        self.replace(Vec::new());
    }

    fn get(&self, id: &str) -> Option<&FitnessRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }
}

#[derive(Default)]
struct Session {
    account: Option<Address>,
    epoch: u64,
    fhe: FheStatus,
    contract_address: Option<String>,
    ledger: Ledger,
    stats: UserStats,
    form: UploadFormState,
}

impl Session {
    fn refresh_stats(&mut self) {
        self.stats = UserStats::compute(&self.ledger.records, self.account.as_ref());
    }
}

// ─── Flags and ids ──────────────────────────────────────────────────────────

/// Holds an in-flight flag; clears it on drop.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Counts one in-flight load.
struct CounterGuard<'a>(&'a AtomicUsize);

impl<'a> CounterGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for CounterGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Generates `fitness-<millis>` ids that strictly increase within the process.
#[derive(Default)]
pub struct RecordIdGenerator {
    last: AtomicU64,
}

impl RecordIdGenerator {
    pub fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        format!("fitness-{}", now.max(prev + 1))
    }
}

// ─── Coordinator ────────────────────────────────────────────────────────────

pub struct Coordinator<C, F> {
    contract: Arc<C>,
    fhe: Arc<F>,
    notifier: Notifier,
    session: Mutex<Session>,
    uploading: AtomicBool,
    decrypting: AtomicBool,
    refreshing: AtomicUsize,
    ids: RecordIdGenerator,
}

impl<C, F> Coordinator<C, F>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    pub fn new(contract: Arc<C>, fhe: Arc<F>, notifier: Notifier) -> Self {
        Self {
            contract,
            fhe,
            notifier,
            session: Mutex::new(Session::default()),
            uploading: AtomicBool::new(false),
            decrypting: AtomicBool::new(false),
            refreshing: AtomicUsize::new(0),
            ids: RecordIdGenerator::default(),
        }
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    /// Active account and current epoch, or `NotConnected` with a status.
    fn require_account(&self) -> Result<(Address, u64), WorkflowError> {
        match self.with_session(|s| s.account.clone().map(|a| (a, s.epoch))) {
            Some(found) => Ok(found),
            None => {
                self.notifier.error(MSG_CONNECT_WALLET);
                Err(WorkflowError::NotConnected)
            }
        }
    }

    fn require_fhe_ready(&self) -> Result<(), WorkflowError> {
        if self.with_session(|s| s.fhe) == FheStatus::Ready {
            Ok(())
        } else {
            self.notifier.error(MSG_FHE_NOT_READY);
            Err(WorkflowError::SubsystemNotReady)
        }
    }

    /// Contract address, fetched once and cached.
    async fn contract_address(&self) -> Result<String, WorkflowError> {
        if let Some(address) = self.with_session(|s| s.contract_address.clone()) {
            return Ok(address);
        }
        let address = self
            .contract
            .address()
            .await
            .map_err(WorkflowError::from_remote)?;
        tracing::debug!(contract = %address, "Resolved contract address");
        self.with_session(|s| s.contract_address = Some(address.clone()));
        Ok(address)
    }

    // ─── Wallet transitions ─────────────────────────────────────────────────

    /// Switch to `account`, then initialize FHE and load the ledger.
    ///
    /// Initialization and load failures are reported through the status
    /// channel; the load outcome is returned.
    pub async fn connect(&self, account: Address) -> Result<LoadOutcome, WorkflowError> {
        self.begin_session(&account);
        self.bootstrap().await
    }

    /// Make `account` the active one and start a new epoch. Returns the epoch.
    fn begin_session(&self, account: &Address) -> u64 {
        let epoch = self.with_session(|s| {
            s.account = Some(account.clone());
            s.epoch += 1;
            s.ledger.clear();
            s.refresh_stats();
            s.epoch
        });
        tracing::info!(account = %account, epoch, "Session started");
        epoch
    }

    async fn bootstrap(&self) -> Result<LoadOutcome, WorkflowError> {
        if let Err(e) = self.initialize_fhe().await {
            tracing::warn!(error = %e, "Continuing without FHE");
        }
        self.load_records().await
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.with_session(|s| s.epoch == epoch)
    }

    pub fn disconnect(&self) {
        let was_connected = self.with_session(|s| {
            s.epoch += 1;
            s.ledger.clear();
            let previous = s.account.take();
            s.refresh_stats();
            previous.is_some()
        });
        if was_connected {
            tracing::info!("Session ended");
        }
    }

    /// Follow a wallet feed until its sender is dropped.
    ///
    /// Account changes take effect as soon as they are seen. FHE setup and
    /// the initial load run in their own task, so a later transition never
    /// waits behind them.
    pub fn follow_wallet(
        self: Arc<Self>,
        mut wallet: watch::Receiver<Option<Address>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let account = wallet.borrow_and_update().clone();
                match account {
                    Some(account) => {
                        let epoch = self.begin_session(&account);
                        let coordinator = Arc::clone(&self);
                        tokio::spawn(async move {
                            if !coordinator.is_current(epoch) {
                                return;
                            }
                            if let Err(e) = coordinator.bootstrap().await {
                                tracing::warn!(error = %e, "Initial load failed");
                            }
                        });
                    }
                    None => self.disconnect(),
                }
                if wallet.changed().await.is_err() {
                    tracing::debug!("Wallet feed closed");
                    break;
                }
            }
        })
    }

    // ─── FHE ────────────────────────────────────────────────────────────────

    /// Bring the FHE instance up. No-op when already ready.
    pub async fn initialize_fhe(&self) -> Result<(), WorkflowError> {
        self.require_account()?;

        let previous = self.with_session(|s| {
            let previous = s.fhe;
            if previous == FheStatus::Uninitialized {
                s.fhe = FheStatus::Initializing;
            }
            previous
        });
        match previous {
            FheStatus::Ready => return Ok(()),
            FheStatus::Initializing => {
                return Err(WorkflowError::OperationInProgress("FHE initialization"))
            }
            FheStatus::Uninitialized => {}
        }

        match self.fhe.initialize().await {
            Ok(()) => {
                self.with_session(|s| s.fhe = FheStatus::Ready);
                tracing::info!("FHE instance ready");
                Ok(())
            }
            Err(e) => {
                self.with_session(|s| s.fhe = FheStatus::Uninitialized);
                tracing::error!(error = %e, "FHE initialization failed");
                self.notifier.error(MSG_FHE_INIT_FAILED);
                Err(WorkflowError::from_remote(e))
            }
        }
    }

    // ─── Ledger ─────────────────────────────────────────────────────────────

    /// Replace the ledger with the contract's current records.
    ///
    /// Records that fail to fetch or decode are skipped.
    pub async fn load_records(&self) -> Result<LoadOutcome, WorkflowError> {
        let (_, epoch) = self.require_account()?;
        let _refreshing = CounterGuard::enter(&self.refreshing);

        if let Err(e) = self.contract_address().await {
            tracing::warn!(error = %e, "Could not resolve contract address");
        }

        let ids = match self.contract.get_all_record_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list record ids");
                self.notifier.error(MSG_LOAD_FAILED);
                return Err(WorkflowError::from_remote(e));
            }
        };

        let contract = Arc::clone(&self.contract);
        let fetched: Vec<_> = futures_util::stream::iter(ids)
            .map(move |id| {
                let contract = Arc::clone(&contract);
                async move {
                    let data = contract.get_record_data(&id).await;
                    (id, data)
                }
            })
            .buffered(LOAD_CONCURRENCY)
            .collect()
            .await;

        let mut records = Vec::with_capacity(fetched.len());
        let mut skipped = 0;
        for (id, data) in fetched {
            let decoded = data
                .map_err(|e| e.to_string())
                .and_then(|data| FitnessRecord::from_chain(id.clone(), data).map_err(|e| e.to_string()));
            match decoded {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::warn!(record_id = %id, error = %error, "Skipping unreadable record");
                    skipped += 1;
                }
            }
        }

        let loaded = records.len();
        let applied = self.with_session(|s| {
            if s.epoch != epoch {
                return false;
            }
            s.ledger.replace(records);
            s.refresh_stats();
            true
        });

        if applied {
            tracing::info!(loaded, skipped, "Ledger reloaded");
        } else {
            tracing::debug!(loaded, "Discarding load from a previous session");
        }

        Ok(LoadOutcome {
            loaded,
            skipped,
            applied,
        })
    }

    // ─── Submit ─────────────────────────────────────────────────────────────

    /// Encrypt and submit a workout. Returns the new record id.
    pub async fn submit_workout(&self, form: WorkoutForm) -> Result<String, WorkflowError> {
        let (account, _) = self.require_account()?;
        self.with_session(|s| s.form.draft = form.clone());
        self.require_fhe_ready()?;

        let submission = match form.validated() {
            Ok(submission) => submission,
            Err(e) => {
                self.notifier.error(e.to_string());
                return Err(e);
            }
        };

        let Some(_uploading) = FlagGuard::acquire(&self.uploading) else {
            self.notifier.error("Upload already in progress");
            return Err(WorkflowError::OperationInProgress("Upload"));
        };

        let result = async {
            self.notifier.pending(MSG_ENCRYPTING);
            let contract_address = self.contract_address().await?;
            let id = self.ids.next_id();

            let input = self
                .fhe
                .encrypt(&contract_address, &account, submission.steps)
                .await
                .map_err(WorkflowError::from_remote)?;
            tracing::debug!(record_id = %id, "Steps encrypted");

            let tx = self
                .contract
                .create_record(&NewRecord {
                    id: id.clone(),
                    name: submission.name.clone(),
                    ciphertext: input.ciphertext,
                    proof: input.proof,
                    duration_minutes: submission.duration_minutes,
                    calories: submission.calories,
                    category: RECORD_CATEGORY.to_string(),
                })
                .await
                .map_err(WorkflowError::from_remote)?;

            self.notifier.pending(MSG_UPLOADING);
            let receipt = tx.wait().await.map_err(WorkflowError::from_remote)?;
            tracing::info!(record_id = %id, tx_hash = %receipt.tx_hash, "Workout recorded");
            Ok::<_, WorkflowError>(id)
        }
        .await;

        match result {
            Ok(id) => {
                self.notifier.success(MSG_UPLOADED);
                self.with_session(|s| s.form = UploadFormState::default());
                if let Err(e) = self.load_records().await {
                    tracing::warn!(error = %e, "Reload after upload failed");
                }
                Ok(id)
            }
            Err(e) => {
                tracing::error!(error = %e, "Upload failed");
                match &e {
                    WorkflowError::TransactionRejected => self.notifier.error(MSG_REJECTED),
                    WorkflowError::Remote(reason) => {
                        self.notifier.error(format!("Upload failed: {}", reason))
                    }
                    other => self.notifier.error(format!("Upload failed: {}", other)),
                }
                Err(e)
            }
        }
    }

    // ─── Decrypt and verify ─────────────────────────────────────────────────

    /// Reveal a record's step count on-chain.
    ///
    /// Returns the verified value, or `None` when another client verified
    /// the record first.
    pub async fn decrypt_and_verify(&self, id: &str) -> Result<Option<u64>, WorkflowError> {
        self.require_account()?;

        let Some(_decrypting) = FlagGuard::acquire(&self.decrypting) else {
            self.notifier.error("Verification already in progress");
            return Err(WorkflowError::OperationInProgress("Verification"));
        };

        let result: Result<Verification, WorkflowError> = async {
            let data = self
                .contract
                .get_record_data(id)
                .await
                .map_err(WorkflowError::from_remote)?;
            if data.is_verified {
                return Ok(Verification::Stored(data.decrypted_value));
            }

            self.require_fhe_ready()?;
            self.notifier.pending(MSG_VERIFYING);

            let handle = self
                .contract
                .get_encrypted_value_handle(id)
                .await
                .map_err(WorkflowError::from_remote)?;
            let contract_address = self.contract_address().await?;

            let contract = Arc::clone(&self.contract);
            let record_id = id.to_string();
            let submit: DecryptionSubmitter = Box::new(move |proof: DecryptionProof| {
                async move {
                    contract
                        .verify_decryption(&record_id, &proof.clear_values, &proof.proof)
                        .await?
                        .wait()
                        .await
                }
                .boxed()
            });

            let decrypted = self
                .fhe
                .verify_decryption(std::slice::from_ref(&handle), &contract_address, submit)
                .await
                .map_err(WorkflowError::from_verification)?;

            decrypted
                .clear_values
                .get(&handle)
                .copied()
                .map(Verification::Revealed)
                .ok_or_else(|| WorkflowError::Remote(format!("no clear value for handle {}", handle)))
        }
        .await;

        match result {
            Ok(Verification::Stored(value)) => {
                self.notifier.success(MSG_ALREADY_VERIFIED);
                Ok(Some(value))
            }
            Ok(Verification::Revealed(value)) => {
                tracing::info!(record_id = %id, "Steps verified");
                self.reload_quietly().await;
                self.notifier.success(MSG_VERIFIED);
                Ok(Some(value))
            }
            Err(WorkflowError::AlreadyVerified) => {
                tracing::info!(record_id = %id, "Record verified concurrently");
                self.reload_quietly().await;
                self.notifier.success(MSG_RACE_VERIFIED);
                Ok(None)
            }
            Err(e) => {
                tracing::error!(record_id = %id, error = %e, "Decryption failed");
                if !matches!(e, WorkflowError::SubsystemNotReady) {
                    self.notifier.error(MSG_DECRYPT_FAILED);
                }
                Err(e)
            }
        }
    }

    async fn reload_quietly(&self) {
        if let Err(e) = self.load_records().await {
            tracing::warn!(error = %e, "Reload after verification failed");
        }
    }

    // ─── Availability ───────────────────────────────────────────────────────

    pub async fn check_availability(&self) -> Result<bool, WorkflowError> {
        match self.contract.is_available().await {
            Ok(true) => {
                self.notifier.success(MSG_AVAILABLE);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                tracing::warn!(error = %e, "Availability check failed");
                self.notifier.error(MSG_AVAILABILITY_FAILED);
                Err(WorkflowError::from_remote(e))
            }
        }
    }

    // ─── Upload form ────────────────────────────────────────────────────────

    pub fn open_upload_form(&self) {
        self.with_session(|s| s.form.open = true);
    }

    /// Hide the form; the draft is kept.
    pub fn close_upload_form(&self) {
        self.with_session(|s| s.form.open = false);
    }

    // ─── Views ──────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        self.with_session(|s| SessionSnapshot {
            account: s.account.clone(),
            fhe: s.fhe,
            uploading: self.uploading.load(Ordering::Acquire),
            decrypting: self.decrypting.load(Ordering::Acquire),
            refreshing: self.refreshing.load(Ordering::Acquire) > 0,
            contract_address: s.contract_address.clone(),
            upload_form: s.form.clone(),
            record_count: s.ledger.records.len(),
        })
    }

    pub fn account(&self) -> Option<Address> {
        self.with_session(|s| s.account.clone())
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::Acquire)
    }

    pub fn is_decrypting(&self) -> bool {
        self.decrypting.load(Ordering::Acquire)
    }

    /// All records in fetch order.
    pub fn records(&self) -> Vec<FitnessRecord> {
        self.with_session(|s| s.ledger.records.clone())
    }

    pub fn record(&self, id: &str) -> Option<FitnessRecord> {
        self.with_session(|s| s.ledger.get(id).cloned())
    }

    /// Filtered and ranked leaderboard.
    pub fn leaderboard(&self, search: &str) -> Vec<FitnessRecord> {
        self.with_session(|s| {
            leaderboard::leaderboard(&s.ledger.records, search)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// The active account's own records; empty when disconnected.
    pub fn history(&self) -> Vec<FitnessRecord> {
        self.with_session(|s| match &s.account {
            Some(account) => leaderboard::history(&s.ledger.records, account)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        })
    }

    pub fn stats(&self) -> UserStats {
        self.with_session(|s| s.stats.clone())
    }

    pub fn status(&self) -> TransactionStatus {
        self.notifier.current()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_strictly_increase() {
        let ids = RecordIdGenerator::default();
        let parse = |id: String| -> u64 { id.trim_start_matches("fitness-").parse().unwrap() };
        let mut last = parse(ids.next_id());
        for _ in 0..1000 {
            let next = parse(ids.next_id());
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_record_id_format() {
        let id = RecordIdGenerator::default().next_id();
        assert!(id.starts_with("fitness-"));
        assert!(id["fitness-".len()..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_flag_guard_is_exclusive_and_releases() {
        let flag = AtomicBool::new(false);
        {
            let _held = FlagGuard::acquire(&flag).unwrap();
            assert!(FlagGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
        assert!(FlagGuard::acquire(&flag).is_some());
    }
}
