// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process stand-ins for the contract and the FHE SDK.
//!
//! Both sides share a [`MemoryVault`] that maps ciphertext handles to
//! plaintexts, so values encrypted by [`MemoryFhe`] can later be decrypted
//! and checked by [`MemoryContract`]. Faults can be injected per call site.
//! Used by offline mode and the test suite.

use crate::clients::contract::{
    ContractError, ContractReader, ContractWriter, NewRecord, PendingTransaction, TxReceipt,
};
use crate::clients::fhe::{
    decode_clear_values, encode_clear_values, DecryptionProof, DecryptionResult,
    DecryptionSubmitter, EncryptedInput, FheError, FheSdk,
};
use crate::clients::{from_hex, to_hex};
use crate::models::{Address, RecordData};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default address reported by [`MemoryContract`].
pub const MEMORY_CONTRACT_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

/// Shared plaintext store plus a journal of collaborator calls.
#[derive(Default)]
pub struct MemoryVault {
    plaintexts: Mutex<HashMap<String, u64>>,
    journal: Mutex<Vec<String>>,
}

impl MemoryVault {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn store(&self, handle: &str, value: u64) {
        self.plaintexts.lock().await.insert(handle.to_string(), value);
    }

    async fn lookup(&self, handle: &str) -> Option<u64> {
        self.plaintexts.lock().await.get(handle).copied()
    }

    async fn record(&self, event: impl Into<String>) {
        self.journal.lock().await.push(event.into());
    }

    /// Ordered list of calls made against both collaborators.
    pub async fn journal(&self) -> Vec<String> {
        self.journal.lock().await.clone()
    }
}

/// Digest binding handles to their clear values.
fn decryption_digest(handles: &[String], clear_values: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for handle in handles {
        hasher.update(handle.as_bytes());
    }
    hasher.update(clear_values);
    hasher.finalize().to_vec()
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Injectable contract failures. `Some(msg)` makes that call fail with `msg`.
#[derive(Debug, Default, Clone)]
pub struct ContractFaults {
    pub address: Option<String>,
    pub list_ids: Option<String>,
    /// Record ids whose `get_record_data` fails
    pub unreadable: HashSet<String>,
    pub handle: Option<String>,
    pub create: Option<String>,
    /// Transaction is accepted but reverts while mining
    pub confirm: Option<String>,
    pub verify: Option<String>,
    pub availability: Option<String>,
    /// Delay before `get_all_record_ids` answers
    pub list_delay: Option<Duration>,
}

struct StoredRecord {
    data: RecordData,
    handle: String,
}

#[derive(Default)]
struct ChainState {
    order: Vec<String>,
    records: HashMap<String, StoredRecord>,
    available: bool,
}

/// In-memory leaderboard contract.
pub struct MemoryContract {
    address: String,
    /// Account that signs write transactions
    signer: Mutex<String>,
    vault: Arc<MemoryVault>,
    state: Mutex<ChainState>,
    faults: Mutex<ContractFaults>,
    tx_counter: AtomicU64,
    create_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryContract {
    pub fn new(vault: Arc<MemoryVault>) -> Self {
        Self {
            address: MEMORY_CONTRACT_ADDRESS.to_string(),
            signer: Mutex::new(String::new()),
            vault,
            state: Mutex::new(ChainState {
                available: true,
                ..ChainState::default()
            }),
            faults: Mutex::new(ContractFaults::default()),
            tx_counter: AtomicU64::new(0),
            create_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Set the account used as `creator` for new records.
    pub async fn set_signer(&self, account: &Address) {
        *self.signer.lock().await = account.to_string();
    }

    /// Adjust injected faults.
    pub async fn configure(&self, f: impl FnOnce(&mut ContractFaults)) {
        f(&mut *self.faults.lock().await);
    }

    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    /// Insert a record directly, as if created by another client.
    pub async fn seed_record(&self, id: &str, data: RecordData, steps: u64) {
        let handle = to_hex(&Sha256::digest(format!("seed:{}", id).as_bytes()));
        self.vault.store(&handle, steps).await;

        let mut state = self.state.lock().await;
        if !state.records.contains_key(id) {
            state.order.push(id.to_string());
        }
        state
            .records
            .insert(id.to_string(), StoredRecord { data, handle });
    }

    /// Mark a record verified out of band (another client won the race).
    pub async fn force_verified(&self, id: &str, steps: u64) {
        if let Some(record) = self.state.lock().await.records.get_mut(id) {
            record.data.is_verified = true;
            record.data.decrypted_value = steps;
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn next_tx_hash(&self) -> String {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        to_hex(&Sha256::digest(n.to_be_bytes()))
    }

    /// Build a transaction that is already mined, or reverts on confirmation.
    fn settled(&self, revert: Option<String>) -> PendingTransaction {
        let hash = self.next_tx_hash();
        let receipt_hash = hash.clone();
        let block = self.tx_counter.load(Ordering::SeqCst);
        PendingTransaction::new(hash, async move {
            match revert {
                Some(reason) => Err(ContractError::Reverted(reason)),
                None => Ok(TxReceipt {
                    tx_hash: receipt_hash,
                    block_number: Some(block),
                }),
            }
        })
    }
}

impl ContractReader for MemoryContract {
    async fn address(&self) -> Result<String, ContractError> {
        if let Some(msg) = self.faults.lock().await.address.clone() {
            return Err(ContractError::Rpc(msg));
        }
        Ok(self.address.clone())
    }

    async fn get_all_record_ids(&self) -> Result<Vec<String>, ContractError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let (fault, delay) = {
            let faults = self.faults.lock().await;
            (faults.list_ids.clone(), faults.list_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = fault {
            return Err(ContractError::Rpc(msg));
        }
        Ok(self.state.lock().await.order.clone())
    }

    async fn get_record_data(&self, id: &str) -> Result<RecordData, ContractError> {
        if self.faults.lock().await.unreadable.contains(id) {
            return Err(ContractError::Rpc(format!("call reverted for {}", id)));
        }
        self.state
            .lock()
            .await
            .records
            .get(id)
            .map(|r| r.data.clone())
            .ok_or_else(|| ContractError::RecordNotFound(id.to_string()))
    }

    async fn get_encrypted_value_handle(&self, id: &str) -> Result<String, ContractError> {
        if let Some(msg) = self.faults.lock().await.handle.clone() {
            return Err(ContractError::Rpc(msg));
        }
        self.state
            .lock()
            .await
            .records
            .get(id)
            .map(|r| r.handle.clone())
            .ok_or_else(|| ContractError::RecordNotFound(id.to_string()))
    }

    async fn is_available(&self) -> Result<bool, ContractError> {
        if let Some(msg) = self.faults.lock().await.availability.clone() {
            return Err(ContractError::Rpc(msg));
        }
        Ok(self.state.lock().await.available)
    }
}

impl ContractWriter for MemoryContract {
    async fn create_record(&self, record: &NewRecord) -> Result<PendingTransaction, ContractError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.vault.record(format!("create_record:{}", record.id)).await;

        let (create_fault, confirm_fault) = {
            let faults = self.faults.lock().await;
            (faults.create.clone(), faults.confirm.clone())
        };
        if let Some(msg) = create_fault {
            return Err(ContractError::Rpc(msg));
        }
        if confirm_fault.is_some() {
            return Ok(self.settled(confirm_fault));
        }

        let creator = self.signer.lock().await.clone();
        let handle = to_hex(&record.ciphertext);

        let mut state = self.state.lock().await;
        if state.records.contains_key(&record.id) {
            return Err(ContractError::Reverted("Record already exists".to_string()));
        }
        state.order.push(record.id.clone());
        state.records.insert(
            record.id.clone(),
            StoredRecord {
                data: RecordData {
                    name: record.name.clone(),
                    public_value1: record.duration_minutes,
                    public_value2: record.calories,
                    timestamp: chrono::Utc::now().timestamp().max(0) as u64,
                    creator,
                    is_verified: false,
                    decrypted_value: 0,
                },
                handle,
            },
        );
        drop(state);

        Ok(self.settled(None))
    }

    async fn verify_decryption(
        &self,
        id: &str,
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<PendingTransaction, ContractError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.vault.record(format!("verify_decryption:{}", id)).await;

        if let Some(msg) = self.faults.lock().await.verify.clone() {
            return Err(ContractError::Reverted(msg));
        }

        let mut state = self.state.lock().await;
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| ContractError::RecordNotFound(id.to_string()))?;

        if record.data.is_verified {
            return Err(ContractError::Reverted("Data already verified".to_string()));
        }

        let expected = decryption_digest(std::slice::from_ref(&record.handle), clear_values);
        if expected != proof {
            return Err(ContractError::Reverted("Invalid decryption proof".to_string()));
        }

        let values = decode_clear_values(clear_values)
            .map_err(|e| ContractError::Reverted(e.to_string()))?;
        let value = values
            .first()
            .copied()
            .ok_or_else(|| ContractError::Reverted("Missing clear value".to_string()))?;

        record.data.is_verified = true;
        record.data.decrypted_value = value;
        drop(state);

        Ok(self.settled(None))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FHE SDK
// ─────────────────────────────────────────────────────────────────────────────

/// Injectable FHE failures.
#[derive(Debug, Default, Clone)]
pub struct FheFaults {
    pub init: Option<String>,
    pub encrypt: Option<String>,
    pub decrypt: Option<String>,
}

/// In-memory FHE SDK backed by the shared vault.
pub struct MemoryFhe {
    vault: Arc<MemoryVault>,
    initialized: Mutex<bool>,
    faults: Mutex<FheFaults>,
    counter: AtomicU64,
    init_calls: AtomicUsize,
    encrypt_calls: AtomicUsize,
    decrypt_requests: AtomicUsize,
}

impl MemoryFhe {
    pub fn new(vault: Arc<MemoryVault>) -> Self {
        Self {
            vault,
            initialized: Mutex::new(false),
            faults: Mutex::new(FheFaults::default()),
            counter: AtomicU64::new(0),
            init_calls: AtomicUsize::new(0),
            encrypt_calls: AtomicUsize::new(0),
            decrypt_requests: AtomicUsize::new(0),
        }
    }

    pub async fn configure(&self, f: impl FnOnce(&mut FheFaults)) {
        f(&mut *self.faults.lock().await);
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    pub fn decrypt_requests(&self) -> usize {
        self.decrypt_requests.load(Ordering::SeqCst)
    }
}

impl FheSdk for MemoryFhe {
    async fn initialize(&self) -> Result<(), FheError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.faults.lock().await.init.clone() {
            return Err(FheError::Init(msg));
        }
        *self.initialized.lock().await = true;
        Ok(())
    }

    async fn encrypt(
        &self,
        contract_address: &str,
        account: &Address,
        value: u64,
    ) -> Result<EncryptedInput, FheError> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.vault.record("encrypt").await;

        if !*self.initialized.lock().await {
            return Err(FheError::Encrypt("instance not initialized".to_string()));
        }
        if let Some(msg) = self.faults.lock().await.encrypt.clone() {
            return Err(FheError::Encrypt(msg));
        }

        let nonce = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(contract_address.as_bytes());
        hasher.update(account.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let ciphertext = hasher.finalize().to_vec();

        self.vault.store(&to_hex(&ciphertext), value).await;

        let mut material = ciphertext.clone();
        material.extend_from_slice(b"input-proof");
        let proof = Sha256::digest(&material).to_vec();
        Ok(EncryptedInput { ciphertext, proof })
    }

    async fn verify_decryption(
        &self,
        handles: &[String],
        _contract_address: &str,
        submit: DecryptionSubmitter,
    ) -> Result<DecryptionResult, FheError> {
        self.decrypt_requests.fetch_add(1, Ordering::SeqCst);
        self.vault.record("decrypt").await;

        if let Some(msg) = self.faults.lock().await.decrypt.clone() {
            return Err(FheError::Decrypt(msg));
        }

        let mut clear_values = HashMap::new();
        let mut ordered = Vec::with_capacity(handles.len());
        for handle in handles {
            // Reject handles that are not well-formed before touching the vault.
            from_hex(handle).map_err(|e| FheError::Decrypt(format!("bad handle: {}", e)))?;
            let value = self
                .vault
                .lookup(handle)
                .await
                .ok_or_else(|| FheError::Decrypt(format!("unknown handle {}", handle)))?;
            clear_values.insert(handle.clone(), value);
            ordered.push(value);
        }

        let encoded = encode_clear_values(&ordered);
        let proof = decryption_digest(handles, &encoded);

        submit(DecryptionProof {
            clear_values: encoded,
            proof,
        })
        .await?;

        Ok(DecryptionResult { clear_values })
    }
}
