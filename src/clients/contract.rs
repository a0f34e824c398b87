// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness leaderboard contract interface.
//!
//! Reads go through [`ContractReader`], transactions through
//! [`ContractWriter`]. Writes return a [`PendingTransaction`] whose
//! confirmation is awaited separately.

use crate::models::RecordData;
use futures_util::future::BoxFuture;
use std::future::Future;

/// Category label stored with every workout.
pub const RECORD_CATEGORY: &str = "Fitness Activity Data";

/// Read-only contract calls.
pub trait ContractReader: Send + Sync {
    /// Deployed contract address (FHE inputs are bound to it).
    fn address(&self) -> impl Future<Output = Result<String, ContractError>> + Send;

    fn get_all_record_ids(&self) -> impl Future<Output = Result<Vec<String>, ContractError>> + Send;

    fn get_record_data(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<RecordData, ContractError>> + Send;

    /// Opaque handle of the encrypted step count.
    fn get_encrypted_value_handle(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<String, ContractError>> + Send;

    fn is_available(&self) -> impl Future<Output = Result<bool, ContractError>> + Send;
}

/// State-changing contract calls.
pub trait ContractWriter: Send + Sync {
    fn create_record(
        &self,
        record: &NewRecord,
    ) -> impl Future<Output = Result<PendingTransaction, ContractError>> + Send;

    /// Submit decrypted clear values plus the decryption proof.
    fn verify_decryption(
        &self,
        id: &str,
        clear_values: &[u8],
        proof: &[u8],
    ) -> impl Future<Output = Result<PendingTransaction, ContractError>> + Send;
}

/// The full contract surface the coordinator needs.
pub trait LeaderboardContract: ContractReader + ContractWriter {}

impl<T: ContractReader + ContractWriter> LeaderboardContract for T {}

/// Arguments of the contract's record-creation entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub id: String,
    pub name: String,
    pub ciphertext: Vec<u8>,
    pub proof: Vec<u8>,
    pub duration_minutes: u32,
    pub calories: u32,
    pub category: String,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// A submitted transaction awaiting confirmation.
pub struct PendingTransaction {
    pub hash: String,
    confirmation: BoxFuture<'static, Result<TxReceipt, ContractError>>,
}

impl PendingTransaction {
    pub fn new<F>(hash: impl Into<String>, confirmation: F) -> Self
    where
        F: Future<Output = Result<TxReceipt, ContractError>> + Send + 'static,
    {
        Self {
            hash: hash.into(),
            confirmation: Box::pin(confirmation),
        }
    }

    /// Wait until the transaction is mined (or fails).
    pub async fn wait(self) -> Result<TxReceipt, ContractError> {
        self.confirmation.await
    }
}

impl std::fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("transaction not confirmed: {0}")]
    Unconfirmed(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}
