// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External collaborators: the leaderboard contract and the FHE SDK.
//!
//! `gateway` talks to real services over HTTP; `memory` provides in-process
//! stand-ins for offline mode and tests.

pub mod contract;
pub mod fhe;
pub mod gateway;
pub mod memory;

pub use contract::{
    ContractError, ContractReader, ContractWriter, LeaderboardContract, NewRecord, PendingTransaction, TxReceipt,
    RECORD_CATEGORY,
};
pub use fhe::{DecryptionProof, DecryptionResult, DecryptionSubmitter, EncryptedInput, FheError, FheSdk};
pub use gateway::{GatewayClient, RelayerClient};
pub use memory::{MemoryContract, MemoryFhe, MemoryVault};

/// Format bytes as `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse `0x`-prefixed (or bare) hex.
pub fn from_hex(raw: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
}
