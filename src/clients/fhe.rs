// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FHE SDK interface: input encryption and verified public decryption.

use crate::clients::contract::{ContractError, TxReceipt};
use crate::models::Address;
use alloy_primitives::U256;
use alloy_sol_types::SolValue;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;

/// Size of one ABI-encoded `uint256` word.
const WORD_LEN: usize = 32;

/// Encrypted input plus its proof of correct encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub ciphertext: Vec<u8>,
    pub proof: Vec<u8>,
}

/// What the SDK hands the submit callback during verified decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionProof {
    /// ABI-encoded clear values, one word per handle
    pub clear_values: Vec<u8>,
    pub proof: Vec<u8>,
}

/// Outcome of a verified decryption, keyed by ciphertext handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptionResult {
    pub clear_values: HashMap<String, u64>,
}

/// Callback that puts the clear values and proof on-chain.
///
/// Invoked by the SDK exactly once, inside `verify_decryption`.
pub type DecryptionSubmitter =
    Box<dyn FnOnce(DecryptionProof) -> BoxFuture<'static, Result<TxReceipt, ContractError>> + Send>;

pub trait FheSdk: Send + Sync {
    /// Fetch public keys and set up the instance.
    fn initialize(&self) -> impl Future<Output = Result<(), FheError>> + Send;

    fn encrypt(
        &self,
        contract_address: &str,
        account: &Address,
        value: u64,
    ) -> impl Future<Output = Result<EncryptedInput, FheError>> + Send;

    /// Decrypt `handles` off-chain, prove it, and submit via `submit`.
    fn verify_decryption(
        &self,
        handles: &[String],
        contract_address: &str,
        submit: DecryptionSubmitter,
    ) -> impl Future<Output = Result<DecryptionResult, FheError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FheError {
    #[error("FHE initialization failed: {0}")]
    Init(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error(transparent)]
    Submission(#[from] ContractError),
}

/// ABI-encode values as consecutive `uint256` words.
pub fn encode_clear_values(values: &[u64]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|value| U256::from(*value).abi_encode())
        .collect()
}

/// Decode words produced by [`encode_clear_values`].
///
/// Rejects trailing bytes and values that do not fit in a `u64`.
pub fn decode_clear_values(encoded: &[u8]) -> Result<Vec<u64>, FheError> {
    if encoded.len() % WORD_LEN != 0 {
        return Err(FheError::Decrypt(format!(
            "clear values length {} is not a multiple of {}",
            encoded.len(),
            WORD_LEN
        )));
    }

    encoded
        .chunks(WORD_LEN)
        .map(|word| {
            let value = U256::abi_decode(word)
                .map_err(|e| FheError::Decrypt(format!("bad clear value: {}", e)))?;
            u64::try_from(value)
                .map_err(|_| FheError::Decrypt("clear value overflows u64".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_word_aligned() {
        let encoded = encode_clear_values(&[8421]);
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[30..], &[0x20, 0xE5]);
        assert_eq!(decode_clear_values(&encoded).unwrap(), vec![8421]);
    }

    #[test]
    fn test_multiple_values_keep_order() {
        let encoded = encode_clear_values(&[1, u64::MAX]);
        assert_eq!(encoded.len(), 64);
        assert_eq!(decode_clear_values(&encoded).unwrap(), vec![1, u64::MAX]);
    }

    #[test]
    fn test_decode_rejects_ragged_input() {
        assert!(decode_clear_values(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_decode_rejects_overflow() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(decode_clear_values(&word).is_err());
    }

    #[test]
    fn test_submission_error_is_transparent() {
        let err = FheError::from(ContractError::Reverted("Data already verified".into()));
        assert_eq!(err.to_string(), "execution reverted: Data already verified");
    }
}
