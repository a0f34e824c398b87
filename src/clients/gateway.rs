// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP clients for the contract gateway and the FHE relayer.
//!
//! Handles:
//! - Contract reads and transaction submission via the gateway
//! - Receipt polling until a transaction is mined
//! - Input encryption and verified public decryption via the relayer
//!
//! Error bodies are passed through verbatim so revert reasons survive for
//! classification in `crate::error`.

use crate::clients::contract::{
    ContractError, ContractReader, ContractWriter, NewRecord, PendingTransaction, TxReceipt,
};
use crate::clients::fhe::{DecryptionProof, DecryptionResult, DecryptionSubmitter, EncryptedInput, FheError, FheSdk};
use crate::clients::{from_hex, to_hex};
use crate::models::{Address, RecordData};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Check response status and parse the JSON body.
///
/// Returns the raw error text on failure; callers wrap it in their own
/// error type.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Result<reqwest::Response>,
) -> Result<T, String> {
    let response = response.map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {}: {}", status, body));
    }

    response
        .json()
        .await
        .map_err(|e| format!("JSON parse error: {}", e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract gateway
// ─────────────────────────────────────────────────────────────────────────────

/// Contract gateway client.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    max_attempts: u32,
}

#[derive(Deserialize)]
struct AddressResponse {
    address: String,
}

#[derive(Deserialize)]
struct RecordIdsResponse {
    ids: Vec<String>,
}

#[derive(Deserialize)]
struct HandleResponse {
    handle: String,
}

#[derive(Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmittedResponse {
    tx_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxStatusResponse {
    status: TxState,
    block_number: Option<u64>,
    reason: Option<String>,
}

#[derive(Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum TxState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRecordBody<'a> {
    id: &'a str,
    name: &'a str,
    encrypted_value: String,
    input_proof: String,
    public_value1: u32,
    public_value2: u32,
    description: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyDecryptionBody {
    abi_encoded_clear_values: String,
    decryption_proof: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            poll_interval,
            max_attempts,
        }
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/records/{}", self.base_url, urlencoding::encode(id))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ContractError> {
        read_json(self.http.get(url).send().await)
            .await
            .map_err(ContractError::Rpc)
    }

    /// Submit a transaction and hand back a receipt poller.
    async fn submit<B: Serialize>(&self, url: &str, body: &B) -> Result<PendingTransaction, ContractError> {
        let submitted: SubmittedResponse = read_json(self.http.post(url).json(body).send().await)
            .await
            .map_err(ContractError::Rpc)?;

        tracing::debug!(tx_hash = %submitted.tx_hash, "Transaction submitted");

        let poller = self.clone();
        let hash = submitted.tx_hash.clone();
        Ok(PendingTransaction::new(submitted.tx_hash, async move {
            poller.wait_for_receipt(&hash).await
        }))
    }

    /// Poll the gateway until the transaction is mined or fails.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, ContractError> {
        let url = format!("{}/tx/{}", self.base_url, urlencoding::encode(tx_hash));

        for attempt in 1..=self.max_attempts {
            let status: TxStatusResponse = self.get(&url).await?;
            match status.status {
                TxState::Confirmed => {
                    tracing::info!(tx_hash, block = ?status.block_number, "Transaction confirmed");
                    return Ok(TxReceipt {
                        tx_hash: tx_hash.to_string(),
                        block_number: status.block_number,
                    });
                }
                TxState::Failed => {
                    let reason = status.reason.unwrap_or_else(|| "unknown reason".to_string());
                    tracing::warn!(tx_hash, reason = %reason, "Transaction failed");
                    return Err(ContractError::Reverted(reason));
                }
                TxState::Pending => {
                    tracing::debug!(tx_hash, attempt, "Transaction pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(ContractError::Unconfirmed(format!(
            "{} still pending after {} polls",
            tx_hash, self.max_attempts
        )))
    }
}

impl ContractReader for GatewayClient {
    async fn address(&self) -> Result<String, ContractError> {
        let response: AddressResponse = self.get(&format!("{}/address", self.base_url)).await?;
        Ok(response.address)
    }

    async fn get_all_record_ids(&self) -> Result<Vec<String>, ContractError> {
        let response: RecordIdsResponse = self.get(&format!("{}/records", self.base_url)).await?;
        Ok(response.ids)
    }

    async fn get_record_data(&self, id: &str) -> Result<RecordData, ContractError> {
        self.get(&self.record_url(id)).await
    }

    async fn get_encrypted_value_handle(&self, id: &str) -> Result<String, ContractError> {
        let response: HandleResponse = self.get(&format!("{}/handle", self.record_url(id))).await?;
        Ok(response.handle)
    }

    async fn is_available(&self) -> Result<bool, ContractError> {
        let response: AvailabilityResponse =
            self.get(&format!("{}/available", self.base_url)).await?;
        Ok(response.available)
    }
}

impl ContractWriter for GatewayClient {
    async fn create_record(&self, record: &NewRecord) -> Result<PendingTransaction, ContractError> {
        let body = CreateRecordBody {
            id: &record.id,
            name: &record.name,
            encrypted_value: to_hex(&record.ciphertext),
            input_proof: to_hex(&record.proof),
            public_value1: record.duration_minutes,
            public_value2: record.calories,
            description: &record.category,
        };
        self.submit(&format!("{}/records", self.base_url), &body).await
    }

    async fn verify_decryption(
        &self,
        id: &str,
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<PendingTransaction, ContractError> {
        let body = VerifyDecryptionBody {
            abi_encoded_clear_values: to_hex(clear_values),
            decryption_proof: to_hex(proof),
        };
        self.submit(&format!("{}/verify", self.record_url(id)), &body)
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FHE relayer
// ─────────────────────────────────────────────────────────────────────────────

/// FHE relayer client.
#[derive(Clone)]
pub struct RelayerClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyUrlResponse {
    public_key_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncryptBody<'a> {
    contract_address: &'a str,
    user_address: String,
    value: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncryptResponse {
    handle: String,
    input_proof: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecryptBody<'a> {
    handles: &'a [String],
    contract_address: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecryptResponse {
    /// handle -> decimal string (uint256)
    clear_values: HashMap<String, String>,
    abi_encoded_clear_values: String,
    decryption_proof: String,
}

impl RelayerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl FheSdk for RelayerClient {
    async fn initialize(&self) -> Result<(), FheError> {
        let url = format!("{}/v1/keyurl", self.base_url);
        let keys: KeyUrlResponse = read_json(self.http.get(&url).send().await)
            .await
            .map_err(FheError::Init)?;
        tracing::info!(key_id = %keys.public_key_id, "FHE relayer keys fetched");
        Ok(())
    }

    async fn encrypt(
        &self,
        contract_address: &str,
        account: &Address,
        value: u64,
    ) -> Result<EncryptedInput, FheError> {
        let url = format!("{}/v1/input-proof", self.base_url);
        let body = EncryptBody {
            contract_address,
            user_address: account.to_string(),
            value,
        };
        let response: EncryptResponse = read_json(self.http.post(&url).json(&body).send().await)
            .await
            .map_err(FheError::Encrypt)?;

        Ok(EncryptedInput {
            ciphertext: from_hex(&response.handle)
                .map_err(|e| FheError::Encrypt(format!("bad handle: {}", e)))?,
            proof: from_hex(&response.input_proof)
                .map_err(|e| FheError::Encrypt(format!("bad input proof: {}", e)))?,
        })
    }

    async fn verify_decryption(
        &self,
        handles: &[String],
        contract_address: &str,
        submit: DecryptionSubmitter,
    ) -> Result<DecryptionResult, FheError> {
        let url = format!("{}/v1/public-decrypt", self.base_url);
        let body = DecryptBody {
            handles,
            contract_address,
        };
        let response: DecryptResponse = read_json(self.http.post(&url).json(&body).send().await)
            .await
            .map_err(FheError::Decrypt)?;

        let clear_values = response
            .clear_values
            .into_iter()
            .map(|(handle, raw)| {
                raw.parse::<u64>()
                    .map(|value| (handle, value))
                    .map_err(|_| FheError::Decrypt(format!("clear value out of range: {}", raw)))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        let proof = DecryptionProof {
            clear_values: from_hex(&response.abi_encoded_clear_values)
                .map_err(|e| FheError::Decrypt(format!("bad clear values: {}", e)))?,
            proof: from_hex(&response.decryption_proof)
                .map_err(|e| FheError::Decrypt(format!("bad decryption proof: {}", e)))?,
        };

        let receipt = submit(proof).await?;
        tracing::info!(tx_hash = %receipt.tx_hash, "Decryption proof accepted on-chain");

        Ok(DecryptionResult { clear_values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_status_parses() {
        let status: TxStatusResponse = serde_json::from_value(serde_json::json!({
            "status": "failed",
            "blockNumber": null,
            "reason": "Data already verified"
        }))
        .unwrap();
        assert!(status.status == TxState::Failed);
        assert_eq!(status.reason.as_deref(), Some("Data already verified"));
    }

    #[test]
    fn test_create_record_body_shape() {
        let body = CreateRecordBody {
            id: "fitness-1",
            name: "Run",
            encrypted_value: to_hex(&[0xab, 0xcd]),
            input_proof: to_hex(&[0x01]),
            public_value1: 30,
            public_value2: 250,
            description: crate::clients::RECORD_CATEGORY,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["encryptedValue"], "0xabcd");
        assert_eq!(json["publicValue1"], 30);
        assert_eq!(json["description"], "Fitness Activity Data");
    }

    #[test]
    fn test_record_url_escapes_id() {
        let client = GatewayClient::new("http://gw", Duration::from_millis(10), 1);
        assert_eq!(client.record_url("a/b"), "http://gw/records/a%2Fb");
    }
}
