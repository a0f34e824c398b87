// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness record model: the contract's wire shape and the ledger entry.

use crate::models::account::{Address, AddressError};
use serde::{Deserialize, Serialize};

/// Public fields of a record as returned by the contract's `getRecordData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub name: String,
    /// Workout duration in minutes
    pub public_value1: u32,
    /// Calories burned
    pub public_value2: u32,
    /// Creation time (seconds since epoch)
    pub timestamp: u64,
    pub creator: String,
    pub is_verified: bool,
    /// Only meaningful when `is_verified` is set
    #[serde(default)]
    pub decrypted_value: u64,
}

/// Secret step count: either still encrypted on-chain or verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "steps", rename_all = "snake_case")]
pub enum StepCount {
    Encrypted,
    Verified(u64),
}

/// One workout entry in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessRecord {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub calories: u32,
    /// Seconds since epoch
    pub created_at: u64,
    pub creator: Address,
    pub steps: StepCount,
}

impl FitnessRecord {
    /// Build a ledger entry from contract data.
    ///
    /// A `decryptedValue` on an unverified record is ignored.
    pub fn from_chain(id: impl Into<String>, data: RecordData) -> Result<Self, AddressError> {
        let steps = if data.is_verified {
            StepCount::Verified(data.decrypted_value)
        } else {
            StepCount::Encrypted
        };

        Ok(Self {
            id: id.into(),
            name: data.name,
            duration_minutes: data.public_value1,
            calories: data.public_value2,
            created_at: data.timestamp,
            creator: Address::parse(&data.creator)?,
            steps,
        })
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.steps, StepCount::Verified(_))
    }

    pub fn verified_steps(&self) -> Option<u64> {
        match self.steps {
            StepCount::Verified(steps) => Some(steps),
            StepCount::Encrypted => None,
        }
    }

    /// Steps used for ranking; unverified records count as zero.
    pub fn effective_steps(&self) -> u64 {
        self.verified_steps().unwrap_or(0)
    }

    pub fn is_owned_by(&self, account: &Address) -> bool {
        &self.creator == account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(is_verified: bool, decrypted_value: u64) -> RecordData {
        RecordData {
            name: "Morning Run".to_string(),
            public_value1: 30,
            public_value2: 250,
            timestamp: 1_704_103_200,
            creator: "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string(),
            is_verified,
            decrypted_value,
        }
    }

    #[test]
    fn test_unverified_ignores_residual_value() {
        let record = FitnessRecord::from_chain("fitness-1", data(false, 9999)).unwrap();
        assert_eq!(record.steps, StepCount::Encrypted);
        assert_eq!(record.effective_steps(), 0);
        assert!(!record.is_verified());
    }

    #[test]
    fn test_verified_carries_value() {
        let record = FitnessRecord::from_chain("fitness-1", data(true, 8421)).unwrap();
        assert_eq!(record.verified_steps(), Some(8421));
        assert_eq!(record.duration_minutes, 30);
        assert_eq!(record.calories, 250);
        assert_eq!(
            record.creator.to_string(),
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let json = serde_json::json!({
            "name": "Gym",
            "publicValue1": 45,
            "publicValue2": 300,
            "timestamp": 1,
            "creator": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "isVerified": true,
            "decryptedValue": 12
        });
        let parsed: RecordData = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.public_value1, 45);
        assert!(parsed.is_verified);
        assert_eq!(parsed.decrypted_value, 12);
    }

    #[test]
    fn test_bad_creator_is_rejected() {
        let mut bad = data(false, 0);
        bad.creator = "nobody".to_string();
        assert!(FitnessRecord::from_chain("fitness-1", bad).is_err());
    }
}
