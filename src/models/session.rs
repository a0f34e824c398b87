// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session state as exposed to the frontend.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Address, WorkoutForm};

/// Readiness of the FHE instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum FheStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Upload modal state: open flag plus the last draft typed into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFormState {
    pub open: bool,
    pub draft: WorkoutForm,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub account: Option<Address>,
    pub fhe: FheStatus,
    pub uploading: bool,
    pub decrypting: bool,
    pub refreshing: bool,
    pub contract_address: Option<String>,
    pub upload_form: UploadFormState,
    pub record_count: usize,
}
