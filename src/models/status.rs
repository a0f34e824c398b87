// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Transaction status shown to the user.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum StatusKind {
    Pending,
    Success,
    Error,
}

/// The single active notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TransactionStatus {
    pub visible: bool,
    pub kind: StatusKind,
    pub message: String,
}

impl TransactionStatus {
    pub fn visible(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            visible: true,
            kind,
            message: message.into(),
        }
    }

    /// The cleared slot.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            kind: StatusKind::Pending,
            message: String::new(),
        }
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        Self::hidden()
    }
}
