// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the workflow coordinator and the HTTP API.
//!
//! Collaborators (contract gateway, FHE relayer, wallet) only report opaque
//! messages, so a couple of outcomes are recognised by substring. All of that
//! matching lives here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

/// Marker in wallet/contract errors when the user declined the prompt.
pub const USER_REJECTED_MARKER: &str = "user rejected";

/// Marker in contract errors when a record was verified by someone else first.
pub const ALREADY_VERIFIED_MARKER: &str = "already verified";

/// Returns true if the message reports a user-declined wallet prompt.
pub fn is_user_rejection(message: &str) -> bool {
    message.to_lowercase().contains(USER_REJECTED_MARKER)
}

/// Returns true if the message reports a record that is already verified.
pub fn is_already_verified(message: &str) -> bool {
    message.to_lowercase().contains(ALREADY_VERIFIED_MARKER)
}

/// Failure of a coordinator operation.
///
/// Every variant is also surfaced to the user through the status channel;
/// the `Result` is for callers that want to branch on the outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Encryption subsystem not ready")]
    SubsystemNotReady,

    #[error("Invalid workout: {0}")]
    Validation(String),

    #[error("Transaction rejected")]
    TransactionRejected,

    #[error("Record already verified")]
    AlreadyVerified,

    #[error("{0} already in progress")]
    OperationInProgress(&'static str),

    #[error("{0}")]
    Remote(String),
}

impl WorkflowError {
    /// Classify an opaque collaborator error by its message.
    pub fn from_remote(err: impl Display) -> Self {
        let message = err.to_string();
        if is_user_rejection(&message) {
            WorkflowError::TransactionRejected
        } else {
            WorkflowError::Remote(message)
        }
    }

    /// Like [`from_remote`](Self::from_remote), but also recognises a
    /// verification that lost the race to another client.
    ///
    /// Only the decryption submit path may use this; anywhere else the
    /// phrase is an ordinary revert reason.
    pub fn from_verification(err: impl Display) -> Self {
        let message = err.to_string();
        if is_already_verified(&message) {
            WorkflowError::AlreadyVerified
        } else {
            Self::from_remote(message)
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotConnected | WorkflowError::SubsystemNotReady => {
                AppError::Precondition(err.to_string())
            }
            WorkflowError::Validation(msg) => AppError::BadRequest(msg),
            WorkflowError::TransactionRejected
            | WorkflowError::AlreadyVerified
            | WorkflowError::OperationInProgress(_) => AppError::Conflict(err.to_string()),
            WorkflowError::Remote(msg) => AppError::Upstream(msg),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Precondition(msg) => (
                StatusCode::PRECONDITION_FAILED,
                "precondition_failed",
                Some(msg.clone()),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream collaborator error");
                (StatusCode::BAD_GATEWAY, "upstream_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_remote_detects_rejection() {
        let err = WorkflowError::from_remote("MetaMask Tx Signature: User rejected transaction");
        assert_eq!(err, WorkflowError::TransactionRejected);
    }

    #[test]
    fn test_from_verification_detects_already_verified() {
        let err = WorkflowError::from_verification("execution reverted: Data already verified");
        assert_eq!(err, WorkflowError::AlreadyVerified);
    }

    #[test]
    fn test_from_remote_keeps_already_verified_reason() {
        let err = WorkflowError::from_remote("execution reverted: Record already verified");
        assert_eq!(
            err,
            WorkflowError::Remote("execution reverted: Record already verified".to_string())
        );
    }

    #[test]
    fn test_from_remote_keeps_opaque_message() {
        let err = WorkflowError::from_remote("HTTP 500: nonce too low");
        assert_eq!(err, WorkflowError::Remote("HTTP 500: nonce too low".to_string()));
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::from(WorkflowError::NotConnected).into_response();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

        let response = AppError::from(WorkflowError::OperationInProgress("Upload")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::from(WorkflowError::Remote("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
