// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fitrank::clients::{ContractError, FheError};
use fitrank::error::{is_already_verified, is_user_rejection, AppError, WorkflowError};

#[test]
fn test_user_rejection_matches() {
    assert!(is_user_rejection("User rejected the request."));
    assert!(is_user_rejection("ACTION_REJECTED: user rejected transaction"));
    assert!(!is_user_rejection("insufficient funds"));
}

#[test]
fn test_already_verified_matches() {
    assert!(is_already_verified("execution reverted: Data already verified"));
    assert!(is_already_verified("ALREADY VERIFIED"));
    assert!(!is_already_verified("Invalid decryption proof"));
}

#[test]
fn test_race_survives_fhe_wrapping() {
    let err = FheError::from(ContractError::Reverted("Data already verified".into()));
    assert_eq!(WorkflowError::from_verification(err), WorkflowError::AlreadyVerified);
}

#[test]
fn test_other_fhe_errors_stay_remote() {
    let err = FheError::Decrypt("gateway timeout".into());
    assert_eq!(
        WorkflowError::from_remote(err),
        WorkflowError::Remote("decryption failed: gateway timeout".into())
    );
}

#[test]
fn test_validation_maps_to_bad_request() {
    let response = AppError::from(WorkflowError::Validation("Steps are required".into())).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_rejection_maps_to_conflict() {
    let response = AppError::from(WorkflowError::TransactionRejected).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn test_internal_error_maps_to_500() {
    let response = AppError::from(anyhow::anyhow!("poisoned")).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
