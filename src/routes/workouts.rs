// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workflow routes: upload, reload, verify and the upload form.
//!
//! These await the whole workflow (including transaction confirmation)
//! before responding. Progress is visible meanwhile via `/api/status`.

use crate::clients::{FheSdk, LeaderboardContract};
use crate::error::Result;
use crate::models::{UploadFormState, WorkoutForm};
use crate::services::LoadOutcome;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes<C, F>() -> Router<Arc<AppState<C, F>>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    Router::new()
        .route("/api/workouts", post(submit_workout::<C, F>))
        .route("/api/records/refresh", post(refresh_records::<C, F>))
        .route("/api/records/{id}/verify", post(verify_record::<C, F>))
        .route(
            "/api/upload-form",
            post(open_upload_form::<C, F>).delete(close_upload_form::<C, F>),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubmitResponse {
    pub id: String,
}

async fn submit_workout<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
    Json(form): Json<WorkoutForm>,
) -> Result<(StatusCode, Json<SubmitResponse>)>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    let id = state.coordinator.submit_workout(form).await?;
    Ok((StatusCode::CREATED, Json(SubmitResponse { id })))
}

async fn refresh_records<C, F>(State(state): State<Arc<AppState<C, F>>>) -> Result<Json<LoadOutcome>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    Ok(Json(state.coordinator.load_records().await?))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VerifyResponse {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub steps: Option<u64>,
    /// Someone else verified the record while we were decrypting
    pub verified_elsewhere: bool,
}

async fn verify_record<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
    Path(id): Path<String>,
) -> Result<Json<VerifyResponse>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    let revealed = state.coordinator.decrypt_and_verify(&id).await?;
    let verified_elsewhere = revealed.is_none();

    // After a lost race the reloaded ledger holds the winner's value.
    let steps = revealed.or_else(|| {
        state
            .coordinator
            .record(&id)
            .and_then(|record| record.verified_steps())
    });

    Ok(Json(VerifyResponse {
        id,
        steps,
        verified_elsewhere,
    }))
}

async fn open_upload_form<C, F>(State(state): State<Arc<AppState<C, F>>>) -> Json<UploadFormState>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    state.coordinator.open_upload_form();
    Json(state.coordinator.snapshot().upload_form)
}

async fn close_upload_form<C, F>(State(state): State<Arc<AppState<C, F>>>) -> Json<UploadFormState>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    state.coordinator.close_upload_form();
    Json(state.coordinator.snapshot().upload_form)
}
