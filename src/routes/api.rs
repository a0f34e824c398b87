// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only API routes: session, leaderboard, stats and status.

use crate::clients::{FheSdk, LeaderboardContract};
use crate::error::{AppError, Result};
use crate::models::{FitnessRecord, SessionSnapshot, TransactionStatus};
use crate::time_utils::format_epoch_seconds;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes<C, F>() -> Router<Arc<AppState<C, F>>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    Router::new()
        .route("/api/session", get(get_session::<C, F>))
        .route("/api/leaderboard", get(get_leaderboard::<C, F>))
        .route("/api/stats", get(get_stats::<C, F>))
        .route("/api/history", get(get_history::<C, F>))
        .route("/api/records/{id}", get(get_record::<C, F>))
        .route("/api/status", get(get_status::<C, F>))
        .route("/api/availability", get(get_availability::<C, F>))
}

// ─── Records ─────────────────────────────────────────────────

/// A ledger entry as sent to the frontend.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecordResponse {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub calories: u32,
    /// RFC3339
    pub created_at: Option<String>,
    pub creator: String,
    pub is_verified: bool,
    /// Present only once verified
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub steps: Option<u64>,
}

impl From<FitnessRecord> for RecordResponse {
    fn from(record: FitnessRecord) -> Self {
        Self {
            created_at: format_epoch_seconds(record.created_at),
            is_verified: record.is_verified(),
            steps: record.verified_steps(),
            creator: record.creator.to_string(),
            id: record.id,
            name: record.name,
            duration_minutes: record.duration_minutes,
            calories: record.calories,
        }
    }
}

fn to_responses(records: Vec<FitnessRecord>) -> Vec<RecordResponse> {
    records.into_iter().map(RecordResponse::from).collect()
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    #[serde(default)]
    search: String,
}

/// Ranked leaderboard.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub search: String,
    /// Highest effective steps first
    pub entries: Vec<RecordResponse>,
}

async fn get_leaderboard<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
    Query(params): Query<LeaderboardQuery>,
) -> Json<LeaderboardResponse>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    let entries = to_responses(state.coordinator.leaderboard(&params.search));
    Json(LeaderboardResponse {
        search: params.search,
        entries,
    })
}

/// The connected account's own workouts.
async fn get_history<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
) -> Result<Json<Vec<RecordResponse>>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    if state.coordinator.account().is_none() {
        return Err(AppError::Precondition("Wallet not connected".to_string()));
    }
    Ok(Json(to_responses(state.coordinator.history())))
}

async fn get_record<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
    Path(id): Path<String>,
) -> Result<Json<RecordResponse>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    state
        .coordinator
        .record(&id)
        .map(|record| Json(record.into()))
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))
}

// ─── Stats ───────────────────────────────────────────────────

/// Aggregates for the connected account plus goal progress.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatsResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_steps: u64,
    pub avg_duration: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub weekly_goal: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub goal_percent: u64,
    pub goal_fill: f64,
}

async fn get_stats<C, F>(State(state): State<Arc<AppState<C, F>>>) -> Json<StatsResponse>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    let stats = state.coordinator.stats();
    Json(StatsResponse {
        goal_percent: stats.goal_percent(),
        goal_fill: stats.goal_fill(),
        total_steps: stats.total_steps,
        avg_duration: stats.avg_duration,
        total_calories: stats.total_calories,
        weekly_goal: stats.weekly_goal,
    })
}

// ─── Session & status ────────────────────────────────────────

async fn get_session<C, F>(State(state): State<Arc<AppState<C, F>>>) -> Json<SessionSnapshot>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    Json(state.coordinator.snapshot())
}

async fn get_status<C, F>(State(state): State<Arc<AppState<C, F>>>) -> Json<TransactionStatus>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    Json(state.coordinator.status())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AvailabilityResponse {
    pub available: bool,
}

async fn get_availability<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
) -> Result<Json<AvailabilityResponse>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    let available = state.coordinator.check_availability().await?;
    Ok(Json(AvailabilityResponse { available }))
}
