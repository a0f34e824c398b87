// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wallet connection routes.
//!
//! These only publish the transition; the coordinator picks it up from the
//! wallet feed and starts the session in the background.

use crate::clients::{FheSdk, LeaderboardContract};
use crate::error::{AppError, Result};
use crate::models::Address;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes<C, F>() -> Router<Arc<AppState<C, F>>>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    Router::new().route(
        "/api/wallet",
        post(connect_wallet::<C, F>).delete(disconnect_wallet::<C, F>),
    )
}

#[derive(Deserialize)]
struct ConnectRequest {
    account: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ConnectResponse {
    /// Normalized (lowercase) address
    pub account: String,
}

async fn connect_wallet<C, F>(
    State(state): State<Arc<AppState<C, F>>>,
    Json(request): Json<ConnectRequest>,
) -> Result<(StatusCode, Json<ConnectResponse>)>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    let account =
        Address::parse(&request.account).map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.wallet.connect(account.clone());
    Ok((
        StatusCode::ACCEPTED,
        Json(ConnectResponse {
            account: account.to_string(),
        }),
    ))
}

async fn disconnect_wallet<C, F>(State(state): State<Arc<AppState<C, F>>>) -> StatusCode
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    state.wallet.disconnect();
    StatusCode::NO_CONTENT
}
