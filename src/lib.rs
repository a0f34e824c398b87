// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitRank: a private fitness leaderboard
//!
//! This crate coordinates encrypted workout submission, on-chain storage and
//! verified decryption of step counts, and serves the resulting leaderboard
//! over an HTTP API.

pub mod clients;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{Coordinator, WalletSession};
use std::sync::Arc;

/// Shared application state.
pub struct AppState<C, F> {
    pub config: Config,
    pub coordinator: Arc<Coordinator<C, F>>,
    pub wallet: WalletSession,
}
