// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitRank API Server
//!
//! Serves the private fitness leaderboard. Talks to the contract gateway and
//! FHE relayer when configured, otherwise runs against in-memory
//! collaborators.

use anyhow::Context;
use fitrank::{
    clients::{
        FheSdk, GatewayClient, LeaderboardContract, MemoryContract, MemoryFhe, MemoryVault,
        RelayerClient,
    },
    config::Config,
    services::{Coordinator, Notifier, StatusTiming, WalletSession},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, offline = config.is_offline(), "Starting FitRank API");

    let wallet = WalletSession::new();

    match (config.gateway_url.clone(), config.relayer_url.clone()) {
        (Some(gateway_url), Some(relayer_url)) => {
            tracing::info!(gateway = %gateway_url, relayer = %relayer_url, "Using remote collaborators");
            let contract = Arc::new(GatewayClient::new(
                gateway_url,
                config.confirmation_poll,
                config.confirmation_max_attempts,
            ));
            let fhe = Arc::new(RelayerClient::new(relayer_url));
            serve(config, wallet, contract, fhe).await
        }
        _ => {
            tracing::warn!("GATEWAY_URL/RELAYER_URL not set, running offline");
            let vault = MemoryVault::new();
            let contract = Arc::new(MemoryContract::new(vault.clone()));
            let fhe = Arc::new(MemoryFhe::new(vault));

            // The in-memory contract signs as whichever account is connected.
            let signer = Arc::clone(&contract);
            let mut accounts = wallet.subscribe();
            tokio::spawn(async move {
                while accounts.changed().await.is_ok() {
                    let account = accounts.borrow_and_update().clone();
                    if let Some(account) = account {
                        signer.set_signer(&account).await;
                    }
                }
            });

            serve(config, wallet, contract, fhe).await
        }
    }
}

async fn serve<C, F>(
    config: Config,
    wallet: WalletSession,
    contract: Arc<C>,
    fhe: Arc<F>,
) -> anyhow::Result<()>
where
    C: LeaderboardContract + 'static,
    F: FheSdk + 'static,
{
    let notifier = Notifier::new(StatusTiming {
        success: config.status_success_ttl,
        error: config.status_error_ttl,
    });
    let coordinator = Arc::new(Coordinator::new(contract, fhe, notifier));
    let _follower = Arc::clone(&coordinator).follow_wallet(wallet.subscribe());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        coordinator,
        wallet,
    });

    // Build router
    let app = fitrank::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitrank=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
