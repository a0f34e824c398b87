// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wallet connection state.
//!
//! The wallet itself lives outside this process; this is only the feed of
//! connect/disconnect transitions the coordinator follows.

use crate::models::Address;
use tokio::sync::watch;

/// Active account (`None` while disconnected).
#[derive(Clone)]
pub struct WalletSession {
    account: watch::Sender<Option<Address>>,
}

impl WalletSession {
    pub fn new() -> Self {
        let (account, _) = watch::channel(None);
        Self { account }
    }

    /// Publish a newly connected (or switched) account.
    pub fn connect(&self, account: Address) {
        tracing::info!(account = %account, "Wallet connected");
        self.account.send_replace(Some(account));
    }

    pub fn disconnect(&self) {
        if self.account.send_replace(None).is_some() {
            tracing::info!("Wallet disconnected");
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Address>> {
        self.account.subscribe()
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}
