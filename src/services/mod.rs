// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod leaderboard;
pub mod notifier;
pub mod wallet;
pub mod workflow;

pub use notifier::{Notifier, StatusTiming};
pub use wallet::WalletSession;
pub use workflow::{Coordinator, LoadOutcome, RecordIdGenerator};
