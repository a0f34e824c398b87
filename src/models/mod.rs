// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod record;
pub mod session;
pub mod stats;
pub mod status;
pub mod workout;

pub use account::{Address, AddressError};
pub use record::{FitnessRecord, RecordData, StepCount};
pub use session::{FheStatus, SessionSnapshot, UploadFormState};
pub use stats::{UserStats, WEEKLY_STEP_GOAL};
pub use status::{StatusKind, TransactionStatus};
pub use workout::{WorkoutForm, WorkoutSubmission};
