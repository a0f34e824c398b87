// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-slot transaction status with timed auto-dismissal.
//!
//! The slot is a `watch` channel: the newest status always wins and
//! subscribers only ever see the latest value. Terminal statuses schedule a
//! dismissal task; showing anything else aborts the pending one first.

use crate::models::{StatusKind, TransactionStatus};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Auto-dismiss delays per status kind.
#[derive(Debug, Clone, Copy)]
pub struct StatusTiming {
    pub success: Duration,
    pub error: Duration,
}

impl Default for StatusTiming {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(2000),
            error: Duration::from_millis(3000),
        }
    }
}

impl StatusTiming {
    /// Pending statuses stay until replaced.
    fn ttl(&self, kind: StatusKind) -> Option<Duration> {
        match kind {
            StatusKind::Pending => None,
            StatusKind::Success => Some(self.success),
            StatusKind::Error => Some(self.error),
        }
    }
}

pub struct Notifier {
    slot: watch::Sender<TransactionStatus>,
    dismiss: Mutex<Option<JoinHandle<()>>>,
    timing: StatusTiming,
}

impl Notifier {
    pub fn new(timing: StatusTiming) -> Self {
        let (slot, _) = watch::channel(TransactionStatus::hidden());
        Self {
            slot,
            dismiss: Mutex::new(None),
            timing,
        }
    }

    /// Replace the visible status and (re)start its dismissal timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show(&self, kind: StatusKind, message: impl Into<String>) {
        let status = TransactionStatus::visible(kind, message);
        tracing::debug!(kind = ?status.kind, message = %status.message, "Status");

        let mut dismiss = self.dismiss.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = dismiss.take() {
            previous.abort();
        }

        self.slot.send_replace(status.clone());

        if let Some(ttl) = self.timing.ttl(kind) {
            let slot = self.slot.clone();
            *dismiss = Some(tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                // A newer status may have landed between wake-up and here.
                slot.send_if_modified(|current| {
                    if *current == status {
                        *current = TransactionStatus::hidden();
                        true
                    } else {
                        false
                    }
                });
            }));
        }
    }

    pub fn pending(&self, message: impl Into<String>) {
        self.show(StatusKind::Pending, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(StatusKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(StatusKind::Error, message);
    }

    pub fn current(&self) -> TransactionStatus {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TransactionStatus> {
        self.slot.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(StatusTiming::default())
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(task) = self
            .dismiss
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}
