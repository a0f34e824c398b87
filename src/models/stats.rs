// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-user aggregate statistics over the ledger.
//!
//! Always recomputed from the full record set rather than patched
//! incrementally, so a reload can never leave stale totals behind.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Address, FitnessRecord};

/// Weekly step goal used for the progress display.
pub const WEEKLY_STEP_GOAL: u64 = 10_000;

/// Aggregates for the active account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserStats {
    /// Sum of verified steps; encrypted records contribute nothing
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_steps: u64,
    /// Mean duration over all of the user's records (minutes)
    pub avg_duration: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_calories: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub weekly_goal: u64,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            total_steps: 0,
            avg_duration: 0.0,
            total_calories: 0,
            weekly_goal: WEEKLY_STEP_GOAL,
        }
    }
}

impl UserStats {
    /// Compute stats for `account` over `records`.
    ///
    /// No account means no stats.
    pub fn compute<'a, I>(records: I, account: Option<&Address>) -> Self
    where
        I: IntoIterator<Item = &'a FitnessRecord>,
    {
        let Some(account) = account else {
            return Self::default();
        };

        let mut stats = Self::default();
        let mut count: u32 = 0;
        let mut total_duration: u64 = 0;

        for record in records.into_iter().filter(|r| r.is_owned_by(account)) {
            count += 1;
            total_duration += u64::from(record.duration_minutes);
            stats.total_calories += u64::from(record.calories);
            stats.total_steps += record.verified_steps().unwrap_or(0);
        }

        if count > 0 {
            stats.avg_duration = total_duration as f64 / f64::from(count);
        }

        stats
    }

    /// Progress toward the weekly goal, rounded (may exceed 100).
    pub fn goal_percent(&self) -> u64 {
        if self.weekly_goal == 0 {
            return 0;
        }
        (self.total_steps as f64 / self.weekly_goal as f64 * 100.0).round() as u64
    }

    /// Progress bar fill, clamped to 100.
    pub fn goal_fill(&self) -> f64 {
        if self.weekly_goal == 0 {
            return 0.0;
        }
        (self.total_steps as f64 / self.weekly_goal as f64 * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepCount;

    const ME: &str = "0x1111111111111111111111111111111111111111";
    const OTHER: &str = "0x2222222222222222222222222222222222222222";

    fn make_record(id: &str, creator: &str, duration: u32, calories: u32, steps: StepCount) -> FitnessRecord {
        FitnessRecord {
            id: id.to_string(),
            name: format!("Workout {}", id),
            duration_minutes: duration,
            calories,
            created_at: 1_704_103_200,
            creator: Address::parse(creator).unwrap(),
            steps,
        }
    }

    #[test]
    fn test_compute_basic() {
        let records = vec![
            make_record("a", ME, 30, 200, StepCount::Verified(4000)),
            make_record("b", ME, 60, 400, StepCount::Encrypted),
            make_record("c", OTHER, 90, 900, StepCount::Verified(20000)),
        ];
        let me = Address::parse(ME).unwrap();

        let stats = UserStats::compute(&records, Some(&me));

        assert_eq!(stats.total_steps, 4000);
        assert_eq!(stats.avg_duration, 45.0);
        assert_eq!(stats.total_calories, 600);
        assert_eq!(stats.weekly_goal, WEEKLY_STEP_GOAL);
    }

    #[test]
    fn test_owner_match_ignores_case() {
        let records = vec![make_record(
            "a",
            "0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD",
            10,
            10,
            StepCount::Verified(10),
        )];
        let me = Address::parse("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap();

        assert_eq!(UserStats::compute(&records, Some(&me)).total_steps, 10);
    }

    #[test]
    fn test_no_account_yields_defaults() {
        let records = vec![make_record("a", ME, 30, 200, StepCount::Verified(4000))];
        assert_eq!(UserStats::compute(&records, None), UserStats::default());
    }

    #[test]
    fn test_no_records_average_is_zero() {
        let me = Address::parse(ME).unwrap();
        let records: Vec<FitnessRecord> = Vec::new();
        let stats = UserStats::compute(&records, Some(&me));
        assert_eq!(stats.avg_duration, 0.0);
    }

    #[test]
    fn test_goal_progress() {
        let stats = UserStats {
            total_steps: 12_345,
            ..UserStats::default()
        };
        assert_eq!(stats.goal_percent(), 123);
        assert_eq!(stats.goal_fill(), 100.0);

        let stats = UserStats {
            total_steps: 2_500,
            ..UserStats::default()
        };
        assert_eq!(stats.goal_percent(), 25);
        assert_eq!(stats.goal_fill(), 25.0);
    }
}
