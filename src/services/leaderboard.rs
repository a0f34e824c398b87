// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only views over the ledger: search, ranking and per-user history.

use crate::models::{Address, FitnessRecord};
use std::cmp::Reverse;

/// Records whose name or creator contains `term`, ignoring case.
///
/// The term is used as typed, surrounding whitespace included. An empty
/// term matches everything.
pub fn search<'a>(records: &'a [FitnessRecord], term: &str) -> Vec<&'a FitnessRecord> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&needle) || r.creator.to_string().contains(&needle)
        })
        .collect()
}

/// Sort by effective steps, highest first.
///
/// The sort is stable, so encrypted records (effective zero) and ties keep
/// their ledger order.
pub fn rank(records: &mut [&FitnessRecord]) {
    records.sort_by_key(|r| Reverse(r.effective_steps()));
}

/// The leaderboard as displayed: filtered, then ranked.
pub fn leaderboard<'a>(records: &'a [FitnessRecord], term: &str) -> Vec<&'a FitnessRecord> {
    let mut ranked = search(records, term);
    rank(&mut ranked);
    ranked
}

/// The account's own workouts in ledger order.
pub fn history<'a>(records: &'a [FitnessRecord], account: &Address) -> Vec<&'a FitnessRecord> {
    records.iter().filter(|r| r.is_owned_by(account)).collect()
}
