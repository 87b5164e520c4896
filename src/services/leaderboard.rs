// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard aggregation.
//!
//! Players are ranked by completed stops (more is better), then by weighted
//! score: the mean of `duration_seconds / difficulty` over their completions
//! (lower is better), then by username.

use crate::models::{Activity, Completion, LeaderboardEntry, Profile};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Default)]
struct Totals {
    count: u32,
    duration_seconds: i64,
    weighted: f64,
}

/// Rank every profiled player with at least one completion.
///
/// Completions of activities missing from the catalog are not counted.
pub fn build_leaderboard(
    activities: &[Activity],
    completions: &[Completion],
    profiles: &[Profile],
) -> Vec<LeaderboardEntry> {
    let difficulty: HashMap<&str, u8> = activities
        .iter()
        .map(|a| (a.id.as_str(), a.difficulty.max(1)))
        .collect();

    let mut totals: HashMap<&str, Totals> = HashMap::new();
    for completion in completions {
        let Some(&weight) = difficulty.get(completion.activity_id.as_str()) else {
            continue;
        };
        let entry = totals.entry(completion.user_id.as_str()).or_default();
        entry.count += 1;
        entry.duration_seconds += completion.duration_seconds;
        entry.weighted += completion.duration_seconds as f64 / f64::from(weight);
    }

    let mut entries: Vec<LeaderboardEntry> = profiles
        .iter()
        .filter_map(|profile| {
            let t = totals.get(profile.id.as_str())?;
            let count = f64::from(t.count);
            Some(LeaderboardEntry {
                position: 0,
                user_id: profile.id.clone(),
                username: profile.username.clone(),
                completed_count: t.count,
                avg_duration_seconds: Some(t.duration_seconds as f64 / count),
                weighted_score: Some(t.weighted / count),
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.completed_count
            .cmp(&a.completed_count)
            .then_with(|| compare_scores(a.weighted_score, b.weighted_score))
            .then_with(|| a.username.cmp(&b.username))
    });

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index as u32 + 1;
    }

    entries
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 1-based leaderboard position of `user_id`, if ranked.
pub fn position_of(entries: &[LeaderboardEntry], user_id: &str) -> Option<u32> {
    entries
        .iter()
        .find(|e| e.user_id == user_id)
        .map(|e| e.position)
}
