// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Completion and check-in records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A user's recorded finish of one activity. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Completion {
    /// Document ID, derived from (user_id, activity_id)
    pub id: String,
    pub user_id: String,
    pub activity_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub checked_in_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub completed_at: DateTime<Utc>,
    /// `completed_at - checked_in_at`, in whole seconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_seconds: i64,
    pub photo_url: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl Completion {
    /// Build a new completion record, deriving the document ID and duration.
    pub fn new(
        user_id: &str,
        activity_id: &str,
        checked_in_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        photo_url: String,
    ) -> Self {
        Self {
            id: completion_doc_id(user_id, activity_id),
            user_id: user_id.to_string(),
            activity_id: activity_id.to_string(),
            checked_in_at,
            completed_at,
            duration_seconds: completed_at
                .signed_duration_since(checked_in_at)
                .num_seconds(),
            photo_url,
            created_at: Utc::now(),
        }
    }
}

/// Server-side check-in marker for (user, activity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub user_id: String,
    pub activity_id: String,
    pub checked_in_at: DateTime<Utc>,
}

/// Document ID shared by completions and check-ins: one per (user, activity).
pub fn completion_doc_id(user_id: &str, activity_id: &str) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(user_id),
        urlencoding::encode(activity_id)
    )
}
