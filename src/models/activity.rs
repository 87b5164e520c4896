// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity catalog model (one stop of the crawl).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Catalog row for a single stop. Seeded administratively, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    /// Activity ID (also used as document ID)
    pub id: String,
    /// Display name of the stop
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Difficulty from 1 (easy) to 10 (extreme)
    pub difficulty: u8,
    /// Position in the crawl; unique, defines the total order
    pub sequence_order: i32,
}

impl Activity {
    pub fn difficulty_label(&self) -> DifficultyLabel {
        DifficultyLabel::from_difficulty(self.difficulty)
    }
}

/// Derived per-user status of an activity. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityStatus {
    Completed,
    Current,
    Locked,
}

/// Human-facing difficulty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DifficultyLabel {
    Easy,
    Normal,
    Challenging,
    Hard,
    Extreme,
}

impl DifficultyLabel {
    pub fn from_difficulty(difficulty: u8) -> Self {
        match difficulty {
            0..=2 => DifficultyLabel::Easy,
            3..=4 => DifficultyLabel::Normal,
            5..=6 => DifficultyLabel::Challenging,
            7..=8 => DifficultyLabel::Hard,
            _ => DifficultyLabel::Extreme,
        }
    }
}
