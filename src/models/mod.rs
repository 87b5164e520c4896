// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod completion;
pub mod leaderboard;
pub mod profile;

pub use activity::{Activity, ActivityStatus, DifficultyLabel};
pub use completion::{CheckIn, Completion};
pub use leaderboard::LeaderboardEntry;
pub use profile::{Profile, UsernameClaim};
