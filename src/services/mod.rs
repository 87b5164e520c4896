// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod leaderboard;
pub mod photos;
pub mod progress;
pub mod progression;

pub use photos::{MemoryPhotoStore, PhotoStore, SupabaseStorage};
pub use progress::ProgressService;
pub use progression::{Progression, ProgressionError, SequenceViolation};
