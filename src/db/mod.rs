//! Database layer.
//!
//! [`Datastore`] is the seam between the services and storage. Production uses
//! [`FirestoreDb`]; [`MemoryDb`] backs local development and tests.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Activity, CheckIn, Completion, Profile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const ACTIVITIES: &str = "activities";
    /// Keyed by `{user_id}_{activity_id}`; the key makes completions unique
    pub const COMPLETIONS: &str = "activity_completions";
    pub const CHECKINS: &str = "activity_checkins";
    pub const PROFILES: &str = "profiles";
    /// Keyed by lowercase username; the key makes usernames unique
    pub const USERNAMES: &str = "usernames";
}

/// Storage operations used by the services.
#[async_trait]
pub trait Datastore: Send + Sync {
    // ─── Activity catalog ────────────────────────────────────────

    /// All activities, sorted by `sequence_order` ascending.
    async fn list_activities(&self) -> Result<Vec<Activity>, AppError>;

    // ─── Completions ─────────────────────────────────────────────

    async fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>, AppError>;

    /// Every completion of every user (leaderboard aggregation).
    async fn list_all_completions(&self) -> Result<Vec<Completion>, AppError>;

    /// Insert a completion. Fails with [`AppError::AlreadyCompleted`] if one
    /// already exists for (user, activity); this must hold under concurrent
    /// inserts.
    async fn insert_completion(&self, completion: &Completion) -> Result<Completion, AppError>;

    // ─── Check-ins ───────────────────────────────────────────────

    /// Record a check-in unless one exists. Returns the stored marker.
    ///
    /// Markers are kept after completion, so a request racing a completion
    /// of the same activity still finds its marker.
    async fn record_checkin(
        &self,
        user_id: &str,
        activity_id: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckIn, AppError>;

    async fn get_checkin(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<CheckIn>, AppError>;

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError>;

    async fn find_profile_by_username(&self, username: &str)
        -> Result<Option<Profile>, AppError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError>;

    /// Reserve `username` for `user_id`. Succeeds if the caller already holds
    /// it; fails with [`AppError::Conflict`] if anyone else does. Must hold
    /// under concurrent claims.
    async fn claim_username(&self, username: &str, user_id: &str) -> Result<(), AppError>;

    /// Give up `username` if `user_id` holds it. No-op otherwise.
    async fn release_username(&self, username: &str, user_id: &str) -> Result<(), AppError>;

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError>;
}
