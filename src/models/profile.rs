//! Player profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile stored per authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity provider user ID (also used as document ID)
    pub id: String,
    /// Lowercase, unique leaderboard name
    pub username: String,
    /// Phone number (may be None if not shared)
    #[serde(default)]
    pub phone: Option<String>,
    /// When the profile was first created
    pub created_at: DateTime<Utc>,
}

/// Ownership record for a username, keyed by the lowercase name.
///
/// Created with a create-only write, so two players can never hold the same
/// name even when they claim it at the same moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsernameClaim {
    pub username: String,
    pub user_id: String,
    pub claimed_at: DateTime<Utc>,
}
