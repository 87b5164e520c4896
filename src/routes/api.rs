// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Profile;
use crate::services::progress::UserStatsView;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/stats", get(get_my_stats))
        .route("/api/profile", put(put_profile))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub phone: Option<String>,
    pub created_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            phone: profile.phone,
            created_at: format_utc_rfc3339(profile.created_at),
        }
    }
}

/// Get current user profile.
///
/// 404 means the user has authenticated but not picked a username yet.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {}", user.user_id)))?;

    Ok(Json(profile.into()))
}

async fn get_my_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserStatsView>> {
    Ok(Json(state.progress.user_stats(&user.user_id).await?))
}

// ─── Profile Update ──────────────────────────────────────────

fn validate_username_chars(username: &str) -> std::result::Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(
        length(min = 3, max = 20),
        custom(function = "validate_username_chars")
    )]
    pub username: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Create or update the caller's profile.
///
/// Usernames are stored lowercase and must be unique across players.
async fn put_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request.validate().map_err(|e| {
        AppError::BadRequest(format!(
            "Username must be 3-20 letters, digits or underscores ({})",
            e
        ))
    })?;

    let username = request.username.to_lowercase();

    // Profiles written before name claims existed are only found by query.
    if let Some(existing) = state.db.find_profile_by_username(&username).await? {
        if existing.id != user.user_id {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }
    }

    let previous = state.db.get_profile(&user.user_id).await?;

    // The claim is the authoritative uniqueness check.
    state.db.claim_username(&username, &user.user_id).await?;

    let held_before = previous.as_ref().map(|p| p.username.clone());
    let newly_claimed = held_before.as_deref() != Some(username.as_str());

    let profile = Profile {
        id: user.user_id.clone(),
        username,
        phone: request.phone.filter(|p| !p.trim().is_empty()),
        created_at: previous
            .map(|p| p.created_at)
            .unwrap_or_else(chrono::Utc::now),
    };

    if let Err(e) = state.db.upsert_profile(&profile).await {
        if newly_claimed {
            release_quietly(&state, &profile.username, &user.user_id).await;
        }
        return Err(e);
    }

    if let Some(old) = held_before.filter(|_| newly_claimed) {
        release_quietly(&state, &old, &user.user_id).await;
    }

    tracing::info!(
        user_id = %profile.id,
        username = %profile.username,
        "Profile saved"
    );

    Ok(Json(profile.into()))
}

async fn release_quietly(state: &AppState, username: &str, user_id: &str) {
    if let Err(e) = state.db.release_username(username, user_id).await {
        tracing::warn!(user_id, username, error = %e, "Failed to release username");
    }
}
