// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard route.

use crate::error::Result;
use crate::models::LeaderboardEntry;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/leaderboard", get(get_leaderboard))
}

/// Ranked players, best first.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let entries = state.progress.leaderboard().await?;
    tracing::debug!(count = entries.len(), "Leaderboard computed");
    Ok(Json(entries))
}
