// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress routes: dashboard, map, activity page, and the write paths.
//!
//! Handlers only extract and validate input; sequence gating happens in
//! [`crate::services::ProgressService`].

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Completion;
use crate::services::progress::{
    ActivityDetailView, CheckInView, CompleteRequest, DashboardView, MapView, PhotoUploadView,
};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderMap},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Progress routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes(max_photo_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/map", get(get_map))
        .route("/api/activities/{id}", get(get_activity))
        .route(
            "/api/activities/{id}/photo",
            put(upload_photo).layer(DefaultBodyLimit::max(max_photo_bytes)),
        )
        .route("/api/checkin", post(check_in))
        .route("/api/complete", post(complete))
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// ─── Views ───────────────────────────────────────────────────

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardView>> {
    tracing::debug!(user_id = %user.user_id, "Fetching dashboard");
    Ok(Json(state.progress.dashboard(&user.user_id).await?))
}

async fn get_map(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MapView>> {
    Ok(Json(state.progress.map(&user.user_id).await?))
}

async fn get_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<Json<ActivityDetailView>> {
    Ok(Json(
        state
            .progress
            .activity_detail(&user.user_id, &activity_id)
            .await?,
    ))
}

// ─── Check-in ────────────────────────────────────────────────

#[derive(Deserialize)]
struct CheckInRequest {
    activity_id: Option<String>,
}

async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CheckInRequest>, JsonRejection>,
) -> Result<Json<CheckInView>> {
    let activity_id = json_body(payload)?
        .activity_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required fields".to_string()))?;

    Ok(Json(state.progress.check_in(&user.user_id, &activity_id).await?))
}

// ─── Photo ───────────────────────────────────────────────────

async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PhotoUploadView>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    Ok(Json(
        state
            .progress
            .upload_photo(&user.user_id, &activity_id, content_type, body.to_vec())
            .await?,
    ))
}

// ─── Completion ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompleteResponse {
    pub success: bool,
    pub completion: Completion,
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<CompleteResponse>> {
    let request = json_body(payload)?;
    let completion = state.progress.complete(&user.user_id, request).await?;

    Ok(Json(CompleteResponse {
        success: true,
        completion,
    }))
}
