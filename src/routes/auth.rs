// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie routes.
//!
//! Sign-in itself happens at the identity provider. The frontend hands the
//! provider's access token to `/auth/session`, which stores it in an
//! HttpOnly cookie for subsequent API calls.

use crate::error::{AppError, Result};
use crate::middleware::auth::{verify_token, SESSION_COOKIE};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct SessionRequest {
    access_token: String,
}

/// Cookie attributes shared by creation and removal so browsers match them.
fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .build()
}

/// Validate a provider access token and set it as the session cookie.
async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<SessionRequest>, JsonRejection>,
) -> Result<(CookieJar, StatusCode)> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let claims = verify_token(&request.access_token, &state.config.jwt_signing_key)
        .ok_or(AppError::InvalidToken)?;

    tracing::info!(user_id = %claims.sub, "Session started");

    let jar = jar.add(session_cookie(&state, request.access_token));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(session_cookie(&state, String::new()));
    (jar, StatusCode::NO_CONTENT)
}
