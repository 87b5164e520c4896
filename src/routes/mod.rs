// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.
//!
//! `/health` and `/auth/*` are public. Everything under `/api` runs behind
//! [`require_auth`], so handlers can rely on an [`crate::middleware::auth::AuthUser`]
//! extension being present.

pub mod activities;
pub mod api;
pub mod auth;
pub mod leaderboard;

use crate::config::DatastoreKind;
use crate::error::AppError;
use crate::middleware::{require_auth, security::add_security_headers};
use crate::AppState;
use axum::extract::State;
use axum::http::{header, request::Parts, HeaderValue, Method, Uri};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
    /// `firestore` or `memory`
    pub datastore: String,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let datastore = match state.config.datastore {
        DatastoreKind::Firestore => "firestore",
        DatastoreKind::Memory => "memory",
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
        datastore: datastore.to_string(),
    })
}

/// JSON 404 for unmatched paths.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {}", uri.path()))
}

/// The configured frontend, or a plain-http dev server on the loopback host.
fn is_allowed_origin(origin: &str, frontend_url: &str) -> bool {
    if origin == frontend_url {
        return true;
    }
    let Ok(uri) = origin.parse::<Uri>() else {
        return false;
    };
    uri.scheme_str() == Some("http")
        && matches!(uri.host(), Some("localhost" | "127.0.0.1"))
        && uri.path_and_query().map_or(true, |p| p.as_str() == "/")
}

/// Credentialed CORS for the frontend plus local dev servers.
fn cors_layer(frontend_url: String) -> CorsLayer {
    let allow = move |origin: &HeaderValue, _: &Parts| {
        origin
            .to_str()
            .is_ok_and(|origin| is_allowed_origin(origin, &frontend_url))
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(allow))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let player_routes = Router::new()
        .merge(api::routes())
        .merge(activities::routes(state.config.max_photo_bytes))
        .merge(leaderboard::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(player_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors_layer(state.config.frontend_url.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONTEND: &str = "https://crawl.example.com";

    #[test]
    fn test_allowed_origins() {
        assert!(is_allowed_origin(FRONTEND, FRONTEND));
        assert!(is_allowed_origin("http://localhost", FRONTEND));
        assert!(is_allowed_origin("http://localhost:3000", FRONTEND));
        assert!(is_allowed_origin("http://127.0.0.1:5173", FRONTEND));
    }

    #[test]
    fn test_lookalike_origins_rejected() {
        assert!(!is_allowed_origin("http://localhost.attacker.example", FRONTEND));
        assert!(!is_allowed_origin("http://127.0.0.1.nip.io", FRONTEND));
        assert!(!is_allowed_origin("http://localhost@attacker.example", FRONTEND));
        assert!(!is_allowed_origin("https://crawl.example.com.evil", FRONTEND));
        assert!(!is_allowed_origin("https://localhost:3000", FRONTEND));
        assert!(!is_allowed_origin("null", FRONTEND));
    }
}
