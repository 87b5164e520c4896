// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::Utc;
use pubcrawl_tracker::config::Config;
use pubcrawl_tracker::db::{Datastore, FirestoreDb, MemoryDb};
use pubcrawl_tracker::middleware::auth::create_jwt;
use pubcrawl_tracker::models::{Activity, Profile};
use pubcrawl_tracker::routes::create_router;
use pubcrawl_tracker::services::MemoryPhotoStore;
use pubcrawl_tracker::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Catalog stop with a predictable ID (`act-{order}`).
#[allow(dead_code)]
pub fn activity(order: i32) -> Activity {
    Activity {
        id: format!("act-{}", order),
        name: format!("Stop {}", order),
        description: Some(format!("Pub number {}", order)),
        latitude: 51.5 + f64::from(order) * 0.001,
        longitude: -0.12,
        difficulty: ((order - 1) % 10 + 1) as u8,
        sequence_order: order,
    }
}

/// The full twelve-stop crawl.
#[allow(dead_code)]
pub fn catalog() -> Vec<Activity> {
    (1..=12).map(activity).collect()
}

/// Handles into a test app's in-memory backends.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: MemoryDb,
    pub photos: MemoryPhotoStore,
}

/// Create a test app over in-memory storage seeded with [`catalog`].
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> TestApp {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let db = MemoryDb::with_activities(catalog());
    let photos = MemoryPhotoStore::new();
    let state = Arc::new(AppState::new(
        config,
        Arc::new(db.clone()),
        Arc::new(photos.clone()),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        photos,
    }
}

/// Session token for `user_id`, signed with the test key.
#[allow(dead_code)]
pub fn token_for(state: &AppState, user_id: &str) -> String {
    create_jwt(user_id, &state.config.jwt_signing_key).expect("Failed to create JWT")
}

/// Store a profile so profile-gated views work.
#[allow(dead_code)]
pub async fn seed_profile(db: &dyn Datastore, user_id: &str, username: &str) {
    db.upsert_profile(&Profile {
        id: user_id.to_string(),
        username: username.to_string(),
        phone: None,
        created_at: Utc::now(),
    })
    .await
    .expect("Failed to seed profile");
}

/// Send a request with a bearer token and optional JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    user_id: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_for(&app.state, user_id)),
        );

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
