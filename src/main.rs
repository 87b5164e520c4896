// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pubcrawl-Tracker API Server
//!
//! Serves progress, check-in, completion, and leaderboard endpoints for the
//! sequence-gated pub crawl.

use pubcrawl_tracker::{
    config::{Config, DatastoreKind},
    db::{Datastore, FirestoreDb, MemoryDb},
    services::{MemoryPhotoStore, PhotoStore, SupabaseStorage},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Pubcrawl-Tracker API");

    let db: Arc<dyn Datastore> = match config.datastore {
        DatastoreKind::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        DatastoreKind::Memory => {
            tracing::warn!("Using in-memory datastore; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    let photos: Arc<dyn PhotoStore> =
        match (&config.supabase_url, &config.supabase_service_key) {
            (Some(url), Some(key)) => {
                tracing::info!(bucket = %config.photo_bucket, "Photo storage configured");
                Arc::new(SupabaseStorage::new(
                    url,
                    key.clone(),
                    config.photo_bucket.clone(),
                ))
            }
            _ => {
                tracing::warn!("SUPABASE_URL/SUPABASE_SERVICE_KEY not set; photos kept in memory");
                Arc::new(MemoryPhotoStore::new())
            }
        };

    tracing::info!(
        total_activities = config.total_activities,
        trust_client_timestamps = config.trust_client_timestamps,
        "Progress service initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, photos));

    // Build router
    let app = pubcrawl_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pubcrawl_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
