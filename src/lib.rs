// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pubcrawl-Tracker: sequence-gated pub crawl checklist
//!
//! This crate provides the backend API for a twelve-stop pub crawl: players
//! check in at the current stop, upload a photo to complete it, and compete
//! on a leaderboard. Only the lowest-ordered unfinished stop is actionable.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Datastore;
use services::ProgressService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Datastore>,
    pub progress: ProgressService,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn Datastore>,
        photos: Arc<dyn services::PhotoStore>,
    ) -> Self {
        let progress = ProgressService::new(
            db.clone(),
            photos,
            config.total_activities,
            config.trust_client_timestamps,
        );
        Self {
            config,
            db,
            progress,
        }
    }
}
