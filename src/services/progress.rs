// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Player progress: read views and the check-in / photo / completion writes.
//!
//! Every operation re-resolves the user's [`Progression`] from storage right
//! before acting, so a replayed or raced request is judged against current
//! state rather than anything the client remembers.

use crate::db::Datastore;
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityStatus, Completion, DifficultyLabel, LeaderboardEntry};
use crate::services::leaderboard::{build_leaderboard, position_of};
use crate::services::photos::{extension_for, photo_path, PhotoStore};
use crate::services::progression::{ProgressEntry, Progression, ProgressionError, SequenceViolation};
use crate::time_utils::{format_duration, format_timer, parse_rfc3339};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

// ─── Views ───────────────────────────────────────────────────

/// Activity with the caller's derived status.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub difficulty_label: DifficultyLabel,
    pub status: ActivityStatus,
    pub completion: Option<Completion>,
    pub duration_display: Option<String>,
}

impl From<&ProgressEntry<'_>> for ActivityView {
    fn from(entry: &ProgressEntry<'_>) -> Self {
        Self {
            activity: entry.activity.clone(),
            difficulty_label: entry.activity.difficulty_label(),
            status: entry.status,
            completion: entry.completion.cloned(),
            duration_display: entry
                .completion
                .map(|c| format_duration(c.duration_seconds)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardView {
    pub username: String,
    pub activities: Vec<ActivityView>,
    pub completed_count: u32,
    pub total_activities: u32,
    pub remaining: u32,
    pub progress_percent: u32,
    pub current_activity_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapMarker {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub difficulty: u8,
    pub sequence_order: i32,
    pub status: ActivityStatus,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapView {
    pub markers: Vec<MapMarker>,
    pub current_activity_id: Option<String>,
    pub completed_count: u32,
    pub total_activities: u32,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityDetailView {
    pub activity: ActivityView,
    /// True only for the current activity
    pub can_act: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub elapsed_seconds: Option<i64>,
    pub timer_display: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckInView {
    pub success: bool,
    pub activity_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhotoUploadView {
    pub photo_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GalleryItem {
    pub activity_id: String,
    pub activity_name: String,
    pub sequence_order: i32,
    pub photo_url: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_seconds: i64,
    pub duration_display: String,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserStatsView {
    pub username: String,
    pub completed_count: u32,
    pub total_activities: u32,
    pub position: Option<u32>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub avg_duration_seconds: Option<i64>,
    pub avg_duration_display: Option<String>,
    pub gallery: Vec<GalleryItem>,
}

// ─── Requests ────────────────────────────────────────────────

/// Completion submission as received. Every field is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteRequest {
    pub activity_id: Option<String>,
    pub checked_in_at: Option<String>,
    pub completed_at: Option<String>,
    pub photo_url: Option<String>,
}

/// A [`CompleteRequest`] with all fields present and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSubmission {
    pub activity_id: String,
    pub checked_in_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub photo_url: String,
}

impl CompleteRequest {
    pub fn validate(self) -> Result<CompletionSubmission> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let (Some(activity_id), Some(checked_in_at), Some(completed_at), Some(photo_url)) = (
            present(self.activity_id),
            present(self.checked_in_at),
            present(self.completed_at),
            present(self.photo_url),
        ) else {
            return Err(AppError::BadRequest("Missing required fields".to_string()));
        };

        let timestamp = |name: &str, raw: &str| {
            parse_rfc3339(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid '{}': must be RFC3339 datetime", name))
            })
        };

        Ok(CompletionSubmission {
            checked_in_at: timestamp("checked_in_at", &checked_in_at)?,
            completed_at: timestamp("completed_at", &completed_at)?,
            activity_id,
            photo_url,
        })
    }
}

// ─── Service ─────────────────────────────────────────────────

/// Progress views and write paths over the datastore and photo store.
#[derive(Clone)]
pub struct ProgressService {
    db: Arc<dyn Datastore>,
    photos: Arc<dyn PhotoStore>,
    total_activities: usize,
    trust_client_timestamps: bool,
}

impl ProgressService {
    pub fn new(
        db: Arc<dyn Datastore>,
        photos: Arc<dyn PhotoStore>,
        total_activities: usize,
        trust_client_timestamps: bool,
    ) -> Self {
        Self {
            db,
            photos,
            total_activities: total_activities.max(1),
            trust_client_timestamps,
        }
    }

    /// Fetch the catalog and the user's completions concurrently.
    async fn load(&self, user_id: &str) -> Result<(Vec<Activity>, Vec<Completion>)> {
        tokio::try_join!(self.db.list_activities(), self.db.list_completions(user_id))
    }

    async fn username(&self, user_id: &str) -> Result<String> {
        self.db
            .get_profile(user_id)
            .await?
            .map(|p| p.username)
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {}", user_id)))
    }

    // ─── Views ───────────────────────────────────────────────

    pub async fn dashboard(&self, user_id: &str) -> Result<DashboardView> {
        let username = self.username(user_id).await?;
        let (activities, completions) = self.load(user_id).await?;
        let progression = Progression::resolve(&activities, &completions)?;

        let total = self.total_activities as u32;
        let completed = progression.completed_count() as u32;
        let progress_percent =
            ((f64::from(completed) / f64::from(total)) * 100.0).round() as u32;

        Ok(DashboardView {
            username,
            activities: progression.entries().iter().map(ActivityView::from).collect(),
            completed_count: completed,
            total_activities: total,
            remaining: total.saturating_sub(completed),
            progress_percent,
            current_activity_id: progression.current_activity_id().map(str::to_string),
        })
    }

    pub async fn map(&self, user_id: &str) -> Result<MapView> {
        let (activities, completions) = self.load(user_id).await?;
        let progression = Progression::resolve(&activities, &completions)?;

        let markers = progression
            .entries()
            .iter()
            .map(|e| MapMarker {
                id: e.activity.id.clone(),
                name: e.activity.name.clone(),
                latitude: e.activity.latitude,
                longitude: e.activity.longitude,
                difficulty: e.activity.difficulty,
                sequence_order: e.activity.sequence_order,
                status: e.status,
            })
            .collect();

        Ok(MapView {
            markers,
            current_activity_id: progression.current_activity_id().map(str::to_string),
            completed_count: progression.completed_count() as u32,
            total_activities: self.total_activities as u32,
        })
    }

    /// Activity page guard: completed activities are read-only, the current
    /// one is actionable, locked ones are refused.
    pub async fn activity_detail(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<ActivityDetailView> {
        let (activities, completions) = self.load(user_id).await?;
        let progression = Progression::resolve(&activities, &completions)?;

        let entry = progression
            .entry(activity_id)
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", activity_id)))?;

        let (checked_in_at, elapsed_seconds) = match entry.status {
            ActivityStatus::Locked => {
                return Err(AppError::OutOfSequence(SequenceViolation::NotYetReached))
            }
            ActivityStatus::Completed => (None, None),
            ActivityStatus::Current => {
                let marker = self.db.get_checkin(user_id, activity_id).await?;
                let checked_in_at = marker.map(|m| m.checked_in_at);
                let elapsed = checked_in_at
                    .map(|at| Utc::now().signed_duration_since(at).num_seconds().max(0));
                (checked_in_at, elapsed)
            }
        };

        Ok(ActivityDetailView {
            activity: ActivityView::from(entry),
            can_act: entry.status == ActivityStatus::Current,
            checked_in_at,
            elapsed_seconds,
            timer_display: elapsed_seconds.map(format_timer),
        })
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let (activities, completions, profiles) = tokio::try_join!(
            self.db.list_activities(),
            self.db.list_all_completions(),
            self.db.list_profiles(),
        )?;
        Ok(build_leaderboard(&activities, &completions, &profiles))
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStatsView> {
        let username = self.username(user_id).await?;
        let leaderboard = self.leaderboard().await?;
        let (activities, mut completions) = self.load(user_id).await?;

        completions.sort_by_key(|c| c.created_at);

        let gallery: Vec<GalleryItem> = completions
            .iter()
            .filter_map(|c| {
                let activity = activities.iter().find(|a| a.id == c.activity_id)?;
                Some(GalleryItem {
                    activity_id: activity.id.clone(),
                    activity_name: activity.name.clone(),
                    sequence_order: activity.sequence_order,
                    photo_url: c.photo_url.clone(),
                    duration_seconds: c.duration_seconds,
                    duration_display: format_duration(c.duration_seconds),
                })
            })
            .collect();

        let avg_duration_seconds = if gallery.is_empty() {
            None
        } else {
            let total: i64 = gallery.iter().map(|g| g.duration_seconds).sum();
            Some((total as f64 / gallery.len() as f64).round() as i64)
        };

        Ok(UserStatsView {
            username,
            completed_count: gallery.len() as u32,
            total_activities: self.total_activities as u32,
            position: position_of(&leaderboard, user_id),
            avg_duration_seconds,
            avg_duration_display: avg_duration_seconds.map(format_duration),
            gallery,
        })
    }

    // ─── Write paths ─────────────────────────────────────────

    /// Start the timer for the current activity. Repeated check-ins keep the
    /// first marker.
    pub async fn check_in(&self, user_id: &str, activity_id: &str) -> Result<CheckInView> {
        let (activities, completions) = self.load(user_id).await?;
        Progression::resolve(&activities, &completions)?.check_action(activity_id)?;

        let marker = self
            .db
            .record_checkin(user_id, activity_id, Utc::now())
            .await?;

        tracing::info!(
            user_id,
            activity_id,
            checked_in_at = %marker.checked_in_at,
            "User checked in"
        );

        Ok(CheckInView {
            success: true,
            activity_id: activity_id.to_string(),
            checked_in_at: marker.checked_in_at,
        })
    }

    /// Upload the completion photo for the current activity.
    pub async fn upload_photo(
        &self,
        user_id: &str,
        activity_id: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<PhotoUploadView> {
        let extension = extension_for(content_type).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported photo type '{}'", content_type))
        })?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Photo is empty".to_string()));
        }

        let (activities, completions) = self.load(user_id).await?;
        Progression::resolve(&activities, &completions)?.check_action(activity_id)?;

        let path = photo_path(user_id, activity_id, extension);
        let size = bytes.len();
        let photo_url = self.photos.store(&path, content_type, bytes).await?;

        tracing::info!(user_id, activity_id, size, path = %path, "Completion photo stored");

        Ok(PhotoUploadView { photo_url })
    }

    /// Record a completion for the current activity.
    ///
    /// Authorization is re-checked immediately before the insert; the store's
    /// uniqueness on (user, activity) settles races that pass the check
    /// together. Either way a duplicate comes back as `AlreadyCompleted`.
    pub async fn complete(&self, user_id: &str, request: CompleteRequest) -> Result<Completion> {
        let submission = request.validate()?;
        let activity_id = submission.activity_id.as_str();

        let (activities, completions) = self.load(user_id).await?;
        match Progression::resolve(&activities, &completions)?.check_action(activity_id) {
            Ok(_) => {}
            Err(ProgressionError::OutOfSequence(SequenceViolation::AlreadyCompleted)) => {
                return Err(AppError::AlreadyCompleted)
            }
            Err(e) => return Err(e.into()),
        }

        let (checked_in_at, completed_at) = if self.trust_client_timestamps {
            (submission.checked_in_at, submission.completed_at)
        } else {
            let marker = self
                .db
                .get_checkin(user_id, activity_id)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest("Check in before completing this activity".to_string())
                })?;
            tracing::debug!(
                user_id,
                activity_id,
                client_checked_in_at = %submission.checked_in_at,
                client_completed_at = %submission.completed_at,
                "Scoring with server-side timestamps"
            );
            (marker.checked_in_at, Utc::now())
        };

        if completed_at < checked_in_at {
            return Err(AppError::BadRequest(
                "completed_at must not be before checked_in_at".to_string(),
            ));
        }

        let completion = Completion::new(
            user_id,
            activity_id,
            checked_in_at,
            completed_at,
            submission.photo_url,
        );

        let stored = match self.db.insert_completion(&completion).await {
            Ok(stored) => stored,
            Err(AppError::AlreadyCompleted) => {
                tracing::info!(user_id, activity_id, "Duplicate completion rejected");
                return Err(AppError::AlreadyCompleted);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            user_id,
            activity_id,
            duration_seconds = stored.duration_seconds,
            "Activity completed"
        );

        Ok(stored)
    }
}
