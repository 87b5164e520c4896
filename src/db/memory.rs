// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory datastore for local development and tests.
//!
//! Per-document maps mirror the Firestore collections. `DashMap::entry`
//! locks the shard, so create-only writes are atomic like Firestore's.

use crate::db::Datastore;
use crate::error::AppError;
use crate::models::completion::completion_doc_id;
use crate::models::{Activity, CheckIn, Completion, Profile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryDb {
    activities: Arc<DashMap<String, Activity>>,
    completions: Arc<DashMap<String, Completion>>,
    checkins: Arc<DashMap<String, CheckIn>>,
    profiles: Arc<DashMap<String, Profile>>,
    /// username -> owning user ID
    usernames: Arc<DashMap<String, String>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a catalog.
    pub fn with_activities(activities: impl IntoIterator<Item = Activity>) -> Self {
        let db = Self::new();
        for activity in activities {
            db.activities.insert(activity.id.clone(), activity);
        }
        db
    }

    /// Number of stored completions for (user, activity). Test helper.
    pub fn completion_count(&self, user_id: &str, activity_id: &str) -> usize {
        self.completions
            .iter()
            .filter(|c| c.user_id == user_id && c.activity_id == activity_id)
            .count()
    }
}

fn username_taken(username: &str) -> AppError {
    AppError::Conflict(format!("Username '{}' is already taken", username))
}

#[async_trait]
impl Datastore for MemoryDb {
    async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        let mut activities: Vec<Activity> =
            self.activities.iter().map(|a| a.value().clone()).collect();
        activities.sort_by_key(|a| a.sequence_order);
        Ok(activities)
    }

    async fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>, AppError> {
        Ok(self
            .completions
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone())
            .collect())
    }

    async fn list_all_completions(&self) -> Result<Vec<Completion>, AppError> {
        Ok(self.completions.iter().map(|c| c.value().clone()).collect())
    }

    async fn insert_completion(&self, completion: &Completion) -> Result<Completion, AppError> {
        let key = completion_doc_id(&completion.user_id, &completion.activity_id);
        match self.completions.entry(key) {
            Entry::Occupied(_) => Err(AppError::AlreadyCompleted),
            Entry::Vacant(slot) => {
                slot.insert(completion.clone());
                Ok(completion.clone())
            }
        }
    }

    async fn record_checkin(
        &self,
        user_id: &str,
        activity_id: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckIn, AppError> {
        let marker = self
            .checkins
            .entry(completion_doc_id(user_id, activity_id))
            .or_insert_with(|| CheckIn {
                user_id: user_id.to_string(),
                activity_id: activity_id.to_string(),
                checked_in_at: at,
            });
        Ok(marker.value().clone())
    }

    async fn get_checkin(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<CheckIn>, AppError> {
        Ok(self
            .checkins
            .get(&completion_doc_id(user_id, activity_id))
            .map(|c| c.value().clone()))
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        Ok(self.profiles.get(user_id).map(|p| p.value().clone()))
    }

    async fn find_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Profile>, AppError> {
        Ok(self
            .profiles
            .iter()
            .find(|p| p.username == username)
            .map(|p| p.value().clone()))
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        Ok(self.profiles.iter().map(|p| p.value().clone()).collect())
    }

    async fn claim_username(&self, username: &str, user_id: &str) -> Result<(), AppError> {
        match self.usernames.entry(username.to_string()) {
            Entry::Occupied(owner) if owner.get() == user_id => Ok(()),
            Entry::Occupied(_) => Err(username_taken(username)),
            Entry::Vacant(slot) => {
                slot.insert(user_id.to_string());
                Ok(())
            }
        }
    }

    async fn release_username(&self, username: &str, user_id: &str) -> Result<(), AppError> {
        self.usernames.remove_if(username, |_, owner| owner == user_id);
        Ok(())
    }
}
