// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Activities (read-only catalog)
//! - Completions (one document per user and activity)
//! - Check-ins (server-side timer start markers)
//! - Profiles (leaderboard names)

use crate::db::{collections, Datastore};
use crate::error::AppError;
use crate::models::completion::completion_doc_id;
use crate::models::{Activity, CheckIn, Completion, Profile, UsernameClaim};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes a dummy token; skip the credential lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    async fn get_username_claim(&self, username: &str) -> Result<Option<UsernameClaim>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERNAMES)
            .obj()
            .one(username)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a catalog entry. Used for seeding and tests; the service never
    /// mutates the catalog.
    pub async fn set_activity(&self, activity: &Activity) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Datastore for FirestoreDb {
    // ─── Activity Operations ─────────────────────────────────────

    async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .order_by([(
                "sequence_order",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Completion Operations ───────────────────────────────────

    async fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::COMPLETIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_all_completions(&self) -> Result<Vec<Completion>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::COMPLETIONS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Uses a create (not upsert) write: Firestore rejects the second of two
    /// racing inserts for the same document ID with `AlreadyExists`.
    async fn insert_completion(&self, completion: &Completion) -> Result<Completion, AppError> {
        let result: Result<Completion, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::COMPLETIONS)
            .document_id(&completion.id)
            .object(completion)
            .execute()
            .await;

        match result {
            Ok(stored) => Ok(stored),
            Err(FirestoreError::DataConflictError(_)) => Err(AppError::AlreadyCompleted),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    // ─── Check-in Operations ─────────────────────────────────────

    async fn record_checkin(
        &self,
        user_id: &str,
        activity_id: &str,
        at: DateTime<Utc>,
    ) -> Result<CheckIn, AppError> {
        let marker = CheckIn {
            user_id: user_id.to_string(),
            activity_id: activity_id.to_string(),
            checked_in_at: at,
        };

        let result: Result<CheckIn, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::CHECKINS)
            .document_id(completion_doc_id(user_id, activity_id))
            .object(&marker)
            .execute()
            .await;

        match result {
            Ok(stored) => Ok(stored),
            Err(FirestoreError::DataConflictError(_)) => self
                .get_checkin(user_id, activity_id)
                .await?
                .ok_or_else(|| {
                    AppError::Database("Check-in vanished after conflict".to_string())
                }),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn get_checkin(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<CheckIn>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::CHECKINS)
            .obj()
            .one(&completion_doc_id(user_id, activity_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Profile>, AppError> {
        let username = username.to_string();
        let matches: Vec<Profile> = self
            .client
            .fluent()
            .select()
            .from(collections::PROFILES)
            .filter(move |q| q.for_all([q.field("username").eq(username.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::PROFILES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create-only write keyed by the username, like completions: of two
    /// racing claims Firestore rejects the second with `AlreadyExists`.
    async fn claim_username(&self, username: &str, user_id: &str) -> Result<(), AppError> {
        let claim = UsernameClaim {
            username: username.to_string(),
            user_id: user_id.to_string(),
            claimed_at: Utc::now(),
        };

        let result: Result<UsernameClaim, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERNAMES)
            .document_id(username)
            .object(&claim)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => {
                match self.get_username_claim(username).await? {
                    Some(existing) if existing.user_id == user_id => Ok(()),
                    _ => Err(AppError::Conflict(format!(
                        "Username '{}' is already taken",
                        username
                    ))),
                }
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn release_username(&self, username: &str, user_id: &str) -> Result<(), AppError> {
        match self.get_username_claim(username).await? {
            Some(claim) if claim.user_id == user_id => {
                self.client
                    .fluent()
                    .delete()
                    .from(collections::USERNAMES)
                    .document_id(username)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
