// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completion photo storage.
//!
//! Photos live at `{user_id}/{activity_id}.{ext}` in a public bucket.
//! Uploading to the same path overwrites the previous object.

use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Object store for completion photos.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Store `bytes` at `path` and return the public URL.
    async fn store(&self, path: &str, content_type: &str, bytes: Vec<u8>)
        -> Result<String, AppError>;
}

/// Map an image content type to the file extension used in the object path.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Object path for a user's photo of an activity.
pub fn photo_path(user_id: &str, activity_id: &str, extension: &str) -> String {
    format!(
        "{}/{}.{}",
        urlencoding::encode(user_id),
        urlencoding::encode(activity_id),
        extension
    )
}

// ─── Supabase Storage ────────────────────────────────────────

/// Client for the Supabase Storage REST API.
#[derive(Clone)]
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: String, bucket: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl PhotoStore for SupabaseStorage {
    async fn store(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );
        let size = bytes.len();

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("HTTP {}: {}", status, body)));
        }

        tracing::debug!(path, size, "Photo uploaded");
        Ok(self.public_url(path))
    }
}

// ─── In-memory store ─────────────────────────────────────────

/// Keeps photos in memory; used when no object store is configured.
#[derive(Clone, Default)]
pub struct MemoryPhotoStore {
    objects: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.get(path).map(|o| o.value().clone())
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn store(
        &self,
        path: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        self.objects.insert(path.to_string(), bytes);
        Ok(format!("memory://completion-photos/{}", path))
    }
}
