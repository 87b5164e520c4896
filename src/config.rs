//! Application configuration loaded from environment variables.
//!
//! In production the secrets are injected as environment variables by the
//! deployment; locally they can come from a `.env` file.

use std::env;

const DEFAULT_TOTAL_ACTIVITIES: usize = 12;
const DEFAULT_MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_PHOTO_BUCKET: &str = "completion-photos";

/// Which [`crate::db::Datastore`] implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreKind {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin, cookie security)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Storage backend
    pub datastore: DatastoreKind,
    /// Supabase project URL for photo storage
    pub supabase_url: Option<String>,
    /// Bucket holding completion photos
    pub photo_bucket: String,
    /// Number of stops shown in progress displays
    pub total_activities: usize,
    /// Upper bound on an uploaded photo
    pub max_photo_bytes: usize,
    /// Score completions with client-reported timestamps instead of the
    /// server-side check-in marker and server clock
    pub trust_client_timestamps: bool,

    // --- Secrets ---
    /// JWT signing key shared with the identity provider (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Storage service key
    pub supabase_service_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let datastore = match env::var("DATASTORE").as_deref() {
            Ok("memory") => DatastoreKind::Memory,
            Ok("firestore") | Err(_) => DatastoreKind::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("DATASTORE")),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            datastore,
            supabase_url: env::var("SUPABASE_URL").ok().filter(|v| !v.is_empty()),
            photo_bucket: env::var("PHOTO_BUCKET")
                .unwrap_or_else(|_| DEFAULT_PHOTO_BUCKET.to_string()),
            total_activities: parse_or("TOTAL_ACTIVITIES", DEFAULT_TOTAL_ACTIVITIES)?,
            max_photo_bytes: parse_or("MAX_PHOTO_BYTES", DEFAULT_MAX_PHOTO_BYTES)?,
            trust_client_timestamps: parse_or("TRUST_CLIENT_TIMESTAMPS", false)?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Config for tests: in-memory storage, no object store.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            datastore: DatastoreKind::Memory,
            supabase_url: None,
            photo_bucket: DEFAULT_PHOTO_BUCKET.to_string(),
            total_activities: DEFAULT_TOTAL_ACTIVITIES,
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
            trust_client_timestamps: false,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            supabase_service_key: None,
        }
    }

    /// Whether the session cookie should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        !(self.frontend_url.starts_with("http://localhost")
            || self.frontend_url.starts_with("http://127.0.0.1"))
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
