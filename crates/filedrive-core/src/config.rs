//! Configuration module
//!
//! Settings are read once at startup from the process environment (with `.env` support)
//! and handed to the components that need them.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_FILE_TTL_DAYS,
    DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_METADATA_WRITE_MAX_ATTEMPTS, DEFAULT_PORT,
    DEFAULT_PRESIGNED_URL_TTL_SECS, MIN_JWT_SECRET_LENGTH,
};
use crate::storage_types::{MetadataBackend, StorageBackend};

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Which identity verifier checks bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    /// Firebase ID tokens (RS256, Google-published keys)
    Firebase,
    /// HS256 tokens signed with `JWT_SECRET`
    Jwt,
}

impl std::str::FromStr for AuthProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "firebase" => Ok(AuthProvider::Firebase),
            "jwt" => Ok(AuthProvider::Jwt),
            _ => Err(anyhow::anyhow!("Invalid auth provider: {}", s)),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub log_json: bool,
    // Metadata store
    pub metadata_backend: MetadataBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Object storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub storage_signing_secret: Option<String>,
    // Identity
    pub auth_provider: AuthProvider,
    pub firebase_project_id: Option<String>,
    pub firebase_jwks_url: String,
    pub jwt_secret: Option<String>,
    // Upload pipeline
    pub max_file_size_bytes: usize,
    /// Days until a file expires. 0 = files never expire.
    pub file_ttl_days: i64,
    pub presigned_url_ttl_secs: u64,
    /// Interval in seconds between expired-file sweeps. 0 = disabled.
    pub cleanup_interval_secs: u64,
    pub metadata_write_max_attempts: u32,
}

impl Config {
    /// Load configuration from the environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let metadata_backend = match lookup("METADATA_BACKEND") {
            Some(value) => value.parse()?,
            None => MetadataBackend::Postgres,
        };

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let auth_provider = match lookup("AUTH_PROVIDER") {
            Some(value) => value.parse()?,
            None => AuthProvider::Firebase,
        };

        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(default)
        };

        Ok(Config {
            environment,
            server_port: u16::try_from(number("PORT", DEFAULT_PORT as u64))
                .unwrap_or(DEFAULT_PORT),
            cors_origins,
            log_json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            metadata_backend,
            database_url: lookup("DATABASE_URL"),
            db_max_connections: number("DB_MAX_CONNECTIONS", MAX_CONNECTIONS as u64) as u32,
            db_timeout_seconds: number("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: lookup("S3_BUCKET").or_else(|| lookup("FILE_BUCKET_NAME")),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            storage_signing_secret: lookup("STORAGE_SIGNING_SECRET"),
            auth_provider,
            firebase_project_id: lookup("FIREBASE_PROJECT_ID"),
            firebase_jwks_url: lookup("FIREBASE_JWKS_URL")
                .unwrap_or_else(|| FIREBASE_JWKS_URL.to_string()),
            jwt_secret: lookup("JWT_SECRET"),
            max_file_size_bytes: number("MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB as u64)
                as usize
                * 1024
                * 1024,
            file_ttl_days: lookup("FILE_TTL_DAYS")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_FILE_TTL_DAYS),
            presigned_url_ttl_secs: number(
                "PRESIGNED_URL_TTL_SECS",
                DEFAULT_PRESIGNED_URL_TTL_SECS,
            ),
            cleanup_interval_secs: number(
                "CLEANUP_INTERVAL_SECS",
                DEFAULT_CLEANUP_INTERVAL_SECS,
            ),
            metadata_write_max_attempts: number(
                "METADATA_WRITE_MAX_ATTEMPTS",
                DEFAULT_METADATA_WRITE_MAX_ATTEMPTS as u64,
            ) as u32,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.metadata_write_max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "METADATA_WRITE_MAX_ATTEMPTS must be at least 1"
            ));
        }

        if self.file_ttl_days < 0 {
            return Err(anyhow::anyhow!("FILE_TTL_DAYS cannot be negative"));
        }

        if self.metadata_backend == MetadataBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
                }
                Some(_) => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when using the postgres metadata backend"
                    ))
                }
            }
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                if self.storage_signing_secret.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_SIGNING_SECRET must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        match self.auth_provider {
            AuthProvider::Firebase => {
                if self.firebase_project_id.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "FIREBASE_PROJECT_ID must be set when AUTH_PROVIDER=firebase"
                    ));
                }
            }
            AuthProvider::Jwt => {
                let secret = self.jwt_secret.as_deref().unwrap_or("");
                if secret.len() < MIN_JWT_SECRET_LENGTH {
                    return Err(anyhow::anyhow!(
                        "JWT_SECRET must be at least {} characters long",
                        MIN_JWT_SECRET_LENGTH
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn metadata_backend(&self) -> MetadataBackend {
        self.metadata_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn storage_signing_secret(&self) -> Option<&str> {
        self.storage_signing_secret.as_deref()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_bytes
    }

    /// Lifetime of a stored file, or `None` when files never expire.
    pub fn file_ttl(&self) -> Option<chrono::Duration> {
        (self.file_ttl_days > 0).then(|| chrono::Duration::days(self.file_ttl_days))
    }

    pub fn presigned_url_ttl(&self) -> Duration {
        Duration::from_secs(self.presigned_url_ttl_secs)
    }

    /// Interval between expired-file sweeps, or `None` when the sweep is disabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_secs > 0).then(|| Duration::from_secs(self.cleanup_interval_secs))
    }
}
