//! Configuration module
//!
//! Service configuration loaded from the environment (and `.env` when present):
//! server, database, object storage, session verification and upload policy.

use std::env;

use crate::storage_types::StorageBackend;
use crate::validation::policy::{
    UploadPolicy, AUTHORITATIVE_MAX_BYTES, DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_FILES,
};

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const UPLOAD_EXPIRY_SECS: u64 = 300;
const MAX_UPLOAD_EXPIRY_SECS: u64 = 3600;
const MIN_JWT_SECRET_LEN: usize = 32;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Upload service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    /// Postgres connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    // Upload policy
    pub upload_allowed_types: Vec<String>,
    pub upload_max_bytes: u64,
    pub upload_max_files: usize,
    pub upload_expiry_seconds: u64,
    pub verify_uploaded_objects: bool,
    // Session verification
    pub session_jwt_secret: String,
    pub session_jwt_issuer: Option<String>,
    pub session_jwt_audience: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Authoritative upload policy built from the configured allow-list and bounds.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.inner().upload_allowed_types.clone(),
            self.inner().upload_max_bytes,
            self.inner().upload_max_files,
        )
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn aws_access_key_id(&self) -> Option<&str> {
        self.inner().aws_access_key_id.as_deref()
    }

    pub fn aws_secret_access_key(&self) -> Option<&str> {
        self.inner().aws_secret_access_key.as_deref()
    }

    pub fn aws_session_token(&self) -> Option<&str> {
        self.inner().aws_session_token.as_deref()
    }

    pub fn upload_max_bytes(&self) -> u64 {
        self.inner().upload_max_bytes
    }

    pub fn upload_expiry_seconds(&self) -> u64 {
        self.inner().upload_expiry_seconds
    }

    pub fn verify_uploaded_objects(&self) -> bool {
        self.inner().verify_uploaded_objects
    }

    pub fn session_jwt_secret(&self) -> &str {
        &self.inner().session_jwt_secret
    }

    pub fn session_jwt_issuer(&self) -> Option<&str> {
        self.inner().session_jwt_issuer.as_deref()
    }

    pub fn session_jwt_audience(&self) -> Option<&str> {
        self.inner().session_jwt_audience.as_deref()
    }
}

fn is_production(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let upload_allowed_types = match optional_var("UPLOAD_ALLOWED_TYPES") {
            Some(types) => types
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
        };

        let storage_backend = match optional_var("STORAGE_BACKEND") {
            Some(backend) => backend.parse()?,
            None => StorageBackend::S3,
        };

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let config = ServiceConfig {
            base,
            database_url: optional_var("DATABASE_URL"),
            storage_backend,
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION"),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            aws_region: optional_var("AWS_REGION"),
            aws_access_key_id: optional_var("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_var("AWS_SECRET_ACCESS_KEY"),
            aws_session_token: optional_var("AWS_SESSION_TOKEN"),
            upload_allowed_types,
            upload_max_bytes: env::var("UPLOAD_MAX_BYTES")
                .unwrap_or_else(|_| AUTHORITATIVE_MAX_BYTES.to_string())
                .parse()
                .unwrap_or(AUTHORITATIVE_MAX_BYTES),
            upload_max_files: env::var("UPLOAD_MAX_FILES")
                .unwrap_or_else(|_| DEFAULT_MAX_FILES.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_FILES),
            upload_expiry_seconds: env::var("UPLOAD_EXPIRY_SECONDS")
                .unwrap_or_else(|_| UPLOAD_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_EXPIRY_SECS),
            verify_uploaded_objects: env::var("VERIFY_UPLOADED_OBJECTS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            session_jwt_secret: env::var("SESSION_JWT_SECRET").map_err(|_| {
                anyhow::anyhow!("SESSION_JWT_SECRET must be set for session verification")
            })?,
            session_jwt_issuer: optional_var("SESSION_JWT_ISSUER"),
            session_jwt_audience: optional_var("SESSION_JWT_AUDIENCE"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.session_jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "SESSION_JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        if let Some(ref url) = self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.upload_allowed_types.is_empty() {
            return Err(anyhow::anyhow!(
                "UPLOAD_ALLOWED_TYPES must list at least one content type"
            ));
        }

        if self.upload_max_bytes == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_BYTES cannot be 0"));
        }

        if self.upload_max_files == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_FILES cannot be 0"));
        }

        if self.upload_expiry_seconds == 0 || self.upload_expiry_seconds > MAX_UPLOAD_EXPIRY_SECS {
            return Err(anyhow::anyhow!(
                "UPLOAD_EXPIRY_SECONDS must be between 1 and {}",
                MAX_UPLOAD_EXPIRY_SECS
            ));
        }

        if self.storage_backend == StorageBackend::S3 {
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
            if self.aws_access_key_id.is_none() || self.aws_secret_access_key.is_none() {
                return Err(anyhow::anyhow!(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set to sign upload URLs"
                ));
            }
        }

        Ok(())
    }
}
