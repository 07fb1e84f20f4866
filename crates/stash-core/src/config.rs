//! Configuration module
//!
//! Settings are injected into the ingestion pipelines at construction time;
//! nothing below the binary reads the environment directly.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const SERVER_URL: &str = "http://localhost:3000";
const UPLOAD_LOCATION: &str = "uploads";
const THUMBNAIL_WIDTH: u32 = 317;
const THUMBNAIL_HEIGHT: u32 = 262;
const REMOTE_QUALITY: u8 = 60;
const REMOTE_DEFAULT_TAG: &str = "avatars";
const REMOTE_NAMESPACE: &str = "file";
const REMOTE_TIMEOUT_SECS: u64 = 60;
const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Fixed output geometry of the local thumbnail derivative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThumbnailGeometry {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailGeometry {
    fn default() -> Self {
        Self {
            width: THUMBNAIL_WIDTH,
            height: THUMBNAIL_HEIGHT,
        }
    }
}

impl ThumbnailGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Filename prefix for derivatives of this geometry, `{height}x{width}-`.
    pub fn prefix(&self) -> String {
        format!("{}x{}-", self.height, self.width)
    }

    /// Name of the derivative generated from `filename`.
    pub fn derivative_name(&self, filename: &str) -> String {
        format!("{}{}", self.prefix(), filename)
    }
}

/// Remote object storage provider settings
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteSettings {
    /// `cloudinary://<api_key>:<api_secret>@<cloud_name>`; takes precedence over the split fields.
    pub cloudinary_url: Option<String>,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_base: String,
    /// Compression quality hint sent with every upload (1-100).
    pub quality: u8,
    /// Tag applied when the caller supplies none.
    pub default_tag: String,
    /// Prefix of every public id, e.g. `file` in `file/<unique name>`.
    pub namespace: String,
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            cloudinary_url: None,
            cloud_name: None,
            api_key: None,
            api_secret: None,
            api_base: CLOUDINARY_API_BASE.to_string(),
            quality: REMOTE_QUALITY,
            default_tag: REMOTE_DEFAULT_TAG.to_string(),
            namespace: REMOTE_NAMESPACE.to_string(),
            timeout_secs: REMOTE_TIMEOUT_SECS,
        }
    }
}

impl RemoteSettings {
    /// Whether enough credentials are present to build a provider client.
    pub fn is_configured(&self) -> bool {
        self.cloudinary_url.is_some()
            || (self.cloud_name.is_some() && self.api_key.is_some() && self.api_secret.is_some())
    }
}

/// Persistence gateway connection settings
#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseSettings {
    /// When unset, callers fall back to the in-memory repository.
    pub url: Option<String>,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: MAX_CONNECTIONS,
            timeout_seconds: CONNECTION_TIMEOUT_SECS,
        }
    }
}

/// Configuration of the ingestion pipelines.
#[derive(Clone, Debug, PartialEq)]
pub struct IngestConfig {
    /// Base address for locally served files; `origin_url` is `{server_url}/image/{filename}`.
    pub server_url: String,
    /// Directory uploads are landed in and derivatives are written to.
    pub upload_dir: PathBuf,
    pub thumbnail: ThumbnailGeometry,
    pub remote: RemoteSettings,
    pub database: DatabaseSettings,
    pub environment: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            server_url: SERVER_URL.to_string(),
            upload_dir: PathBuf::from(UPLOAD_LOCATION),
            thumbnail: ThumbnailGeometry::default(),
            remote: RemoteSettings::default(),
            database: DatabaseSettings::default(),
            environment: "development".to_string(),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl IngestConfig {
    /// Load `.env` (if present) and build the configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let remote = RemoteSettings {
            cloudinary_url: non_empty("CLOUDINARY_URL"),
            cloud_name: non_empty("CLOUDINARY_CLOUD_NAME"),
            api_key: non_empty("CLOUDINARY_API_KEY"),
            api_secret: non_empty("CLOUDINARY_API_SECRET"),
            api_base: non_empty("CLOUDINARY_API_BASE").unwrap_or(defaults.remote.api_base),
            quality: parse_or(lookup("REMOTE_QUALITY"), defaults.remote.quality),
            default_tag: non_empty("REMOTE_DEFAULT_TAG").unwrap_or(defaults.remote.default_tag),
            namespace: non_empty("REMOTE_NAMESPACE").unwrap_or(defaults.remote.namespace),
            timeout_secs: parse_or(lookup("REMOTE_TIMEOUT_SECS"), defaults.remote.timeout_secs),
        };

        let database = DatabaseSettings {
            url: non_empty("DATABASE_URL"),
            max_connections: parse_or(
                lookup("DB_MAX_CONNECTIONS"),
                defaults.database.max_connections,
            ),
            timeout_seconds: parse_or(
                lookup("DB_TIMEOUT_SECONDS"),
                defaults.database.timeout_seconds,
            ),
        };

        Self {
            server_url: non_empty("SERVER_URL").unwrap_or(defaults.server_url),
            upload_dir: non_empty("UPLOAD_LOCATION")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            thumbnail: ThumbnailGeometry {
                width: parse_or(lookup("THUMBNAIL_WIDTH"), defaults.thumbnail.width),
                height: parse_or(lookup("THUMBNAIL_HEIGHT"), defaults.thumbnail.height),
            },
            remote,
            database,
            environment: non_empty("ENVIRONMENT")
                .or_else(|| non_empty("APP_ENV"))
                .unwrap_or(defaults.environment),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "SERVER_URL must be an http(s) address, got '{}'",
                self.server_url
            ));
        }
        if self.thumbnail.width == 0 || self.thumbnail.height == 0 {
            return Err(anyhow::anyhow!(
                "Thumbnail geometry must be non-zero, got {}x{}",
                self.thumbnail.width,
                self.thumbnail.height
            ));
        }
        if !(1..=100).contains(&self.remote.quality) {
            return Err(anyhow::anyhow!(
                "REMOTE_QUALITY must be between 1 and 100, got {}",
                self.remote.quality
            ));
        }
        let namespace = &self.remote.namespace;
        if namespace.is_empty() || namespace.starts_with('/') || namespace.ends_with('/') {
            return Err(anyhow::anyhow!(
                "REMOTE_NAMESPACE must be non-empty without leading or trailing '/', got '{}'",
                namespace
            ));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }
        Ok(())
    }

    /// Public URL of a file served from the upload directory.
    pub fn local_file_url(&self, filename: &str) -> String {
        format!("{}/image/{}", self.server_url.trim_end_matches('/'), filename)
    }
}
