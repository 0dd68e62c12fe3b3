/// Configuration management for Story Service
///
/// All settings come from environment variables (a `.env` file is loaded
/// first by `main`).
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Cache (Redis) configuration
    pub cache: CacheConfig,
    /// JWT validation
    pub auth: AuthConfig,
    /// Image upload collaborator
    pub media: MediaConfig,
    /// Ranking candidate limits
    pub ranking: RankingConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Where stories, preferences and bookmarks live
    pub storage: StorageBackend,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL stories/bookmarks, Redis preferences
    Postgres,
    /// Process-local maps, lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "unknown storage backend '{}' (expected postgres or memory)",
                other
            )),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub url: String,
    /// Prefix of the per-user preference hashes
    pub preference_key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity service
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Upload endpoint; uploads are disabled when empty
    pub upload_url: String,
    pub upload_preset: String,
    pub timeout_secs: u64,
}

impl MediaConfig {
    pub fn is_enabled(&self) -> bool {
        !self.upload_url.trim().is_empty()
    }
}

/// Candidate caps for the ranking modes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub most_liked_limit: u32,
    pub trending_limit: u32,
    pub feed_candidate_limit: u32,
    /// Store page size used when reading unpaged listings
    pub list_batch_size: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            most_liked_limit: 50,
            trending_limit: 100,
            feed_candidate_limit: 1_000,
            list_batch_size: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");
        let ranking_defaults = RankingConfig::default();

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("STORY_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("STORY_SERVICE_PORT", 8085)?,
                storage: parse_env_or_default("STORAGE_BACKEND", StorageBackend::Postgres)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if is_production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if is_production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/unsaid".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            cache: CacheConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                preference_key_prefix: std::env::var("PREFERENCE_KEY_PREFIX")
                    .unwrap_or_else(|_| "story:pref".to_string()),
            },
            auth: {
                let jwt_secret = match std::env::var("JWT_SECRET") {
                    Ok(value) if !value.trim().is_empty() => value,
                    _ if is_production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    _ => "dev-secret-change-me".to_string(),
                };
                AuthConfig { jwt_secret }
            },
            media: MediaConfig {
                upload_url: std::env::var("MEDIA_UPLOAD_URL").unwrap_or_default(),
                upload_preset: std::env::var("MEDIA_UPLOAD_PRESET")
                    .unwrap_or_else(|_| "unsigned".to_string()),
                timeout_secs: parse_env_or_default("MEDIA_UPLOAD_TIMEOUT_SECS", 30)?,
            },
            ranking: RankingConfig {
                most_liked_limit: parse_env_or_default(
                    "MOST_LIKED_LIMIT",
                    ranking_defaults.most_liked_limit,
                )?,
                trending_limit: parse_env_or_default(
                    "TRENDING_LIMIT",
                    ranking_defaults.trending_limit,
                )?,
                feed_candidate_limit: parse_env_or_default(
                    "FEED_CANDIDATE_LIMIT",
                    ranking_defaults.feed_candidate_limit,
                )?,
                list_batch_size: parse_env_or_default(
                    "STORY_LIST_BATCH_SIZE",
                    ranking_defaults.list_batch_size,
                )?,
            },
        })
    }
}

/// Unset means `default`; a set but unparsable value is an error.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
