use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Process configuration, read once at startup from the environment
/// (a `.env` file is honored in development via dotenvy).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub site: SiteConfig,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub admin: AdminConfig,

    pub cache: CacheConfig,

    pub uploader: UploaderConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads. 0 = number of CPU cores.
    pub worker_threads: usize,

    /// Directory of locally stored cover/thumbnail images, served under /images.
    pub images_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
            images_path: "images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,

    /// Canonical public origin, used for sitemap/SEO URLs and the
    /// same-origin Referer check.
    pub url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Aozora".to_string(),
            url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: vec!["*".to_string()],
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string. Required: the process refuses to start without it.
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,

    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a taxonomy distinct-value list. Stale entries are
    /// recomputed lazily on the next lookup; catalog writes do not evict.
    pub taxonomy_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            taxonomy_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// API key for the remote video-hosting service. Remote mirror
    /// ingestion is disabled when unset.
    pub api_key: Option<String>,

    pub api_url: String,

    /// Remote uploads are slow on the upstream side; this timeout is
    /// deliberately longer than the shared client default.
    pub request_timeout_seconds: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://doodapi.co/api".to_string(),
            request_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            site: SiteConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            admin: AdminConfig::default(),
            cache: CacheConfig::default(),
            uploader: UploaderConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}

impl Config {
    pub fn load() -> Result<Self> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }

        let mut config = Self::default();

        if let Some(v) = env_var("LOG_LEVEL") {
            config.general.log_level = v;
        }
        if let Some(v) = env_parsed("WORKER_THREADS") {
            config.general.worker_threads = v;
        }
        if let Some(v) = env_var("IMAGES_PATH") {
            config.general.images_path = v;
        }

        if let Some(v) = env_var("SITE_NAME") {
            config.site.name = v;
        }
        if let Some(v) = env_var("SITE_URL") {
            config.site.url = v.trim_end_matches('/').to_string();
        }

        if let Some(v) = env_parsed("PORT") {
            config.server.port = v;
        }
        if let Some(v) = env_var("CORS_ALLOWED_ORIGINS") {
            config.server.cors_allowed_origins =
                v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = env_parsed("SECURE_COOKIES") {
            config.server.secure_cookies = v;
        }

        if let Some(v) = env_var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Some(v) = env_parsed("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = v;
        }
        if let Some(v) = env_parsed("DATABASE_MIN_CONNECTIONS") {
            config.database.min_connections = v;
        }

        if let Some(v) = env_var("ADMIN_USERNAME") {
            config.admin.username = v;
        }
        if let Some(v) = env_var("ADMIN_PASSWORD") {
            config.admin.password = v;
        }

        if let Some(v) = env_parsed("TAXONOMY_TTL_SECONDS") {
            config.cache.taxonomy_ttl_seconds = v;
        }

        config.uploader.api_key = env_var("UPLOADER_API_KEY");
        if let Some(v) = env_var("UPLOADER_API_URL") {
            config.uploader.api_url = v;
        }
        if let Some(v) = env_parsed("UPLOADER_TIMEOUT_SECONDS") {
            config.uploader.request_timeout_seconds = v;
        }

        if let Some(v) = env_parsed("METRICS_ENABLED") {
            config.observability.metrics_enabled = v;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL is not set; the server cannot start without a database");
        }

        if self.admin.password.is_empty() {
            anyhow::bail!("ADMIN_PASSWORD is not set");
        }

        if self.cache.taxonomy_ttl_seconds == 0 {
            anyhow::bail!("TAXONOMY_TTL_SECONDS must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cache.taxonomy_ttl_seconds, 3600);
        assert_eq!(config.site.url, "http://localhost:3000");
        assert!(config.uploader.api_key.is_none());
    }

    #[test]
    fn test_validate_requires_database_url() {
        let mut config = Config::default();
        config.admin.password = "secret".to_string();
        assert!(config.validate().is_err());

        config.database.url = "sqlite:data/aozora.db".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_admin_password() {
        let mut config = Config::default();
        config.database.url = "sqlite:data/aozora.db".to_string();
        assert!(config.validate().is_err());
    }
}
