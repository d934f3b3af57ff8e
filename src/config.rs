use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub tables: TableSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub url: String,
    pub service_key: String,
    pub jwt_secret: String,
    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: String,
}

fn default_jwt_audience() -> String { "authenticated".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    #[serde(default = "default_profiles_table")]
    pub profiles: String,
    #[serde(default = "default_requests_table")]
    pub blood_requests: String,
    #[serde(default = "default_messages_table")]
    pub messages: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            profiles: default_profiles_table(),
            blood_requests: default_requests_table(),
            messages: default_messages_table(),
        }
    }
}

fn default_profiles_table() -> String { "profiles".to_string() }
fn default_requests_table() -> String { "blood_requests".to_string() }
fn default_messages_table() -> String { "messages".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Without a Redis URL the service runs with the in-process cache only
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_eligibility_window_days")]
    pub eligibility_window_days: i64,
    /// Radius used when matching donors to a request without an explicit one
    #[serde(default = "default_max_distance_km")]
    pub default_max_distance_km: f64,
    #[serde(default = "default_urgent_feed_size")]
    pub urgent_feed_size: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            eligibility_window_days: default_eligibility_window_days(),
            default_max_distance_km: default_max_distance_km(),
            urgent_feed_size: default_urgent_feed_size(),
        }
    }
}

fn default_eligibility_window_days() -> i64 { crate::core::ELIGIBILITY_WINDOW_DAYS }
fn default_max_distance_km() -> f64 { 50.0 }
fn default_urgent_feed_size() -> usize { 3 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with BLOODLINK__)
    /// 5. The project's SUPABASE_* variables
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., BLOODLINK__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        apply_store_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        apply_store_overrides(settings)?.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("BLOODLINK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Let the variables the hosted project hands out override the store section
fn apply_store_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    for (var, key) in [
        ("SUPABASE_URL", "store.url"),
        ("SUPABASE_SERVICE_KEY", "store.service_key"),
        ("SUPABASE_JWT_SECRET", "store.jwt_secret"),
        ("REDIS_URL", "cache.redis_url"),
    ] {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
