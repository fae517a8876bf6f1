//! Layered settings: `config/default`, `config/{RUN_MODE}`, then
//! `SPENDBEE__*` environment variables.

use serde::Deserialize;

/// Everything the server binary needs to start.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listener address.
    #[serde(default)]
    pub server: ServerConfig,
    /// Postgres connection pool.
    pub database: DatabaseConfig,
    /// Session tokens and cookie.
    pub jwt: JwtSettings,
    /// Exchange rate feed configuration.
    #[serde(default)]
    pub exchange_rates: ExchangeRateConfig,
    /// Public-facing application settings.
    #[serde(default)]
    pub app: PublicAppConfig,
}

/// Where the HTTP listener binds.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface address.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Postgres connection pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` connection string.
    pub url: String,
    /// Pool ceiling.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Session token settings as read from config files.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// HMAC secret; there is no default.
    pub secret: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
    /// Whether the session cookie carries the `Secure` attribute.
    #[serde(default = "default_secure_cookie")]
    pub secure_cookie: bool,
}

fn default_token_expiry() -> u64 {
    2_592_000 // 30 days
}

fn default_secure_cookie() -> bool {
    true
}

/// Exchange rate feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRateConfig {
    /// URL of the daily reference-rate XML feed.
    #[serde(default = "default_rate_source_url")]
    pub source_url: String,
    /// Minimum age in seconds before the cached snapshot is refreshed.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Upper bound in seconds for a single feed request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        Self {
            source_url: default_rate_source_url(),
            refresh_interval_secs: default_refresh_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_rate_source_url() -> String {
    "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-daily.xml".to_string()
}

fn default_refresh_interval() -> u64 {
    86_400
}

fn default_request_timeout() -> u64 {
    10
}

/// Public-facing application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicAppConfig {
    /// Base URL used when building invitation links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for PublicAppConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
        }
    }
}

fn default_public_url() -> String {
    "http://localhost:5173".to_string()
}

impl AppConfig {
    /// Merges the config files and environment into one `AppConfig`.
    ///
    /// # Errors
    ///
    /// Fails when a required key such as `database.url` or `jwt.secret` is
    /// missing, or a value has the wrong type.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SPENDBEE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
