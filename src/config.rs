//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::net::IpAddr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub session: SessionConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public domain (e.g., "dues.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Frontend origins allowed to call the API with credentials
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Get the base URL for the service
    ///
    /// # Returns
    /// Full URL like "https://dues.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3001".to_string()]
}

/// Identity provider configuration (Google Sign-In)
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client ID; also the expected ID token audience
    pub client_id: String,
    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,
    /// Registered redirect URI
    pub redirect_uri: Option<String>,
    /// Provider's published signing keys (JWKS)
    pub jwks_url: String,
    /// Accepted `iss` claim values
    pub issuers: Vec<String>,
    /// Timeout for the key set fetch in seconds
    pub jwks_timeout_secs: u64,
    /// Key set cache lifetime when the provider sends no max-age
    pub jwks_default_ttl_secs: u64,
    /// Allowed clock skew for exp/nbf/iat in seconds
    pub leeway_secs: u64,
}

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Cookie signing secret (32+ bytes)
    pub secret: String,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Session is dropped after this many seconds without a request
    pub idle_timeout_secs: u64,
    /// Absolute session lifetime in seconds (default: 604800 = 7 days)
    pub max_age_secs: u64,
    /// Upper bound on live sessions held in memory
    pub max_sessions: u64,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Expose GET /metrics
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (DUES_PORTAL__*)
    /// 5. Plain provider variables (GOOGLE_CLIENT_ID, SESSION_SECRET, PORT, ...)
    ///
    /// A `.env` file in the working directory is read first, if present.
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};
        use std::env;

        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("server.cors_origins", default_cors_origins())?
            .set_default("provider.client_id", "")?
            .set_default("provider.client_secret", "")?
            .set_default("provider.jwks_url", "https://www.googleapis.com/oauth2/v3/certs")?
            .set_default(
                "provider.issuers",
                vec!["accounts.google.com", "https://accounts.google.com"],
            )?
            .set_default("provider.jwks_timeout_secs", 10)?
            .set_default("provider.jwks_default_ttl_secs", 3600)?
            .set_default("provider.leeway_secs", 300)?
            .set_default("session.secret", "")?
            .set_default("session.cookie_name", "sid")?
            .set_default("session.idle_timeout_secs", 7200)?
            .set_default("session.max_age_secs", 604800)?
            .set_default("session.max_sessions", 100_000)?
            .set_default("metrics.enabled", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (DUES_PORTAL__*)
            .add_source(
                Environment::with_prefix("DUES_PORTAL")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .with_list_parse_key("provider.issuers")
                    .try_parsing(true),
            )
            .set_override_option("provider.client_id", env::var("GOOGLE_CLIENT_ID").ok())?
            .set_override_option(
                "provider.client_secret",
                env::var("GOOGLE_CLIENT_SECRET").ok(),
            )?
            .set_override_option(
                "provider.redirect_uri",
                env::var("GOOGLE_CALLBACK_URL").ok(),
            )?
            .set_override_option("session.secret", env::var("SESSION_SECRET").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.session.secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "session.secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.provider.client_id.trim().is_empty() {
            return Err(AppError::Config(
                "provider.client_id must be set (GOOGLE_CLIENT_ID)".to_string(),
            ));
        }

        if self.provider.issuers.is_empty() {
            return Err(AppError::Config(
                "provider.issuers must list at least one issuer".to_string(),
            ));
        }

        url::Url::parse(&self.provider.jwks_url)
            .map_err(|e| AppError::Config(format!("provider.jwks_url is invalid: {e}")))?;

        if let Some(redirect_uri) = &self.provider.redirect_uri {
            url::Url::parse(redirect_uri)
                .map_err(|e| AppError::Config(format!("provider.redirect_uri is invalid: {e}")))?;
        }

        if self.provider.jwks_timeout_secs == 0 {
            return Err(AppError::Config(
                "provider.jwks_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.session.max_age_secs == 0 || self.session.idle_timeout_secs == 0 {
            return Err(AppError::Config(
                "session.max_age_secs and session.idle_timeout_secs must be greater than 0"
                    .to_string(),
            ));
        }

        if self.session.idle_timeout_secs > self.session.max_age_secs {
            return Err(AppError::Config(
                "session.idle_timeout_secs must not exceed session.max_age_secs".to_string(),
            ));
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(AppError::Config(
                "session.cookie_name must not be empty".to_string(),
            ));
        }

        if !self.should_use_secure_cookies() {
            let host = normalized_server_host(&self.server.domain);
            tracing::warn!(
                host = %host,
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    // Bracketed IPv6 hosts come back from the URL parser as "[::1]"
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
