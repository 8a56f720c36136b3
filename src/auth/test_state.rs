//! Application state for handler tests

use std::sync::Arc;

use super::{IdentityVerifier, Unauthorized, VerifiedClaims, sign_session_id};
use crate::AppState;
use crate::config::{
    AppConfig, LoggingConfig, MetricsConfig, ProviderConfig, ServerConfig, SessionConfig,
};
use crate::data::{MockSessionStore, SessionId};

pub const SECRET: &str = "unit-test-session-secret-32-bytes!";

/// Treats every token as a valid one naming its own subject
pub struct AcceptAll;

#[async_trait::async_trait]
impl IdentityVerifier for AcceptAll {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, Unauthorized> {
        Ok(VerifiedClaims {
            subject: token.to_string(),
            email: None,
            name: None,
        })
    }
}

pub fn config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            domain: "localhost".to_string(),
            protocol: "http".to_string(),
            cors_origins: Vec::new(),
        },
        provider: ProviderConfig {
            client_id: "client".to_string(),
            client_secret: String::new(),
            redirect_uri: None,
            jwks_url: "http://127.0.0.1:1/certs".to_string(),
            issuers: vec!["https://accounts.google.com".to_string()],
            jwks_timeout_secs: 1,
            jwks_default_ttl_secs: 60,
            leeway_secs: 0,
        },
        session: SessionConfig {
            secret: SECRET.to_string(),
            cookie_name: "sid".to_string(),
            idle_timeout_secs: 60,
            max_age_secs: 600,
            max_sessions: 100,
        },
        metrics: MetricsConfig { enabled: false },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

pub fn state_with(store: MockSessionStore) -> AppState {
    AppState::with_components(config(), Arc::new(store), Arc::new(AcceptAll))
}

/// `Cookie` header value carrying a correctly signed `id`
pub fn cookie_for(id: &SessionId) -> String {
    format!("sid={}", sign_session_id(id, SECRET).unwrap())
}
