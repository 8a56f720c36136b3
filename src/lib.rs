//! Dues Portal - Google Sign-In session backend for the member dues portal
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /auth/google/callback, /auth/logout                      │
//! │  - /api/user, /api/dues                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Auth Layer                            │
//! │  - ID token verification (provider JWKS)                    │
//! │  - Signed session cookies                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - In-memory session store (Moka)                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for the JSON API
//! - `auth`: Google Sign-In verification and sessions
//! - `data`: Session store and user records
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request. The session store and verifier are trait
/// objects so tests and alternative backends can be injected.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Session id -> user record
    pub sessions: Arc<dyn data::SessionStore>,

    /// Identity token verifier
    pub verifier: Arc<dyn auth::IdentityVerifier>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Build the HTTP client used for provider key fetches
    /// 2. Create the identity verifier
    /// 3. Create the in-memory session store
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Initialize HTTP client
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("dues-portal/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(
                config.provider.jwks_timeout_secs,
            ))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        // 2. Identity verifier
        let verifier = auth::GoogleIdTokenVerifier::new(&config.provider, Arc::new(http_client));
        tracing::info!(
            audience = %config.provider.client_id,
            jwks_url = %config.provider.jwks_url,
            "Identity verifier initialized"
        );

        // 3. Session store
        let sessions = data::MemorySessionStore::new(&config.session);
        tracing::info!(
            idle_timeout_secs = config.session.idle_timeout_secs,
            max_age_secs = config.session.max_age_secs,
            "Session store initialized"
        );

        Ok(Self::with_components(
            config,
            Arc::new(sessions),
            Arc::new(verifier),
        ))
    }

    /// Assemble state from explicit components
    pub fn with_components(
        config: config::AppConfig,
        sessions: Arc<dyn data::SessionStore>,
        verifier: Arc<dyn auth::IdentityVerifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            verifier,
        }
    }
}

/// Largest request body accepted; login bodies carry a single ID token
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);
    let metrics_enabled = state.config.metrics.enabled;

    let router = Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .nest("/api", api::api_router())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state);

    if metrics_enabled {
        router.merge(api::metrics_router())
    } else {
        router
    }
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method, header};
    use tower_http::cors::{AllowOrigin, CorsLayer};

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(
                    %error,
                    origin = %origin,
                    "Ignoring unparseable CORS origin"
                );
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn health_check() -> &'static str {
    "OK"
}
