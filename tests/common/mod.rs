//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod keys;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Json, Router, extract::State, http::header, routing::get};
use dues_portal::{AppState, config};
use keys::PROVIDER_KEY;
use tokio::net::TcpListener;

pub const TEST_CLIENT_ID: &str = "test-client-id.apps.googleusercontent.com";
pub const TEST_SESSION_SECRET: &str = "test-session-secret-key-32-bytes-long";
pub const FRONTEND_ORIGIN: &str = "http://localhost:3001";

/// Stand-in for Google's key endpoint
pub struct FakeProvider {
    pub jwks_url: String,
    fetches: Arc<AtomicUsize>,
}

impl FakeProvider {
    /// Serve `PROVIDER_KEY` as a JWKS on an ephemeral port
    pub async fn start() -> Self {
        let fetches = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route("/oauth2/v3/certs", get(serve_jwks))
            .with_state(fetches.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            jwks_url: format!("http://{}/oauth2/v3/certs", addr),
            fetches,
        }
    }

    /// Number of times the key set has been downloaded
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

async fn serve_jwks(
    State(fetches): State<Arc<AtomicUsize>>,
) -> ([(header::HeaderName, &'static str); 1], Json<serde_json::Value>) {
    fetches.fetch_add(1, Ordering::SeqCst);
    (
        [(header::CACHE_CONTROL, "public, max-age=3600")],
        Json(PROVIDER_KEY.jwks()),
    )
}

/// Test configuration pointing at `jwks_url`
pub fn test_config(jwks_url: &str) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "localhost".to_string(),
            protocol: "http".to_string(),
            cors_origins: vec![FRONTEND_ORIGIN.to_string()],
        },
        provider: config::ProviderConfig {
            client_id: TEST_CLIENT_ID.to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: Some("http://localhost:3001/auth/google/callback".to_string()),
            jwks_url: jwks_url.to_string(),
            issuers: vec![
                "accounts.google.com".to_string(),
                "https://accounts.google.com".to_string(),
            ],
            jwks_timeout_secs: 5,
            jwks_default_ttl_secs: 3600,
            leeway_secs: 60,
        },
        session: config::SessionConfig {
            secret: TEST_SESSION_SECRET.to_string(),
            cookie_name: "sid".to_string(),
            idle_timeout_secs: 3600,
            max_age_secs: 86_400,
            max_sessions: 10_000,
        },
        metrics: config::MetricsConfig { enabled: true },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub provider: FakeProvider,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server backed by a fake provider
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        dues_portal::metrics::init_metrics();

        let provider = FakeProvider::start().await;
        let mut config = test_config(&provider.jwks_url);
        adjust(&mut config);

        // Initialize app state
        let state = AppState::new(config).unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = dues_portal::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            provider,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// ID token the server will accept for `subject`
    pub fn id_token(&self, subject: &str) -> String {
        PROVIDER_KEY.sign(&PROVIDER_KEY.claims(TEST_CLIENT_ID, subject))
    }

    /// POST the login callback with `token`
    pub async fn login(&self, token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/google/callback"))
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .expect("request succeeds")
    }

    /// Log in as `subject` and return the `Cookie` header value to replay
    pub async fn login_as(&self, subject: &str) -> String {
        let response = self.login(&self.id_token(subject)).await;
        assert_eq!(response.status(), 200, "login for {subject} should succeed");
        session_cookie(&response).expect("login sets the session cookie")
    }

    /// GET /api/user, optionally presenting a cookie
    pub async fn current_user(&self, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url("/api/user"));
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }
        request.send().await.expect("request succeeds")
    }

    /// POST /auth/logout, optionally presenting a cookie
    pub async fn logout(&self, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(self.url("/auth/logout"));
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }
        request.send().await.expect("request succeeds")
    }
}

/// All `Set-Cookie` header values on a response
pub fn set_cookie_headers(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// `sid=<value>` pair from the response's session cookie, if one was set
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    set_cookie_headers(response)
        .into_iter()
        .filter(|value| value.starts_with("sid="))
        .filter_map(|value| value.split(';').next().map(str::to_string))
        .find(|pair| pair != "sid=")
}
