//! Provider Key Caching
//!
//! Caches the identity provider's published signing keys (JWKS) to
//! avoid a remote request per login.

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use reqwest::header::{CACHE_CONTROL, HeaderMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::verifier::Unauthorized;

/// Cached key set entry
#[derive(Debug, Clone)]
struct CachedKeySet {
    keys: Arc<JwkSet>,
    /// When this entry was cached
    cached_at: Instant,
    /// From the response's max-age, or the configured default
    ttl: Duration,
}

impl CachedKeySet {
    /// Check if this cache entry is still valid
    fn is_valid(&self) -> bool {
        self.cached_at.elapsed() < self.ttl
    }
}

/// Key set cache
///
/// Thread-safe cache for the provider's signing keys. A single fetch is
/// in flight at a time; concurrent callers wait for it.
pub struct JwksCache {
    /// Where the provider publishes its keys
    url: String,
    cache: RwLock<Option<CachedKeySet>>,
    /// HTTP client for fetching keys; carries the fetch timeout
    http_client: Arc<reqwest::Client>,
    /// TTL used when the provider sends no max-age
    default_ttl: Duration,
}

impl JwksCache {
    /// Create new key set cache
    ///
    /// # Arguments
    /// * `url` - JWKS endpoint
    /// * `http_client` - HTTP client for fetching keys
    /// * `default_ttl` - TTL when the response has no usable Cache-Control
    pub fn new(url: String, http_client: Arc<reqwest::Client>, default_ttl: Duration) -> Self {
        Self {
            url,
            cache: RwLock::new(None),
            http_client,
            default_ttl,
        }
    }

    /// Get the decoding key for a key ID
    ///
    /// Uses the cached set while it is fresh, fetches otherwise.
    pub async fn get(&self, kid: &str) -> Result<DecodingKey, Unauthorized> {
        let keys = self.current().await?;
        let jwk = keys
            .find(kid)
            .ok_or_else(|| Unauthorized(format!("no provider key with kid {kid}")))?;

        DecodingKey::from_jwk(jwk)
            .map_err(|e| Unauthorized(format!("unusable provider key {kid}: {e}")))
    }

    async fn current(&self) -> Result<Arc<JwkSet>, Unauthorized> {
        // 1. Check cache (read lock)
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|cached| cached.is_valid()) {
                tracing::debug!("Provider key set cache hit");
                return Ok(cached.keys.clone());
            }
        }

        // 2. Miss or expired - fetch under the write lock
        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref().filter(|cached| cached.is_valid()) {
            return Ok(cached.keys.clone());
        }

        tracing::debug!(url = %self.url, "Provider key set cache miss, fetching...");
        let (keys, ttl) = self.fetch().await?;
        let keys = Arc::new(keys);

        // 3. Update cache
        *cache = Some(CachedKeySet {
            keys: keys.clone(),
            cached_at: Instant::now(),
            ttl,
        });

        Ok(keys)
    }

    async fn fetch(&self) -> Result<(JwkSet, Duration), Unauthorized> {
        use crate::metrics::JWKS_FETCHES_TOTAL;

        let result = async {
            let response = self
                .http_client
                .get(&self.url)
                .send()
                .await?
                .error_for_status()?;
            let ttl = cache_max_age(response.headers()).unwrap_or(self.default_ttl);
            let keys = response.json::<JwkSet>().await?;
            Ok::<_, reqwest::Error>((keys, ttl))
        }
        .await;

        match result {
            Ok((keys, ttl)) => {
                JWKS_FETCHES_TOTAL.with_label_values(&["success"]).inc();
                tracing::info!(
                    keys = keys.keys.len(),
                    ttl_secs = ttl.as_secs(),
                    "Fetched provider key set"
                );
                Ok((keys, ttl))
            }
            Err(error) => {
                JWKS_FETCHES_TOTAL.with_label_values(&["failure"]).inc();
                Err(Unauthorized(format!("could not fetch provider keys: {error}")))
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn prime(&self, keys: JwkSet, ttl: Duration) {
        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeySet {
            keys: Arc::new(keys),
            cached_at: Instant::now(),
            ttl,
        });
    }
}

/// Read `max-age` out of a Cache-Control header
///
/// `no-cache`/`no-store` and `max-age=0` yield `None`, falling back to
/// the default TTL.
fn cache_max_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    value
        .split(',')
        .map(str::trim)
        .filter_map(|directive| directive.strip_prefix("max-age="))
        .filter_map(|seconds| seconds.trim_matches('"').parse::<u64>().ok())
        .find(|seconds| *seconds > 0)
        .map(Duration::from_secs)
}
