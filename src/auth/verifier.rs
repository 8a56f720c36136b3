//! Identity token verification
//!
//! Validates Google Sign-In ID tokens against the provider's published
//! keys and extracts the claims a session needs.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::key_cache::JwksCache;
use crate::config::ProviderConfig;
use crate::data::UserRecord;
use crate::error::AppError;

/// The only failure a verifier reports
///
/// The message is for logs; callers never branch on it. Network trouble
/// while fetching keys and a forged token look the same from outside.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Unauthorized(pub String);

impl From<Unauthorized> for AppError {
    fn from(_: Unauthorized) -> Self {
        AppError::Unauthorized
    }
}

/// Claims extracted from a verified identity token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<VerifiedClaims> for UserRecord {
    fn from(claims: VerifiedClaims) -> Self {
        UserRecord {
            id: claims.subject,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Checks an opaque identity token presented by a client
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, Unauthorized>;
}

/// Longest lifetime accepted for an ID token, counted from issue time
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// ID token payload fields read after signature validation
///
/// `aud` and `iss` are checked by `jsonwebtoken` itself, as is `exp`
/// against the clock. A token without `iat` fails to deserialize.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    iat: i64,
    exp: i64,
}

// =============================================================================
// Google ID tokens
// =============================================================================

/// Verifier for Google-issued RS256 ID tokens
pub struct GoogleIdTokenVerifier {
    keys: JwksCache,
    validation: Validation,
    leeway_secs: u64,
}

impl GoogleIdTokenVerifier {
    /// Create a verifier expecting tokens minted for `config.client_id`
    ///
    /// # Arguments
    /// * `config` - Provider settings (audience, issuers, key endpoint, leeway)
    /// * `http_client` - Client used for key fetches; its timeout bounds each fetch
    pub fn new(config: &ProviderConfig, http_client: Arc<reqwest::Client>) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[config.client_id.as_str()]);
        validation.set_issuer(config.issuers.as_slice());
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = config.leeway_secs;

        Self {
            keys: JwksCache::new(
                config.jwks_url.clone(),
                http_client,
                Duration::from_secs(config.jwks_default_ttl_secs),
            ),
            validation,
            leeway_secs: config.leeway_secs,
        }
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &JwksCache {
        &self.keys
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, Unauthorized> {
        let header =
            decode_header(token).map_err(|e| Unauthorized(format!("malformed token: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(Unauthorized(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| Unauthorized("token header has no kid".to_string()))?;
        let key = self.keys.get(&kid).await?;

        let data = decode::<IdTokenClaims>(token, &key, &self.validation)
            .map_err(|e| Unauthorized(format!("token rejected: {e}")))?;
        let claims = data.claims;

        let now = Utc::now().timestamp();
        let leeway = self.leeway_secs as i64;
        if claims.iat > now.saturating_add(leeway) {
            return Err(Unauthorized("token issued in the future".to_string()));
        }
        if claims.exp.saturating_sub(claims.iat) > MAX_TOKEN_LIFETIME_SECS.saturating_add(leeway) {
            return Err(Unauthorized("token lifetime exceeds one day".to_string()));
        }

        if claims.sub.is_empty() {
            return Err(Unauthorized("token has an empty subject".to_string()));
        }

        Ok(VerifiedClaims {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }
}
