//! Session cookie handling
//!
//! The cookie carries only the session id, signed with HMAC-SHA256.
//! The user record itself stays server-side in the session store.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::AppConfig;
use crate::data::SessionId;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Sign a session id for transport in a cookie
///
/// Cookie format: {session_id}.base64(hmac_sha256(session_id))
///
/// # Arguments
/// * `id` - Session id issued by the store
/// * `secret` - HMAC secret key
pub fn sign_session_id(id: &SessionId, secret: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid session secret: {e}")))?;
    mac.update(id.as_str().as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", id, signature_b64))
}

/// Verify a session cookie value and recover the session id
///
/// Returns `None` for anything that is not a value this service signed;
/// callers treat that the same as having no cookie at all.
pub fn verify_session_cookie(value: &str, secret: &str) -> Option<SessionId> {
    // Session ids are base64url, so the last '.' separates the signature
    let (id, signature_b64) = value.rsplit_once('.')?;
    if id.is_empty() {
        return None;
    }

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .ok()?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(id.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(SessionId(id.to_string()))
}

/// Build the cookie issued on login
pub fn session_cookie(config: &AppConfig, id: &SessionId) -> Result<Cookie<'static>, AppError> {
    let value = sign_session_id(id, &config.session.secret)?;
    let max_age = i64::try_from(config.session.max_age_secs).unwrap_or(i64::MAX);

    Ok(Cookie::build((config.session.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.should_use_secure_cookies())
        .max_age(time::Duration::seconds(max_age))
        .build())
}

/// Build a cookie that makes the browser drop the session cookie
///
/// Added unconditionally, so a `Set-Cookie` is emitted even when the
/// request carried no session cookie.
pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.session.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.should_use_secure_cookies())
        .build();
    cookie.make_removal();
    cookie
}
