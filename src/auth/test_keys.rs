//! RSA signing keys for verifier tests

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use lazy_static::lazy_static;
use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;

lazy_static! {
    /// Key the verifier under test trusts
    pub static ref TEST_KEY: TestKey = TestKey::generate("test-key-1");
    /// Key the verifier has never seen
    pub static ref OTHER_KEY: TestKey = TestKey::generate("test-key-2");
}

#[derive(Clone)]
pub struct TestKey {
    pub kid: String,
    private_key: RsaPrivateKey,
}

impl TestKey {
    pub fn generate(kid: &str) -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("RSA key generation");
        Self {
            kid: kid.to_string(),
            private_key,
        }
    }

    /// Same key material published under another kid
    pub fn with_kid(&self, kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            private_key: self.private_key.clone(),
        }
    }

    /// JWKS document publishing this key
    pub fn jwks(&self) -> serde_json::Value {
        serde_json::json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": self.kid,
                "n": URL_SAFE_NO_PAD.encode(self.private_key.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(self.private_key.e().to_bytes_be()),
            }]
        })
    }

    /// Google-shaped ID token claims valid for the next hour
    pub fn claims(&self, audience: &str, subject: &str) -> serde_json::Value {
        let now = Utc::now().timestamp();
        serde_json::json!({
            "iss": "https://accounts.google.com",
            "aud": audience,
            "sub": subject,
            "email": format!("{subject}@example.com"),
            "email_verified": true,
            "name": format!("User {subject}"),
            "iat": now,
            "exp": now + 3600,
        })
    }

    pub fn sign(&self, claims: &serde_json::Value) -> String {
        let pem = self
            .private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("PEM encoding");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("encoding key");

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        jsonwebtoken::encode(&header, claims, &key).expect("token signing")
    }
}
