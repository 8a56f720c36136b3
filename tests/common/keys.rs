//! RSA keys standing in for the identity provider's signing keys

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use lazy_static::lazy_static;
use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;

lazy_static! {
    /// Key published by the fake provider
    pub static ref PROVIDER_KEY: TestKey = TestKey::generate("provider-key-1");
    /// Key nobody publishes
    pub static ref ROGUE_KEY: TestKey = TestKey::generate("rogue-key");
}

pub struct TestKey {
    pub kid: String,
    private_key: RsaPrivateKey,
    encoding_key: EncodingKey,
}

impl TestKey {
    pub fn generate(kid: &str) -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("RSA key generation");
        let pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("PEM encoding");
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("encoding key");

        Self {
            kid: kid.to_string(),
            private_key,
            encoding_key,
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
            "azp": audience,
            "aud": audience,
            "sub": subject,
            "email": format!("{subject}@example.com"),
            "email_verified": true,
            "name": format!("Member {subject}"),
            "iat": now,
            "exp": now + 3600,
        })
    }

    /// Sign claims, advertising `kid` in the header
    pub fn sign_as(&self, kid: &str, claims: &serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key).expect("token signing")
    }

    pub fn sign(&self, claims: &serde_json::Value) -> String {
        self.sign_as(&self.kid, claims)
    }
}
