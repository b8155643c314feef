use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use p256::{
    elliptic_curve::sec1::ToEncodedPoint,
    pkcs8::{EncodePrivateKey, LineEnding},
    SecretKey,
};
use serde_json::{json, Value};

pub const TEST_AUDIENCE: &str = "coffee-shop";
pub const TEST_KEY_ID: &str = "test-signing-key";

/// ES256 signing key published through the mock issuer's JWKS endpoint
pub struct TestSigningKey {
    pub kid: String,
    secret: SecretKey,
}

impl TestSigningKey {
    pub fn generate(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            secret: SecretKey::random(&mut rand::thread_rng()),
        }
    }

    /// Public half of the key as a JWK
    pub fn jwk(&self) -> Value {
        let point = self.secret.public_key().to_encoded_point(false);
        json!({
            "kty": "EC",
            "crv": "P-256",
            "use": "sig",
            "alg": "ES256",
            "kid": self.kid,
            "x": URL_SAFE_NO_PAD.encode(point.x().unwrap()),
            "y": URL_SAFE_NO_PAD.encode(point.y().unwrap()),
        })
    }

    /// Signs `claims` as a compact ES256 JWS with this key's `kid`
    pub fn sign(&self, claims: &Value) -> String {
        let pem = self.secret.to_pkcs8_pem(LineEnding::LF).unwrap();
        let encoding_key = EncodingKey::from_ec_pem(pem.as_bytes()).unwrap();

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.kid.clone());

        jsonwebtoken::encode(&header, claims, &encoding_key).unwrap()
    }
}

/// Claims of a token that passes verification for `issuer`
pub fn valid_claims(issuer: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": "barista-42",
        "iss": issuer,
        "aud": TEST_AUDIENCE,
        "iat": now,
        "exp": now + 3600,
    })
}
