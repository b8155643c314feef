//! Bearer token verification against the issuer's published signing keys

mod error;
mod jwks;

pub use error::AuthError;
pub use jwks::{
    JwksCache, VerificationKey, DEFAULT_FAILURE_BACKOFF, DEFAULT_REFRESH_COOLDOWN, DEFAULT_TTL,
};

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;

/// Clock skew tolerated on `exp` and `nbf`, in seconds
const LEEWAY_SECS: u64 = 60;

/// Algorithms a token may be signed with
const ACCEPTED_ALGORITHMS: [Algorithm; 2] = [Algorithm::RS256, Algorithm::ES256];

/// Claims carried by a verified token
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject the token was issued to
    pub sub: String,
}

/// Verifies bearer tokens for a single issuer and audience
pub struct AuthGuard {
    issuer: String,
    audience: String,
    jwks: JwksCache,
}

impl AuthGuard {
    /// Creates a guard that trusts tokens from `issuer` minted for `audience`
    #[must_use]
    pub const fn new(issuer: String, audience: String, jwks: JwksCache) -> Self {
        Self {
            issuer,
            audience,
            jwks,
        }
    }

    /// Key cache backing this guard
    #[must_use]
    pub const fn jwks(&self) -> &JwksCache {
        &self.jwks
    }

    /// Verifies the raw `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the header is absent, is not a bearer token,
    /// or the token fails verification
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let header = authorization.ok_or(AuthError::MissingToken)?;
        let token = bearer_token(header).ok_or(AuthError::InvalidScheme)?;
        self.verify(token).await
    }

    /// Verifies a compact JWS token
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on a bad signature, an unexpected issuer or
    /// audience, an expired token, or a missing required claim
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;

        let key = self.jwks.key(kid).await?;
        if key.algorithm() != header.alg {
            return Err(AuthError::AlgorithmMismatch {
                token: header.alg,
                key: key.algorithm(),
            });
        }

        let mut validation = Validation::new(key.algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["sub", "exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = LEEWAY_SECS;

        let token_data = decode::<Claims>(token, key.decoding_key(), &validation)?;
        Ok(token_data.claims)
    }
}

/// Returns the token of a `Bearer <token>` header; the scheme is case-insensitive
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
