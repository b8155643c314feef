use jsonwebtoken::Algorithm;

/// Reasons a bearer token is rejected
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header on the request
    #[error("missing authorization header")]
    MissingToken,
    /// Header present but not `Bearer <token>`
    #[error("authorization header is not a bearer token")]
    InvalidScheme,
    /// Token header has no `kid`
    #[error("token header has no key id")]
    MissingKeyId,
    /// Token is signed with an algorithm we do not accept
    #[error("unsupported token algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),
    /// Token algorithm differs from the algorithm of the key it names
    #[error("token algorithm {token:?} does not match key algorithm {key:?}")]
    AlgorithmMismatch {
        /// Algorithm in the token header
        token: Algorithm,
        /// Algorithm of the published key
        key: Algorithm,
    },
    /// No published key has the token's `kid`
    #[error("unknown key id: {0}")]
    UnknownKeyId(String),
    /// Signature or claim validation failed
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// The issuer's key set could not be fetched or had no usable keys
    #[error("failed to fetch signing keys: {0}")]
    JwksFetch(String),
}

impl AuthError {
    /// True when the failure is on the key provider side rather than in the token
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(self, Self::JwksFetch(_))
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::JwksFetch(err.to_string())
    }
}
