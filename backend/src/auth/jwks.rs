use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::AuthError;

/// How long a fetched key set is trusted before it is fetched again
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Minimum gap between refreshes triggered by an unknown `kid`
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

/// Wait after the first failed fetch; doubles with every further failure
pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(5);

const MAX_FAILURE_BACKOFF: Duration = Duration::from_secs(5 * 60);

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A published signing key together with the algorithm it verifies
#[derive(Clone)]
pub struct VerificationKey {
    key: DecodingKey,
    algorithm: Algorithm,
}

impl VerificationKey {
    /// Key used to check signatures
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    /// Algorithm the key is published for
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

#[derive(Default)]
struct KeySet {
    keys: HashMap<String, VerificationKey>,
    fetched_at: Option<Instant>,
}

impl KeySet {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// Bookkeeping of the refresher; only touched by callers that need a fetch
#[derive(Default)]
struct RefreshState {
    last_on_demand_refresh: Option<Instant>,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

impl RefreshState {
    fn backoff_remaining(&self, base: Duration) -> Option<Duration> {
        let last_failure = self.last_failure?;
        let exponent = self.consecutive_failures.saturating_sub(1).min(10);
        let backoff = base
            .saturating_mul(2u32.pow(exponent))
            .min(MAX_FAILURE_BACKOFF);

        backoff
            .checked_sub(last_failure.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }
}

#[derive(Deserialize)]
struct JwksDocument {
    keys: Vec<Value>,
}

/// TTL cache over the issuer's published JSON Web Key Set
///
/// Lookups read the current key set without locking. Fetches are serialized
/// behind a separate lock, so a refresh in flight never delays a lookup that
/// the cached keys can already answer.
pub struct JwksCache {
    jwks_url: String,
    client: reqwest::Client,
    ttl: Duration,
    refresh_cooldown: Duration,
    failure_backoff: Duration,
    keys: ArcSwap<KeySet>,
    refresh: Mutex<RefreshState>,
}

impl JwksCache {
    /// Creates an empty cache for the key set at `jwks_url`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::JwksFetch`] if the HTTP client cannot be built
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            client,
            ttl: DEFAULT_TTL,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
            keys: ArcSwap::from_pointee(KeySet::default()),
            refresh: Mutex::new(RefreshState::default()),
        })
    }

    /// Overrides how long fetched keys are trusted
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Overrides the cooldown between on-demand refreshes
    #[must_use]
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Overrides the wait after a failed fetch
    #[must_use]
    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    /// Looks up the key with id `kid`
    ///
    /// A stale cache is refetched first. An unknown `kid` on a fresh cache triggers
    /// one refetch per cooldown window, so rotated keys are picked up without
    /// letting bogus tokens hammer the issuer. After a failed fetch no new fetch
    /// starts until the backoff has passed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownKeyId`] if no usable key has this id, or
    /// [`AuthError::JwksFetch`] if the key set could not be fetched
    pub async fn key(&self, kid: &str) -> Result<VerificationKey, AuthError> {
        let cached = self.keys.load_full();
        if cached.is_fresh(self.ttl) {
            if let Some(key) = cached.keys.get(kid) {
                return Ok(key.clone());
            }
        }

        let mut refresh = match self.refresh.try_lock() {
            Ok(refresh) => refresh,
            Err(_) => {
                // Someone else is fetching; known keys keep serving until the swap
                if let Some(key) = cached.keys.get(kid) {
                    return Ok(key.clone());
                }
                self.refresh.lock().await
            }
        };

        // The key set may have been swapped while we waited for the lock
        let cached = self.keys.load_full();
        if cached.is_fresh(self.ttl) {
            if let Some(key) = cached.keys.get(kid) {
                return Ok(key.clone());
            }

            let cooling_down = refresh
                .last_on_demand_refresh
                .is_some_and(|at| at.elapsed() < self.refresh_cooldown);
            if cooling_down {
                tracing::debug!(kid, "On-demand JWKS refresh throttled (cooldown active)");
                return Err(AuthError::UnknownKeyId(kid.to_string()));
            }
            tracing::info!(kid, "Performing on-demand JWKS refresh for unknown kid");
            refresh.last_on_demand_refresh = Some(Instant::now());
        }

        if let Some(remaining) = refresh.backoff_remaining(self.failure_backoff) {
            return Err(AuthError::JwksFetch(format!(
                "backing off for {}ms after {} failed fetches",
                remaining.as_millis(),
                refresh.consecutive_failures
            )));
        }

        self.reload(&mut refresh).await?;

        self.keys
            .load()
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKeyId(kid.to_string()))
    }

    /// Fetches the key set now, regardless of freshness or backoff
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::JwksFetch`] if the key set could not be fetched
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let mut refresh = self.refresh.lock().await;
        self.reload(&mut refresh).await
    }

    /// Drops every cached key; the next lookup fetches the key set again
    pub async fn invalidate(&self) {
        let mut refresh = self.refresh.lock().await;
        *refresh = RefreshState::default();
        self.keys.store(Arc::new(KeySet::default()));
    }

    async fn reload(&self, refresh: &mut RefreshState) -> Result<(), AuthError> {
        match self.fetch().await {
            Ok(keys) => {
                self.keys.store(Arc::new(KeySet {
                    keys,
                    fetched_at: Some(Instant::now()),
                }));
                refresh.consecutive_failures = 0;
                refresh.last_failure = None;
                Ok(())
            }
            Err(err) => {
                refresh.consecutive_failures = refresh.consecutive_failures.saturating_add(1);
                refresh.last_failure = Some(Instant::now());
                tracing::error!(
                    failures = refresh.consecutive_failures,
                    "Failed to refresh JWKS from {}: {err}",
                    self.jwks_url
                );
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> Result<HashMap<String, VerificationKey>, AuthError> {
        let document: JwksDocument = self
            .client
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let keys: HashMap<_, _> = document.keys.into_iter().filter_map(usable_key).collect();
        if keys.is_empty() {
            return Err(AuthError::JwksFetch(
                "no usable signing keys in key set".to_string(),
            ));
        }

        tracing::debug!(count = keys.len(), "Loaded signing keys");
        Ok(keys)
    }
}

/// Keeps RSA and P-256 signing keys that carry a `kid`; everything else is skipped
fn usable_key(raw: Value) -> Option<(String, VerificationKey)> {
    let jwk: Jwk = serde_json::from_value(raw).ok()?;

    if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
        return None;
    }
    let kid = jwk.common.key_id.clone()?;

    let algorithm = match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => Algorithm::RS256,
        AlgorithmParameters::EllipticCurve(params) if matches!(params.curve, EllipticCurve::P256) => {
            Algorithm::ES256
        }
        _ => return None,
    };

    let declared_matches = match jwk.common.key_algorithm {
        None => true,
        Some(KeyAlgorithm::RS256) => algorithm == Algorithm::RS256,
        Some(KeyAlgorithm::ES256) => algorithm == Algorithm::ES256,
        Some(_) => false,
    };
    if !declared_matches {
        return None;
    }

    let key = DecodingKey::from_jwk(&jwk).ok()?;
    Some((kid, VerificationKey { key, algorithm }))
}
