// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Caching
//!
//! - Signing keys are cached per `kid` in a bounded LRU with a max age
//! - A miss fetches the whole key set and caches every usable key in it
//! - Fetches are single-flight: concurrent misses wait on one fetch lock and
//!   re-check the cache before going to the network
//! - Outbound fetches are rate limited (sliding one-minute window)
//! - The fetch lock is shared by every `kid` and held for the whole request,
//!   so against a hung endpoint each queued miss waits up to the client
//!   timeout
//!
//! ## Usage
//!
//! The plugin owns one [`JwksClient`] per process and shares it across
//! requests. Only RSA keys are kept; tokens are verified as RS256.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Instant;

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::DecodingKey;
use lru::LruCache;
use tracing::{debug, error, info, warn};
use url::Url;

use super::error::KeyResolutionError;
use super::options::JwksClientOptions;
use super::rate_limit::RateLimiter;
use crate::error::ConfigError;

/// Public key published in the key set, usable for RS256 verification.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    key: DecodingKey,
}

impl SigningKey {
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("kid", &self.kid).finish()
    }
}

/// Cached key plus insertion time.
struct CachedKey {
    key: SigningKey,
    inserted_at: Instant,
}

/// Key resolver with caching, rate limiting and single-flight fetches.
pub struct JwksClient {
    /// JWKS endpoint
    jwks_uri: Url,
    options: JwksClientOptions,
    /// kid -> signing key
    cache: Mutex<LruCache<String, CachedKey>>,
    /// Held for the duration of an outbound fetch
    fetch_lock: tokio::sync::Mutex<()>,
    rate_limiter: Option<RateLimiter>,
    client: reqwest::Client,
}

impl JwksClient {
    /// Create a resolver for the given key set.
    ///
    /// # Errors
    ///
    /// Fails only when the HTTP client cannot be constructed.
    pub fn new(jwks_uri: Url, options: JwksClientOptions) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "jwks_client_options",
                reason: e.to_string(),
            })?;

        let capacity = NonZeroUsize::new(options.cache_max_entries).unwrap_or(NonZeroUsize::MIN);
        let rate_limiter = options
            .rate_limit
            .then(|| RateLimiter::per_minute(options.jwks_requests_per_minute));

        Ok(Self {
            jwks_uri,
            cache: Mutex::new(LruCache::new(capacity)),
            fetch_lock: tokio::sync::Mutex::new(()),
            rate_limiter,
            client,
            options,
        })
    }

    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    /// Resolve the signing key for `kid`.
    ///
    /// # Errors
    ///
    /// [`KeyResolutionError`] when the key set cannot be fetched or parsed,
    /// when the fetch is rate limited, or when no key has this `kid`.
    pub async fn resolve_key(&self, kid: &str) -> Result<SigningKey, KeyResolutionError> {
        if let Some(key) = self.cached(kid) {
            debug!(kid, "Signing key served from cache");
            return Ok(key);
        }

        let _fetching = self.fetch_lock.lock().await;

        // Another caller may have fetched while we waited.
        if let Some(key) = self.cached(kid) {
            debug!(kid, "Signing key populated by concurrent fetch");
            return Ok(key);
        }

        let keys = self.fetch_signing_keys().await?;
        keys.into_iter()
            .find(|key| key.kid == kid)
            .ok_or_else(|| {
                warn!(kid, jwks_uri = %self.jwks_uri, "No signing key with this kid");
                KeyResolutionError::KeyNotFound(kid.to_string())
            })
    }

    /// Any published signing key, for tokens that carry no `kid`.
    pub async fn any_signing_key(&self) -> Result<SigningKey, KeyResolutionError> {
        if let Some(key) = self.any_cached() {
            return Ok(key);
        }

        let _fetching = self.fetch_lock.lock().await;
        if let Some(key) = self.any_cached() {
            return Ok(key);
        }

        self.fetch_signing_keys()
            .await?
            .into_iter()
            .next()
            .ok_or(KeyResolutionError::NoSigningKeys)
    }

    /// Fetch the key set now and cache it.
    pub async fn get_signing_keys(&self) -> Result<Vec<SigningKey>, KeyResolutionError> {
        let _fetching = self.fetch_lock.lock().await;
        self.fetch_signing_keys().await
    }

    /// Check if `kid` is currently cached and fresh.
    pub fn is_cached(&self, kid: &str) -> bool {
        self.cache
            .lock()
            .map(|cache| {
                cache
                    .peek(kid)
                    .is_some_and(|entry| entry.inserted_at.elapsed() < self.options.cache_max_age)
            })
            .unwrap_or(false)
    }

    /// Number of cached keys, fresh or not.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Drop every cached key.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
        debug!(jwks_uri = %self.jwks_uri, "JWKS cache cleared");
    }

    fn cached(&self, kid: &str) -> Option<SigningKey> {
        if !self.options.cache {
            return None;
        }
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(kid) {
            if entry.inserted_at.elapsed() < self.options.cache_max_age {
                return Some(entry.key.clone());
            }
            cache.pop(kid);
        }
        None
    }

    fn any_cached(&self) -> Option<SigningKey> {
        if !self.options.cache {
            return None;
        }
        let cache = self.cache.lock().ok()?;
        cache
            .iter()
            .find(|(_, entry)| entry.inserted_at.elapsed() < self.options.cache_max_age)
            .map(|(_, entry)| entry.key.clone())
    }

    /// Fetch, convert and cache. Callers hold `fetch_lock`.
    async fn fetch_signing_keys(&self) -> Result<Vec<SigningKey>, KeyResolutionError> {
        if let Some(limiter) = &self.rate_limiter {
            if let Err(retry_after) = limiter.try_acquire() {
                warn!(
                    jwks_uri = %self.jwks_uri,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "JWKS fetch rate limited"
                );
                return Err(KeyResolutionError::RateLimited { retry_after });
            }
        }

        let jwks = self.fetch_jwks().await?;
        let keys: Vec<SigningKey> = jwks.keys.iter().filter_map(jwk_to_signing_key).collect();

        if keys.is_empty() {
            error!(jwks_uri = %self.jwks_uri, "JWKS contains no usable signing keys");
            return Err(KeyResolutionError::NoSigningKeys);
        }

        if self.options.cache {
            if let Ok(mut cache) = self.cache.lock() {
                let now = Instant::now();
                for key in &keys {
                    cache.put(
                        key.kid.clone(),
                        CachedKey {
                            key: key.clone(),
                            inserted_at: now,
                        },
                    );
                }
            }
        }

        Ok(keys)
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, KeyResolutionError> {
        info!(jwks_uri = %self.jwks_uri, "Fetching JWKS");

        let response = self
            .client
            .get(self.jwks_uri.clone())
            .send()
            .await
            .map_err(|e| {
                error!(jwks_uri = %self.jwks_uri, error = %e, "Failed to fetch JWKS");
                KeyResolutionError::Unreachable(e.to_string())
            })?;

        if !response.status().is_success() {
            error!(
                jwks_uri = %self.jwks_uri,
                status = %response.status(),
                "JWKS endpoint returned error status"
            );
            return Err(KeyResolutionError::Unreachable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            error!(jwks_uri = %self.jwks_uri, error = %e, "Failed to parse JWKS");
            KeyResolutionError::Malformed(e.to_string())
        })?;

        info!(
            jwks_uri = %self.jwks_uri,
            key_count = jwks.keys.len(),
            "Fetched JWKS"
        );
        Ok(jwks)
    }
}

/// Convert a JWK to a signing key, skipping anything unusable for RS256.
fn jwk_to_signing_key(jwk: &Jwk) -> Option<SigningKey> {
    let kid = jwk.common.key_id.clone()?;

    if matches!(jwk.common.public_key_use, Some(ref usage) if *usage != PublicKeyUse::Signature) {
        return None;
    }
    if matches!(jwk.common.key_algorithm, Some(alg) if alg != KeyAlgorithm::RS256) {
        return None;
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => match DecodingKey::from_rsa_components(&rsa.n, &rsa.e) {
            Ok(key) => Some(SigningKey { kid, key }),
            Err(e) => {
                warn!(kid, error = %e, "Skipping RSA key with invalid components");
                None
            }
        },
        _ => None,
    }
}
