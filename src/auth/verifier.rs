// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification against the tenant key set.
//!
//! 1. Decode the token structurally and read `kid` from its header
//! 2. Resolve the signing key through [`JwksClient`]
//! 3. Verify the RS256 signature, audience, issuer and expiry
//!
//! The algorithm is pinned to RS256. Whatever `alg` the token header names is
//! never used to choose the verification algorithm.

use std::collections::HashSet;
use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, Validation};
use serde_json::Value;
use tracing::debug;

use super::claims::VerifiedIdentity;
use super::error::AuthError;
use super::jwks::{JwksClient, SigningKey};
use super::options::Auth0Options;

/// Verifies raw tokens for one tenant.
pub struct TokenVerifier {
    jwks: Arc<JwksClient>,
    validation: Validation,
    allow_missing_kid: bool,
}

impl TokenVerifier {
    pub fn new(options: &Auth0Options, jwks: Arc<JwksClient>) -> Self {
        Self {
            jwks,
            validation: build_validation(options),
            allow_missing_kid: options.decode().allow_missing_kid,
        }
    }

    pub fn jwks(&self) -> &Arc<JwksClient> {
        &self.jwks
    }

    /// Verify `token` and return its claim set.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedToken`] / [`AuthError::MissingKeyId`] when the
    ///   token cannot be decoded
    /// - [`AuthError::KeyResolution`] when the signing key cannot be resolved
    /// - a verification variant when the signature or a claim check fails
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = jsonwebtoken::dangerous::insecure_decode::<Value>(token)
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?
            .header;

        let key = match header.kid.as_deref() {
            Some(kid) => self.jwks.resolve_key(kid).await?,
            None if self.allow_missing_kid => self.jwks.any_signing_key().await?,
            None => return Err(AuthError::MissingKeyId),
        };

        self.verify_with(token, &key)
    }

    /// Signature and claim checks against an already resolved key.
    pub fn verify_with(&self, token: &str, key: &SigningKey) -> Result<VerifiedIdentity, AuthError> {
        let data = decode::<VerifiedIdentity>(token, key.decoding_key(), &self.validation)?;
        debug!(kid = key.kid(), sub = %data.claims.sub, "Token verified");
        Ok(data.claims)
    }
}

fn build_validation(options: &Auth0Options) -> Validation {
    let verify = options.verify();
    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = verify.leeway_secs;
    validation.validate_exp = !verify.ignore_expiration;
    validation.validate_nbf = !verify.ignore_not_before;

    match &verify.audience {
        Some(audiences) => validation.set_audience(audiences),
        None => validation.set_audience(&[options.audience()]),
    }
    match &verify.issuer {
        Some(issuers) => validation.set_issuer(issuers),
        None => validation.set_issuer(&[options.issuer()]),
    }

    validation.sub = verify.subject.clone();
    validation.required_spec_claims = verify.required_claims.iter().cloned().collect::<HashSet<_>>();
    // Audience and issuer are only compared when present.
    validation.required_spec_claims.insert("aud".to_string());
    validation.required_spec_claims.insert("iss".to_string());
    if !verify.ignore_expiration {
        validation.required_spec_claims.insert("exp".to_string());
    }

    validation
}
