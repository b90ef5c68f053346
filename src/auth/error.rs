// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::OperationError;

/// Failure to resolve a signing key from the remote key set.
#[derive(Debug, Clone, Error)]
pub enum KeyResolutionError {
    /// Transport failure or non-success status from the JWKS endpoint
    #[error("JWKS endpoint unreachable: {0}")]
    Unreachable(String),
    /// The endpoint answered with something that is not a key set
    #[error("JWKS document is malformed: {0}")]
    Malformed(String),
    /// The key set contains no RSA signing keys
    #[error("JWKS document contains no usable signing keys")]
    NoSigningKeys,
    /// No key with the requested identifier
    #[error("no signing key found for kid \"{0}\"")]
    KeyNotFound(String),
    /// Too many JWKS fetches in the current window
    #[error("JWKS fetch rate limit exceeded, retry in {}s", .retry_after.as_secs().max(1))]
    RateLimited { retry_after: Duration },
}

/// Coarse classification of [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Header present but syntactically invalid
    HeaderFormat,
    /// Token is not a structurally valid signed token
    TokenDecode,
    /// Signing key could not be resolved
    KeyResolution,
    /// Signature or standard-claim check failed
    TokenVerification,
    /// No credential and anonymous access is forbidden
    Unauthenticated,
    /// A custom extraction function failed
    Extraction,
}

/// Authentication error type.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Header value does not split into scheme and token
    #[error("Invalid value provided for header \"{header}\"")]
    InvalidHeader { header: String },
    /// Scheme does not match the configured token type
    #[error("Unsupported token type provided: {token_type}")]
    UnsupportedTokenType { token_type: String },
    /// Token could not be decoded into header and payload
    #[error("Failed to decode authentication token: {0}")]
    MalformedToken(String),
    /// Token header carries no key identifier
    #[error("Failed to decode authentication token: header has no key identifier")]
    MissingKeyId,
    /// Signing key lookup failed
    #[error(transparent)]
    KeyResolution(#[from] KeyResolutionError),
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,
    /// Token is not yet valid
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// Token issuer is invalid
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// Token audience is invalid
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// Claim set is missing required claims or has wrong types
    #[error("Token claims are invalid: {0}")]
    InvalidClaims(String),
    /// No credential on a request that requires one
    #[error("Unauthenticated!")]
    Unauthenticated,
    /// Raised by a custom token extraction function
    #[error("Token extraction failed: {0}")]
    Extraction(String),
}

impl AuthError {
    /// Classify this error.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::InvalidHeader { .. } | AuthError::UnsupportedTokenType { .. } => {
                AuthErrorKind::HeaderFormat
            }
            AuthError::MalformedToken(_) | AuthError::MissingKeyId => AuthErrorKind::TokenDecode,
            AuthError::KeyResolution(_) => AuthErrorKind::KeyResolution,
            AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience
            | AuthError::InvalidClaims(_) => AuthErrorKind::TokenVerification,
            AuthError::Unauthenticated => AuthErrorKind::Unauthenticated,
            AuthError::Extraction(_) => AuthErrorKind::Extraction,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidHeader { .. } => "invalid_auth_header",
            AuthError::UnsupportedTokenType { .. } => "unsupported_token_type",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::MissingKeyId => "missing_key_id",
            AuthError::KeyResolution(KeyResolutionError::KeyNotFound(_)) => "no_matching_key",
            AuthError::KeyResolution(KeyResolutionError::RateLimited { .. }) => {
                "jwks_rate_limited"
            }
            AuthError::KeyResolution(_) => "jwks_fetch_error",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Extraction(_) => "token_extraction_failed",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// A kid missing from the key set is the caller's problem; every other
    /// key resolution failure is ours.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::KeyResolution(KeyResolutionError::KeyNotFound(_)) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::KeyResolution(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                AuthError::InvalidSignature
            }
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
                "aud" => AuthError::InvalidAudience,
                "iss" => AuthError::InvalidIssuer,
                other => AuthError::InvalidClaims(format!("missing required claim \"{other}\"")),
            },
            ErrorKind::InvalidSubject => AuthError::InvalidClaims("subject mismatch".to_string()),
            ErrorKind::Json(err) => AuthError::InvalidClaims(err.to_string()),
            _ => AuthError::MalformedToken(e.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        OperationError::from(self).into_response()
    }
}
