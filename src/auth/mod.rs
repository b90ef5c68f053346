// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Auth0 access-token authentication for a GraphQL execution pipeline.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with Auth0 and sends `Authorization: Bearer <JWT>`
//! 2. For every operation, [`Auth0Plugin::on_context_building`]:
//!    - extracts the token from the request headers (or a custom extractor)
//!    - resolves the signing key by `kid` from the tenant JWKS
//!    - verifies the RS256 signature, `aud`, `iss` and `exp`
//!    - stores the claims under the configured context field
//! 3. Resolvers read the caller with [`Auth0Plugin::identity`], or through the
//!    axum [`Identity`] / [`OptionalIdentity`] extractors
//!
//! ## Security
//!
//! - Only RS256 is accepted; the token's own `alg` header never selects it
//! - JWKS is fetched over HTTPS from `https://<domain>/.well-known/jwks.json`
//! - Keys are cached per `kid` with a TTL; fetches are rate limited and
//!   concurrent misses share a single request
//! - A missing token with anonymous access forbidden always fails, even when
//!   an `on_error` callback is configured

pub mod claims;
pub mod context;
pub mod error;
pub mod extractor;
pub mod headers;
pub mod jwks;
pub mod middleware;
pub mod options;
pub mod plugin;
pub mod rate_limit;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::VerifiedIdentity;
pub use context::ExecutionContext;
pub use error::{AuthError, AuthErrorKind, KeyResolutionError};
pub use headers::HeaderSource;
pub use jwks::{JwksClient, SigningKey};
pub use middleware::{auth_middleware, Identity, OptionalIdentity};
pub use options::{Auth0Options, Auth0OptionsBuilder, DecodeOptions, JwksClientOptions, VerifyOptions};
pub use plugin::{Auth0Plugin, HookOutcome};
pub use rate_limit::RateLimiter;
pub use verifier::TokenVerifier;
