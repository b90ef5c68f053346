// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The context-building hook.
//!
//! Runs once per operation, before any resolver:
//!
//! ```text
//! Unauthenticated ──token──▶ Extracted ──verify ok──▶ Verified ──▶ Augmented
//!        │                        │
//!        │ no token               └── any error ──▶ Failed ──▶ on_error? reported : propagated
//!        ├── anonymous allowed ──▶ done, context untouched
//!        └── anonymous forbidden ─▶ Rejected (always propagated)
//! ```
//!
//! The context is written exactly once, on `Augmented`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::claims::VerifiedIdentity;
use super::context::ExecutionContext;
use super::error::AuthError;
use super::extractor::extract_token;
use super::jwks::JwksClient;
use super::options::Auth0Options;
use super::verifier::TokenVerifier;
use crate::error::ConfigError;

/// How a hook invocation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Identity verified and stored in the context
    Authenticated,
    /// No token and anonymous access is allowed
    Anonymous,
    /// A failure went to `on_error`; the context was left untouched
    ErrorReported,
}

/// Auth0 authentication plugin.
///
/// Construct once per process and share by `Arc`. The only state shared
/// between operations is the key resolver's cache and rate limiter.
pub struct Auth0Plugin {
    options: Auth0Options,
    verifier: TokenVerifier,
}

impl Auth0Plugin {
    /// # Errors
    ///
    /// Fails when the JWKS HTTP client cannot be built.
    pub fn new(options: Auth0Options) -> Result<Self, ConfigError> {
        let jwks = JwksClient::new(options.jwks_uri().clone(), options.jwks().clone())?;
        let verifier = TokenVerifier::new(&options, Arc::new(jwks));
        Ok(Self { options, verifier })
    }

    pub fn options(&self) -> &Auth0Options {
        &self.options
    }

    pub fn jwks(&self) -> &JwksClient {
        self.verifier.jwks()
    }

    /// Run the hook for one operation.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] when no token is present and anonymous
    ///   access is forbidden, regardless of `on_error`
    /// - any extraction or verification error when no `on_error` callback is
    ///   configured
    pub async fn on_context_building(
        &self,
        context: &mut ExecutionContext,
    ) -> Result<HookOutcome, AuthError> {
        match self.authenticate(context).await {
            Ok(Some(identity)) => {
                debug!(sub = %identity.sub, field = self.options.extend_context_field(), "Context augmented");
                context.insert(self.options.extend_context_field(), identity);
                Ok(HookOutcome::Authenticated)
            }
            Ok(None) if self.options.prevent_unauthenticated_access() => {
                debug!("Rejecting unauthenticated operation");
                Err(AuthError::Unauthenticated)
            }
            Ok(None) => {
                debug!("Anonymous operation passed through");
                Ok(HookOutcome::Anonymous)
            }
            Err(e) => match self.options.on_error() {
                Some(on_error) => {
                    warn!(error = %e, code = e.error_code(), "Authentication failed, reported to on_error");
                    on_error(&e);
                    Ok(HookOutcome::ErrorReported)
                }
                None => {
                    debug!(error = %e, code = e.error_code(), "Authentication failed");
                    Err(e)
                }
            },
        }
    }

    /// Extract and verify without touching the context or applying the error
    /// policy. `Ok(None)` means the operation carried no token.
    pub async fn authenticate(
        &self,
        context: &ExecutionContext,
    ) -> Result<Option<VerifiedIdentity>, AuthError> {
        let Some(token) = extract_token(&self.options, context)? else {
            return Ok(None);
        };
        self.verifier.verify(&token).await.map(Some)
    }

    /// Verified identity stored by this plugin, if any.
    pub fn identity<'a>(&self, context: &'a ExecutionContext) -> Option<&'a VerifiedIdentity> {
        context.get::<VerifiedIdentity>(self.options.extend_context_field())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::auth::error::AuthErrorKind;
    use crate::auth::test_support::{
        claims_for, jwks_server, options_builder, sign, valid_token, TestKey, KID_A,
    };

    fn context_with_auth(value: &str) -> ExecutionContext {
        ExecutionContext::with_headers(HashMap::from([(
            "authorization".to_string(),
            value.to_string(),
        )]))
    }

    #[tokio::test]
    async fn valid_token_augments_context() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(
            options_builder(&server)
                .prevent_unauthenticated_access(true)
                .build()
                .unwrap(),
        )
        .unwrap();

        let mut ctx = context_with_auth(&format!("Bearer {}", valid_token("auth0|alice")));
        let outcome = plugin.on_context_building(&mut ctx).await.unwrap();

        assert_eq!(outcome, HookOutcome::Authenticated);
        assert!(ctx.contains("_auth0"));
        let identity = plugin.identity(&ctx).unwrap();
        assert_eq!(identity.sub, "auth0|alice");
        assert_eq!(identity.claim("iss"), Some(&json!("https://example.auth0.com/")));
    }

    #[tokio::test]
    async fn custom_context_field() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(
            options_builder(&server)
                .extend_context_field("viewer")
                .build()
                .unwrap(),
        )
        .unwrap();

        let mut ctx = context_with_auth(&format!("Bearer {}", valid_token("auth0|alice")));
        plugin.on_context_building(&mut ctx).await.unwrap();

        assert!(ctx.contains("viewer"));
        assert!(!ctx.contains("_auth0"));
        assert_eq!(plugin.identity(&ctx).unwrap().subject(), "auth0|alice");
    }

    #[tokio::test]
    async fn anonymous_pass_through() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(options_builder(&server).build().unwrap()).unwrap();

        let mut ctx = ExecutionContext::with_headers(HashMap::<String, String>::new());
        let outcome = plugin.on_context_building(&mut ctx).await.unwrap();

        assert_eq!(outcome, HookOutcome::Anonymous);
        assert!(ctx.is_empty());
        assert!(plugin.identity(&ctx).is_none());
    }

    #[tokio::test]
    async fn missing_headers_is_anonymous() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(options_builder(&server).build().unwrap()).unwrap();

        let mut ctx = ExecutionContext::new();
        assert_eq!(
            plugin.on_context_building(&mut ctx).await.unwrap(),
            HookOutcome::Anonymous
        );
    }

    #[tokio::test]
    async fn unauthenticated_rejected_when_required() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(
            options_builder(&server)
                .prevent_unauthenticated_access(true)
                .build()
                .unwrap(),
        )
        .unwrap();

        let mut ctx = ExecutionContext::with_headers(HashMap::<String, String>::new());
        let err = plugin.on_context_building(&mut ctx).await.unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::Unauthenticated);
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn rejection_ignores_on_error() {
        let server = jwks_server().await;
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        let plugin = Auth0Plugin::new(
            options_builder(&server)
                .prevent_unauthenticated_access(true)
                .on_error(move |e| sink.lock().unwrap().push(e.error_code()))
                .build()
                .unwrap(),
        )
        .unwrap();

        let mut ctx = ExecutionContext::new();
        let err = plugin.on_context_building(&mut ctx).await.unwrap_err();

        assert!(matches!(err, AuthError::Unauthenticated));
        assert!(reported.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_scheme_propagates_without_on_error() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(
            options_builder(&server)
                .prevent_unauthenticated_access(true)
                .build()
                .unwrap(),
        )
        .unwrap();

        let mut ctx = context_with_auth("Basic xyz");
        let err = plugin.on_context_building(&mut ctx).await.unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::HeaderFormat);
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn wrong_scheme_with_valid_token_still_fails() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(options_builder(&server).build().unwrap()).unwrap();

        let mut ctx = context_with_auth(&format!("Token {}", valid_token("auth0|alice")));
        let err = plugin.on_context_building(&mut ctx).await.unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedTokenType { .. }));
    }

    #[tokio::test]
    async fn failures_go_to_on_error_when_configured() {
        let server = jwks_server().await;
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        let plugin = Auth0Plugin::new(
            options_builder(&server)
                .on_error(move |e| sink.lock().unwrap().push(e.kind()))
                .build()
                .unwrap(),
        )
        .unwrap();

        let mut claims = claims_for("auth0|alice");
        claims["aud"] = json!("api://elsewhere");
        let token = sign(TestKey::Published, Some(KID_A), &claims);
        let mut ctx = context_with_auth(&format!("Bearer {token}"));

        let outcome = plugin.on_context_building(&mut ctx).await.unwrap();

        assert_eq!(outcome, HookOutcome::ErrorReported);
        assert!(ctx.is_empty());
        assert_eq!(
            *reported.lock().unwrap(),
            vec![AuthErrorKind::TokenVerification]
        );
    }

    #[tokio::test]
    async fn key_resolution_failure_propagates() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(options_builder(&server).build().unwrap()).unwrap();

        let token = sign(TestKey::Unpublished, Some("key-b"), &claims_for("auth0|bob"));
        let mut ctx = context_with_auth(&format!("Bearer {token}"));
        let err = plugin.on_context_building(&mut ctx).await.unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::KeyResolution);
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn authenticate_does_not_mutate() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(options_builder(&server).build().unwrap()).unwrap();

        let ctx = context_with_auth(&format!("Bearer {}", valid_token("auth0|dave")));
        let identity = plugin.authenticate(&ctx).await.unwrap().unwrap();

        assert_eq!(identity.subject(), "auth0|dave");
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn repeated_operations_reuse_cached_key() {
        let server = jwks_server().await;
        let plugin = Auth0Plugin::new(options_builder(&server).build().unwrap()).unwrap();

        for sub in ["auth0|a", "auth0|b", "auth0|c"] {
            let mut ctx = context_with_auth(&format!("Bearer {}", valid_token(sub)));
            plugin.on_context_building(&mut ctx).await.unwrap();
            assert_eq!(plugin.identity(&ctx).unwrap().subject(), sub);
        }

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }
}
