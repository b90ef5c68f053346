// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum adapter for the context-building hook.
//!
//! `auth_middleware` runs the hook before the handler and moves a verified
//! identity into request extensions. Handlers read it back with the
//! [`Identity`] or [`OptionalIdentity`] extractors:
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/graphql", post(graphql_handler))
//!     .layer(axum::middleware::from_fn_with_state(plugin.clone(), auth_middleware));
//!
//! async fn graphql_handler(Identity(viewer): Identity) -> impl IntoResponse {
//!     // viewer.sub is the caller
//! }
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, Auth0Plugin, ExecutionContext, VerifiedIdentity};

/// Authentication middleware function.
///
/// A hook error aborts the request with an operation-level error response.
pub async fn auth_middleware(
    State(plugin): State<Arc<Auth0Plugin>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut context = ExecutionContext::with_headers(request.headers().clone());

    match plugin.on_context_building(&mut context).await {
        Ok(_) => {
            let field = plugin.options().extend_context_field();
            if let Some(identity) = context.remove::<VerifiedIdentity>(field) {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extractor requiring a verified caller.
pub struct Identity(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedIdentity>()
            .cloned()
            .map(Identity)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Optional authentication extractor.
///
/// `None` for anonymous operations instead of rejecting.
pub struct OptionalIdentity(pub Option<VerifiedIdentity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(parts.extensions.get::<VerifiedIdentity>().cloned()))
    }
}
