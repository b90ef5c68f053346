// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Echo endpoint standing in for a GraphQL executor.
//!
//! Resolves a single `viewer` field from the identity the middleware put on
//! the request, so the auth pipeline can be exercised end to end.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{OptionalIdentity, VerifiedIdentity};

#[derive(Debug, Serialize)]
pub struct GraphqlResponse {
    pub data: ViewerData,
}

#[derive(Debug, Serialize)]
pub struct ViewerData {
    pub viewer: Option<Viewer>,
}

/// The authenticated caller as seen by resolvers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&VerifiedIdentity> for Viewer {
    fn from(identity: &VerifiedIdentity) -> Self {
        Self {
            sub: identity.subject().to_string(),
            issuer: identity.issuer().map(str::to_string),
            scopes: identity.scopes().into_iter().map(str::to_string).collect(),
            expires_at: identity.expires_at(),
        }
    }
}

/// `GET|POST /graphql`
pub async fn graphql(OptionalIdentity(identity): OptionalIdentity) -> Json<GraphqlResponse> {
    Json(GraphqlResponse {
        data: ViewerData {
            viewer: identity.as_ref().map(Viewer::from),
        },
    })
}
