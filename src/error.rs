// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operation-level failures rendered as GraphQL error envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// A failure that aborts the whole operation.
#[derive(Debug)]
pub struct OperationError {
    pub status: StatusCode,
    pub message: String,
    pub code: String,
}

#[derive(Serialize)]
struct ErrorBody {
    data: Option<()>,
    errors: Vec<ErrorEntry>,
}

#[derive(Serialize)]
struct ErrorEntry {
    message: String,
    extensions: ErrorExtensions,
}

#[derive(Serialize)]
struct ErrorExtensions {
    code: String,
}

impl OperationError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }
}

impl From<AuthError> for OperationError {
    fn from(e: AuthError) -> Self {
        let status = e.status_code();
        let code = if status == StatusCode::UNAUTHORIZED {
            "UNAUTHENTICATED".to_string()
        } else {
            e.error_code().to_uppercase()
        };
        Self::new(status, e.to_string(), code)
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            data: None,
            errors: vec![ErrorEntry {
                message: self.message,
                extensions: ErrorExtensions { code: self.code },
            }],
        });
        (self.status, body).into_response()
    }
}

/// Invalid plugin configuration or environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("environment variable {0} is required")]
    MissingEnv(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn auth_errors_map_to_unauthenticated_code() {
        let err = OperationError::from(AuthError::InvalidAudience);
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "UNAUTHENTICATED");
        assert_eq!(err.message, "Token audience is invalid");
    }

    #[test]
    fn infrastructure_errors_keep_their_code() {
        let err = OperationError::from(AuthError::KeyResolution(
            crate::auth::KeyResolutionError::NoSigningKeys,
        ));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, "JWKS_FETCH_ERROR");
    }

    #[tokio::test]
    async fn into_response_returns_graphql_envelope() {
        let response =
            OperationError::new(StatusCode::BAD_REQUEST, "bad query", "BAD_REQUEST").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"data":null,"errors":[{"message":"bad query","extensions":{"code":"BAD_REQUEST"}}]}"#
        );
    }
}
