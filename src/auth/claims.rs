// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim set of a verified access token.
///
/// Only `sub` is guaranteed. Every other claim (`iss`, `aud`, `exp`, `scope`,
/// Auth0 namespaced claims, ...) is kept as-is in `claims`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Subject, the Auth0 user or client identifier
    pub sub: String,

    /// All other claims
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl VerifiedIdentity {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Raw value of any claim other than `sub`.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.claims.get("iss").and_then(Value::as_str)
    }

    /// Audiences, whether the token carried a single string or an array.
    pub fn audiences(&self) -> Vec<&str> {
        match self.claims.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(auds)) => auds.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("exp")
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("iat")
    }

    /// Space-delimited OAuth `scope` claim, split.
    pub fn scopes(&self) -> Vec<&str> {
        self.claims
            .get("scope")
            .and_then(Value::as_str)
            .map(|scope| scope.split_whitespace().collect())
            .unwrap_or_default()
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        let secs = self.claims.get(name)?.as_i64()?;
        DateTime::from_timestamp(secs, 0)
    }
}
