// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names and defaults for the gateway binary. Library
//! users build [`Auth0Options`] directly instead.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_DOMAIN` | Auth0 tenant domain, e.g. `example.auth0.com` | Required |
//! | `AUTH0_AUDIENCE` | Expected `aud` claim | Required |
//! | `AUTH0_PREVENT_UNAUTHENTICATED` | Reject operations without a token | `false` |
//! | `AUTH0_CONTEXT_FIELD` | Context field holding the identity | `_auth0` |
//! | `AUTH0_TOKEN_TYPE` | Authorization scheme | `Bearer` |
//! | `AUTH0_HEADER_NAME` | Header carrying the credential | `authorization` |
//! | `AUTH0_JWKS_URI` | Override for the tenant JWKS endpoint | `https://{domain}/.well-known/jwks.json` |
//! | `JWKS_CACHE_MAX_AGE_SECS` | Cached key lifetime | `600` |
//! | `JWKS_REQUESTS_PER_MINUTE` | Outbound JWKS fetch limit | `5` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::{Auth0Options, JwksClientOptions};
use crate::error::ConfigError;

pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const AUTH0_AUDIENCE_ENV: &str = "AUTH0_AUDIENCE";
pub const AUTH0_PREVENT_UNAUTHENTICATED_ENV: &str = "AUTH0_PREVENT_UNAUTHENTICATED";
pub const AUTH0_CONTEXT_FIELD_ENV: &str = "AUTH0_CONTEXT_FIELD";
pub const AUTH0_TOKEN_TYPE_ENV: &str = "AUTH0_TOKEN_TYPE";
pub const AUTH0_HEADER_NAME_ENV: &str = "AUTH0_HEADER_NAME";
pub const AUTH0_JWKS_URI_ENV: &str = "AUTH0_JWKS_URI";
pub const JWKS_CACHE_MAX_AGE_SECS_ENV: &str = "JWKS_CACHE_MAX_AGE_SECS";
pub const JWKS_REQUESTS_PER_MINUTE_ENV: &str = "JWKS_REQUESTS_PER_MINUTE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Unknown values fall back to `pretty`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Plugin options from the process environment.
pub fn load_options() -> Result<Auth0Options, ConfigError> {
    options_from_lookup(env_lookup)
}

/// Bind address from `HOST` / `PORT`.
pub fn bind_addr() -> Result<SocketAddr, ConfigError> {
    bind_addr_from_lookup(env_lookup)
}

/// Build plugin options from `lookup`, which returns `None` for unset
/// variables.
pub fn options_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Auth0Options, ConfigError> {
    let domain = lookup(AUTH0_DOMAIN_ENV).ok_or(ConfigError::MissingEnv(AUTH0_DOMAIN_ENV))?;
    let audience = lookup(AUTH0_AUDIENCE_ENV).ok_or(ConfigError::MissingEnv(AUTH0_AUDIENCE_ENV))?;

    let mut jwks = JwksClientOptions::default();
    if let Some(uri) = lookup(AUTH0_JWKS_URI_ENV) {
        let uri = Url::parse(&uri).map_err(|e| ConfigError::Invalid {
            name: AUTH0_JWKS_URI_ENV,
            reason: e.to_string(),
        })?;
        jwks.jwks_uri = Some(uri);
    }
    if let Some(secs) = parse_var::<u64>(&lookup, JWKS_CACHE_MAX_AGE_SECS_ENV)? {
        jwks.cache_max_age = Duration::from_secs(secs);
    }
    if let Some(rpm) = parse_var::<u32>(&lookup, JWKS_REQUESTS_PER_MINUTE_ENV)? {
        jwks.jwks_requests_per_minute = rpm;
    }

    let mut builder = Auth0Options::builder(domain, audience).jwks_client_options(jwks);
    if let Some(prevent) = parse_bool(&lookup, AUTH0_PREVENT_UNAUTHENTICATED_ENV)? {
        builder = builder.prevent_unauthenticated_access(prevent);
    }
    if let Some(field) = lookup(AUTH0_CONTEXT_FIELD_ENV) {
        builder = builder.extend_context_field(field);
    }
    if let Some(token_type) = lookup(AUTH0_TOKEN_TYPE_ENV) {
        builder = builder.token_type(token_type);
    }
    if let Some(header_name) = lookup(AUTH0_HEADER_NAME_ENV) {
        builder = builder.header_name(header_name);
    }

    builder.build()
}

pub fn bind_addr_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SocketAddr, ConfigError> {
    let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = parse_var::<u16>(&lookup, PORT_ENV)?.unwrap_or(DEFAULT_PORT);

    format!("{host}:{port}")
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: HOST_ENV,
            reason: e.to_string(),
        })
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}
