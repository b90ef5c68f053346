// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Plugin configuration.
//!
//! Built once at startup with [`Auth0Options::builder`] and read-only after.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::context::ExecutionContext;
use super::error::AuthError;
use crate::error::ConfigError;

/// Default context field holding the verified identity.
pub const DEFAULT_CONTEXT_FIELD: &str = "_auth0";
/// Default authorization scheme.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
/// Default header carrying the credential.
pub const DEFAULT_HEADER_NAME: &str = "authorization";

/// Callback receiving failures when they should not abort the operation.
pub type OnErrorFn = Arc<dyn Fn(&AuthError) + Send + Sync>;

/// Custom token extraction, replacing the header-based default.
pub type ExtractTokenFn =
    Arc<dyn Fn(&ExecutionContext) -> Result<Option<String>, AuthError> + Send + Sync>;

/// Key resolver tuning.
#[derive(Debug, Clone)]
pub struct JwksClientOptions {
    /// Override for `https://{domain}/.well-known/jwks.json`
    pub jwks_uri: Option<Url>,
    /// Cache resolved keys
    pub cache: bool,
    /// Maximum number of cached keys
    pub cache_max_entries: usize,
    /// Age after which a cached key is evicted
    pub cache_max_age: Duration,
    /// Limit outbound fetches
    pub rate_limit: bool,
    pub jwks_requests_per_minute: u32,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Default for JwksClientOptions {
    fn default() -> Self {
        Self {
            jwks_uri: None,
            cache: true,
            cache_max_entries: 5,
            cache_max_age: Duration::from_secs(600),
            rate_limit: true,
            jwks_requests_per_minute: 5,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Claim verification overrides.
///
/// The signing algorithm is not configurable: tokens are always checked as
/// RS256.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Accepted audiences instead of the configured audience
    pub audience: Option<Vec<String>>,
    /// Accepted issuers instead of `https://{domain}/`
    pub issuer: Option<Vec<String>>,
    /// Clock skew tolerance in seconds
    pub leeway_secs: u64,
    /// Expected `sub`
    pub subject: Option<String>,
    pub ignore_expiration: bool,
    pub ignore_not_before: bool,
    /// Claims that must be present, e.g. `["exp", "sub"]`
    pub required_claims: Vec<String>,
}

/// Structural decode overrides.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Accept tokens without `kid` and verify them with any published key
    pub allow_missing_kid: bool,
}

/// Immutable plugin configuration.
#[derive(Clone)]
pub struct Auth0Options {
    domain: String,
    audience: String,
    prevent_unauthenticated_access: bool,
    on_error: Option<OnErrorFn>,
    extract_token: Option<ExtractTokenFn>,
    jwks: JwksClientOptions,
    verify: VerifyOptions,
    decode: DecodeOptions,
    extend_context_field: String,
    token_type: String,
    header_name: String,
    jwks_uri: Url,
    issuer: String,
}

impl Auth0Options {
    /// Start building options for an Auth0 tenant and API audience.
    pub fn builder(domain: impl Into<String>, audience: impl Into<String>) -> Auth0OptionsBuilder {
        Auth0OptionsBuilder {
            domain: domain.into(),
            audience: audience.into(),
            prevent_unauthenticated_access: false,
            on_error: None,
            extract_token: None,
            jwks: JwksClientOptions::default(),
            verify: VerifyOptions::default(),
            decode: DecodeOptions::default(),
            extend_context_field: DEFAULT_CONTEXT_FIELD.to_string(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn prevent_unauthenticated_access(&self) -> bool {
        self.prevent_unauthenticated_access
    }

    pub fn on_error(&self) -> Option<&OnErrorFn> {
        self.on_error.as_ref()
    }

    pub fn extract_token(&self) -> Option<&ExtractTokenFn> {
        self.extract_token.as_ref()
    }

    pub fn jwks(&self) -> &JwksClientOptions {
        &self.jwks
    }

    pub fn verify(&self) -> &VerifyOptions {
        &self.verify
    }

    pub fn decode(&self) -> &DecodeOptions {
        &self.decode
    }

    pub fn extend_context_field(&self) -> &str {
        &self.extend_context_field
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Key set location, either overridden or derived from the domain.
    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    /// Expected `iss`, always `https://{domain}/`.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl fmt::Debug for Auth0Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth0Options")
            .field("domain", &self.domain)
            .field("audience", &self.audience)
            .field("prevent_unauthenticated_access", &self.prevent_unauthenticated_access)
            .field("on_error", &self.on_error.is_some())
            .field("extract_token", &self.extract_token.is_some())
            .field("jwks", &self.jwks)
            .field("verify", &self.verify)
            .field("decode", &self.decode)
            .field("extend_context_field", &self.extend_context_field)
            .field("token_type", &self.token_type)
            .field("header_name", &self.header_name)
            .finish()
    }
}

/// Builder for [`Auth0Options`].
pub struct Auth0OptionsBuilder {
    domain: String,
    audience: String,
    prevent_unauthenticated_access: bool,
    on_error: Option<OnErrorFn>,
    extract_token: Option<ExtractTokenFn>,
    jwks: JwksClientOptions,
    verify: VerifyOptions,
    decode: DecodeOptions,
    extend_context_field: String,
    token_type: String,
    header_name: String,
}

impl Auth0OptionsBuilder {
    /// Reject operations that carry no token.
    pub fn prevent_unauthenticated_access(mut self, prevent: bool) -> Self {
        self.prevent_unauthenticated_access = prevent;
        self
    }

    /// Report failures here instead of failing the operation.
    pub fn on_error(mut self, on_error: impl Fn(&AuthError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    /// Replace header-based extraction.
    pub fn extract_token(
        mut self,
        extract: impl Fn(&ExecutionContext) -> Result<Option<String>, AuthError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.extract_token = Some(Arc::new(extract));
        self
    }

    pub fn jwks_client_options(mut self, jwks: JwksClientOptions) -> Self {
        self.jwks = jwks;
        self
    }

    pub fn verify_options(mut self, verify: VerifyOptions) -> Self {
        self.verify = verify;
        self
    }

    pub fn decode_options(mut self, decode: DecodeOptions) -> Self {
        self.decode = decode;
        self
    }

    pub fn extend_context_field(mut self, field: impl Into<String>) -> Self {
        self.extend_context_field = field.into();
        self
    }

    pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Empty`] when a required string is blank,
    /// [`ConfigError::Invalid`] when the domain does not form a valid URL.
    pub fn build(self) -> Result<Auth0Options, ConfigError> {
        let domain = self.domain.trim().trim_end_matches('/').to_string();
        let audience = self.audience.trim().to_string();

        if domain.is_empty() {
            return Err(ConfigError::Empty("domain"));
        }
        if audience.is_empty() {
            return Err(ConfigError::Empty("audience"));
        }
        if self.extend_context_field.is_empty() {
            return Err(ConfigError::Empty("extend_context_field"));
        }
        if self.token_type.is_empty() {
            return Err(ConfigError::Empty("token_type"));
        }
        if self.header_name.is_empty() {
            return Err(ConfigError::Empty("header_name"));
        }

        let issuer = format!("https://{domain}/");
        let jwks_uri = match &self.jwks.jwks_uri {
            Some(uri) => uri.clone(),
            None => Url::parse(&format!("{issuer}.well-known/jwks.json")).map_err(|e| {
                ConfigError::Invalid {
                    name: "domain",
                    reason: e.to_string(),
                }
            })?,
        };

        Ok(Auth0Options {
            domain,
            audience,
            prevent_unauthenticated_access: self.prevent_unauthenticated_access,
            on_error: self.on_error,
            extract_token: self.extract_token,
            jwks: self.jwks,
            verify: self.verify,
            decode: self.decode,
            extend_context_field: self.extend_context_field,
            token_type: self.token_type,
            header_name: self.header_name,
            jwks_uri,
            issuer,
        })
    }
}
