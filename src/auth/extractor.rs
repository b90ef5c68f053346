// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token extraction from the execution context.
//!
//! The default reads `<token_type> <token>` from the configured header. A
//! custom extraction function in [`Auth0Options`] replaces it entirely.

use tracing::warn;

use super::context::ExecutionContext;
use super::error::AuthError;
use super::headers::HeaderSource;
use super::options::Auth0Options;

/// Extract the raw token, or `None` when the operation carries none.
///
/// # Errors
///
/// [`AuthError::InvalidHeader`] or [`AuthError::UnsupportedTokenType`] when
/// the header is present but malformed, or whatever a custom extraction
/// function returns.
pub fn extract_token(
    options: &Auth0Options,
    context: &ExecutionContext,
) -> Result<Option<String>, AuthError> {
    if let Some(extract) = options.extract_token() {
        return extract(context);
    }

    let Some(headers) = context.headers() else {
        warn!(
            "Unable to locate request headers on the execution context. \
             Attach them when building the context, or configure a custom token extraction function."
        );
        return Ok(None);
    };

    bearer_token(headers, options.header_name(), options.token_type())
}

/// Parse `<token_type> <token>` out of `header_name`.
pub fn bearer_token(
    headers: &dyn HeaderSource,
    header_name: &str,
    token_type: &str,
) -> Result<Option<String>, AuthError> {
    let value = match headers.header(header_name) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    let parts: Vec<&str> = value.split(' ').collect();
    let [scheme, token] = parts.as_slice() else {
        return Err(AuthError::InvalidHeader {
            header: header_name.to_string(),
        });
    };

    if *scheme != token_type {
        return Err(AuthError::UnsupportedTokenType {
            token_type: (*scheme).to_string(),
        });
    }

    if token.is_empty() {
        return Ok(None);
    }

    Ok(Some((*token).to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::auth::error::AuthErrorKind;

    fn options() -> Auth0Options {
        Auth0Options::builder("example.auth0.com", "api://test")
            .build()
            .unwrap()
    }

    fn context_with(header: &str, value: &str) -> ExecutionContext {
        ExecutionContext::with_headers(HashMap::from([(header.to_string(), value.to_string())]))
    }

    #[test]
    fn extracts_bearer_token() {
        let ctx = context_with("authorization", "Bearer abc.def.ghi");
        let token = extract_token(&options(), &ctx).unwrap();
        assert_eq!(token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_is_absent() {
        let ctx = context_with("x-request-id", "42");
        assert_eq!(extract_token(&options(), &ctx).unwrap(), None);
    }

    #[test]
    fn empty_header_is_absent() {
        let ctx = context_with("authorization", "");
        assert_eq!(extract_token(&options(), &ctx).unwrap(), None);
    }

    #[test]
    fn missing_headers_entirely_is_absent() {
        assert_eq!(extract_token(&options(), &ExecutionContext::new()).unwrap(), None);
    }

    #[test]
    fn wrong_part_count_is_header_format_error() {
        for value in ["Bearer", "Bearer a b", "Bearer  abc", "abc"] {
            let err = extract_token(&options(), &context_with("authorization", value)).unwrap_err();
            assert_eq!(err.kind(), AuthErrorKind::HeaderFormat, "value {value:?}");
            assert!(matches!(err, AuthError::InvalidHeader { .. }));
        }
    }

    #[test]
    fn scheme_is_case_sensitive() {
        let err = extract_token(&options(), &context_with("authorization", "bearer abc")).unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedTokenType { ref token_type } if token_type == "bearer"));
    }

    #[test]
    fn wrong_scheme_is_rejected() {
        let err = extract_token(&options(), &context_with("authorization", "Basic xyz")).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::HeaderFormat);
    }

    #[test]
    fn empty_token_is_absent() {
        let ctx = context_with("authorization", "Bearer ");
        assert_eq!(extract_token(&options(), &ctx).unwrap(), None);
    }

    #[test]
    fn custom_header_and_scheme() {
        let options = Auth0Options::builder("example.auth0.com", "api://test")
            .header_name("x-auth")
            .token_type("Token")
            .build()
            .unwrap();

        let ctx = context_with("X-Auth", "Token abc");
        assert_eq!(extract_token(&options, &ctx).unwrap().as_deref(), Some("abc"));

        // The default header is no longer consulted.
        let ctx = context_with("authorization", "Bearer abc");
        assert_eq!(extract_token(&options, &ctx).unwrap(), None);
    }

    #[test]
    fn custom_extraction_bypasses_headers() {
        let options = Auth0Options::builder("example.auth0.com", "api://test")
            .extract_token(|ctx| Ok(ctx.get::<String>("cookie_token").cloned()))
            .build()
            .unwrap();

        // A malformed header would fail the default path.
        let mut ctx = context_with("authorization", "Basic xyz");
        assert_eq!(extract_token(&options, &ctx).unwrap(), None);

        ctx.insert("cookie_token", "from-cookie".to_string());
        assert_eq!(
            extract_token(&options, &ctx).unwrap().as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn custom_extraction_errors_pass_through() {
        let options = Auth0Options::builder("example.auth0.com", "api://test")
            .extract_token(|_| Err(AuthError::Extraction("cookie jar unreadable".to_string())))
            .build()
            .unwrap();

        let err = extract_token(&options, &ExecutionContext::new()).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Extraction);
    }
}
