// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixtures shared by the auth tests: RSA keys, a JWKS mock and token minting.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::options::{Auth0Options, Auth0OptionsBuilder, JwksClientOptions};

pub const DOMAIN: &str = "example.auth0.com";
pub const AUDIENCE: &str = "api://test";
pub const ISSUER: &str = "https://example.auth0.com/";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Published in the mock key set.
pub const KID_A: &str = "key-a";

const KEY_A_PEM: &str = include_str!("testdata/signing_key_a.pem");
const KEY_B_PEM: &str = include_str!("testdata/signing_key_b.pem");

const KEY_A_N: &str = "2qoBmvdOD5VuAUhi9PEAz2PXfN00hpmldAG2amIYuM3uFFVuWgnjF6_0rSK1gdRdl0UrC6ylC1ITJC5gKUH__vSlR2wjOKKncXOjAIWCIlcNyzzR1q5YBnSBgK9lmp1cfJRkCvXopCjHXo0yBdRsCXvWWRpSb8ANuQi8fSLMwPTmFp3SzVHX1o3EF-bte1_q78dNIDwW_BhGNqY5vvE8WaODLuaUEAUjs4YnfuadAqZTOVXBubQG6hPdJbsCQ2BhSZfqIliOwoGeWuQIq2QJ_OFR11Mn32_1s_UrBHR-32zAgLVvWk6A5vxomI2jHKyFvZE4ipjkGpOTUEA4S7cqAQ";

/// Which private key signs a test token.
#[derive(Debug, Clone, Copy)]
pub enum TestKey {
    /// Matches the published `key-a`
    Published,
    /// Never published; signatures made with it must not verify
    Unpublished,
}

pub fn jwks_document() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": KID_A,
            "n": KEY_A_N,
            "e": "AQAB"
        }]
    })
}

/// Standard Auth0 access-token claims for `sub`, valid for an hour.
pub fn claims_for(sub: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": sub,
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        "scope": "read:todos write:todos"
    })
}

/// Sign `claims` as RS256 with the chosen key and `kid` header.
pub fn sign(key: TestKey, kid: Option<&str>, claims: &Value) -> String {
    let pem = match key {
        TestKey::Published => KEY_A_PEM,
        TestKey::Unpublished => KEY_B_PEM,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap(),
    )
    .unwrap()
}

/// Valid token for `sub`, signed by the published key.
pub fn valid_token(sub: &str) -> String {
    sign(TestKey::Published, Some(KID_A), &claims_for(sub))
}

/// Mock tenant serving the key set, with no fetch-count expectation.
pub async fn jwks_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_document()))
        .mount(&server)
        .await;
    server
}

pub fn jwks_uri(server: &MockServer) -> Url {
    Url::parse(&format!("{}{}", server.uri(), JWKS_PATH)).unwrap()
}

pub fn jwks_options(server: &MockServer) -> JwksClientOptions {
    JwksClientOptions {
        jwks_uri: Some(jwks_uri(server)),
        ..Default::default()
    }
}

/// Builder for the `example.auth0.com` / `api://test` tenant, pointed at `server`.
pub fn options_builder(server: &MockServer) -> Auth0OptionsBuilder {
    Auth0Options::builder(DOMAIN, AUDIENCE).jwks_client_options(jwks_options(server))
}
