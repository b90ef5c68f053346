// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth0 Envelope - JWT authentication for GraphQL execution pipelines
//!
//! Verifies Auth0-issued bearer tokens against the tenant JWKS and stores the
//! caller's claims in the per-operation execution context.
//!
//! ## Modules
//!
//! - `auth` - Context-building hook, key resolver, token extraction and verification
//! - `api` - HTTP handlers for the demo gateway (Axum)
//! - `config` - Environment configuration for the gateway binary
//! - `error` - Operation-level error envelopes and configuration errors

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
