// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Header lookup capability.
//!
//! The pipeline adapts its native request type to [`HeaderSource`] once, at
//! the boundary. Token extraction only ever asks for a header by name.

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Anything that can answer "what is the value of header `name`".
pub trait HeaderSource: Send + Sync {
    /// Single string value of the header, matched case-insensitively.
    ///
    /// Returns `None` when the header is absent, repeated, or not valid text.
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        let mut values = self.get_all(name).iter();
        let value = values.next()?;
        if values.next().is_some() {
            return None;
        }
        value.to_str().ok()
    }
}

impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.get(name) {
            return Some(value.as_str());
        }
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
