// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-operation execution context.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use super::headers::HeaderSource;

type Field = Box<dyn Any + Send + Sync>;

/// Caller-owned bag of named fields, one per inbound operation.
///
/// The request headers are attached once by the pipeline. Everything else is
/// keyed by field name; values are typed, so readers ask for the type they
/// expect and get `None` on a mismatch.
#[derive(Default)]
pub struct ExecutionContext {
    headers: Option<Box<dyn HeaderSource>>,
    fields: HashMap<String, Field>,
}

impl ExecutionContext {
    /// Context with no request attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a request exposing the given headers.
    pub fn with_headers(headers: impl HeaderSource + 'static) -> Self {
        Self {
            headers: Some(Box::new(headers)),
            fields: HashMap::new(),
        }
    }

    pub fn headers(&self) -> Option<&dyn HeaderSource> {
        self.headers.as_deref()
    }

    /// Set `field`, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, field: impl Into<String>, value: T) {
        self.fields.insert(field.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, field: &str) -> Option<&T> {
        self.fields.get(field)?.downcast_ref::<T>()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn remove<T: Any>(&mut self, field: &str) -> Option<T> {
        if self.get::<T>(field).is_none() {
            return None;
        }
        let boxed = self.fields.remove(field)?;
        boxed.downcast::<T>().ok().map(|value| *value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.field_names().collect();
        names.sort_unstable();
        f.debug_struct("ExecutionContext")
            .field("has_headers", &self.headers.is_some())
            .field("fields", &names)
            .finish()
    }
}
