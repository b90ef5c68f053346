// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::Auth0Plugin;

#[derive(Clone)]
pub struct AppState {
    pub plugin: Arc<Auth0Plugin>,
}

impl AppState {
    pub fn new(plugin: Auth0Plugin) -> Self {
        Self {
            plugin: Arc::new(plugin),
        }
    }
}
