// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::auth_middleware, state::AppState};

pub mod graphql;
pub mod health;

pub fn router(state: AppState) -> Router {
    let graphql_routes = Router::new()
        .route("/graphql", get(graphql::graphql).post(graphql::graphql))
        .route_layer(from_fn_with_state(state.plugin.clone(), auth_middleware));

    Router::new()
        .merge(graphql_routes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
