//! HTTP surface for KeepVault.
//!
//! Exposes the vault RPC surface as RPC-style JSON endpoints under `/api`.
//! The session authority is an axum middleware layered over every route
//! except `signup` and `login`; the split is static in the route table, so
//! no handler ever inspects its own request to decide whether it needed
//! authentication.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};

use keepvault_vault::VaultService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<VaultService>,
}

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    let authed = Router::new()
        .route("/api/key", get(handlers::get_key))
        .route("/api/secret/add", post(handlers::add))
        .route("/api/secret/get", post(handlers::get))
        .route("/api/secret/update", post(handlers::update))
        .route("/api/secret/remove", post(handlers::remove))
        .route("/api/secret/rename", post(handlers::rename))
        .route("/api/secret/copy", post(handlers::copy))
        .route("/api/secret/list", get(handlers::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/api/signup", post(handlers::sign_up))
        .route("/api/login", post(handlers::log_in))
        .merge(authed)
        .with_state(state)
}
