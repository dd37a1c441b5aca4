//! Session authority: bearer-token authentication for every vault call.
//!
//! Sole authorization chokepoint. Each request on an authenticated route
//! moves through a fixed sequence: header absent → 400; token invalid or
//! expired → 401; otherwise the resolved login is injected into the request
//! extensions and the handler runs with it.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header::AUTHORIZATION;

use crate::handlers::ApiError;
use crate::AppState;
use keepvault_common::Error;

/// Login resolved from the session token, injected for inner handlers.
#[derive(Debug, Clone)]
pub struct SessionLogin(pub String);

/// Middleware authenticating a request and attaching its login.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::InvalidInput("missing authorization metadata".to_string()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Auth("invalid token".to_string()))?;

    let login = state.vault.authenticate(token)?;
    request.extensions_mut().insert(SessionLogin(login));

    Ok(next.run(request).await)
}
