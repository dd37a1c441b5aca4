//! Request handlers and wire types for the vault API.
//!
//! Requests and responses are small JSON bodies mirroring the RPC surface.
//! Secret payloads stay opaque ciphertext end to end; user keys travel
//! base64-encoded inside authenticated responses only.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::auth::SessionLogin;
use crate::AppState;
use keepvault_common::{Error, SecretKind};

/// Error wrapper mapping the vault taxonomy onto HTTP statuses.
///
/// Responses carry a coarse category and message only: no internals, no key
/// material.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(%status, err = %self.0, "request failed");
        } else {
            debug!(%status, err = %self.0, "request rejected");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_key: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct KeyResponse {
    pub user_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SecretWrite {
    pub key: String,
    pub kind: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct SecretName {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct SecretMove {
    pub key: String,
    pub new_key: String,
}

#[derive(Debug, Serialize)]
pub struct SecretResponse {
    pub key: String,
    pub kind: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub keys: String,
}

fn parse_kind(kind: &str) -> Result<SecretKind, ApiError> {
    kind.parse::<SecretKind>().map_err(ApiError::from)
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let grant = state.vault.sign_up(&request.login, &request.password).await?;
    Ok(Json(AuthResponse {
        user_key: STANDARD.encode(&*grant.user_key),
        token: grant.token,
    }))
}

pub async fn log_in(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let grant = state.vault.log_in(&request.login, &request.password).await?;
    Ok(Json(AuthResponse {
        user_key: STANDARD.encode(&*grant.user_key),
        token: grant.token,
    }))
}

pub async fn get_key(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
) -> Result<Json<KeyResponse>, ApiError> {
    let key = state.vault.get_key(&login).await?;
    Ok(Json(KeyResponse {
        user_key: STANDARD.encode(&*key),
    }))
}

pub async fn add(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
    Json(request): Json<SecretWrite>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&request.kind)?;
    state
        .vault
        .add(&login, &request.key, kind, &request.data)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn get(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
    Json(request): Json<SecretName>,
) -> Result<Json<SecretResponse>, ApiError> {
    let (kind, data) = state.vault.get(&login, &request.key).await?;
    Ok(Json(SecretResponse {
        key: request.key,
        kind: kind.as_str().to_string(),
        data,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
    Json(request): Json<SecretWrite>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&request.kind)?;
    state
        .vault
        .update(&login, &request.key, kind, &request.data)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
    Json(request): Json<SecretName>,
) -> Result<StatusCode, ApiError> {
    state.vault.remove(&login, &request.key).await?;
    Ok(StatusCode::OK)
}

pub async fn rename(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
    Json(request): Json<SecretMove>,
) -> Result<StatusCode, ApiError> {
    state
        .vault
        .rename(&login, &request.key, &request.new_key)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn copy(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
    Json(request): Json<SecretMove>,
) -> Result<StatusCode, ApiError> {
    state
        .vault
        .copy(&login, &request.key, &request.new_key)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(SessionLogin(login)): Extension<SessionLogin>,
) -> Result<Json<ListResponse>, ApiError> {
    let keys = state.vault.list(&login).await?;
    Ok(Json(ListResponse { keys }))
}
