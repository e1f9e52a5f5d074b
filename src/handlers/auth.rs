// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::host::{MagicLinkRequest, SessionRequest},
    store::ListingStore,
    utils::jwt::{PURPOSE_MAGIC, sign_magic_token, sign_session_token, verify_token},
};

/// Requests a magic sign-in link for an email address.
///
/// Mints a short-lived single-purpose token and hands the link to the mail
/// collaborator (currently: the operator log). Always responds 202 for a
/// well-formed email, whether or not the host exists yet.
pub async fn request_magic_link(
    State(config): State<Config>,
    Json(payload): Json<MagicLinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    let token = sign_magic_token(&email, &config.jwt_secret, config.magic_link_ttl_seconds)?;

    tracing::info!(
        "magic sign-in link for {}: {}/auth/sign-in?token={}",
        email,
        config.public_base_url,
        token
    );

    Ok((StatusCode::ACCEPTED, Json(json!({ "sent": true }))))
}

/// Exchanges a magic token for a bearer session.
///
/// First sign-in creates the host row; subsequent sign-ins reuse it.
pub async fn create_session(
    State(store): State<Arc<dyn ListingStore>>,
    State(config): State<Config>,
    Json(payload): Json<SessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_token(&payload.token, &config.jwt_secret, PURPOSE_MAGIC)?;

    let host = store.upsert_host(&claims.email).await?;

    let token = sign_session_token(
        host.id,
        &host.email,
        &config.jwt_secret,
        config.session_ttl_seconds,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "host_id": host.id,
        "email": host.email,
    })))
}
