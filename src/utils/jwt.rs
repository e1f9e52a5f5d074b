// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// A token minted for a magic sign-in link. Single purpose, short-lived.
pub const PURPOSE_MAGIC: &str = "magic";
/// A token backing an authenticated host session.
pub const PURPOSE_SESSION: &str = "session";

/// JWT claims for both magic and session tokens. `purpose` keeps the two
/// from being interchangeable: a magic token cannot authorize host routes
/// and a session token cannot be replayed through the sign-in exchange.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject: the host id for sessions, the email for magic tokens.
    pub sub: String,
    pub email: String,
    pub purpose: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs the short-lived token embedded in a magic sign-in link.
pub fn sign_magic_token(email: &str, secret: &str, ttl_seconds: u64) -> Result<String, AppError> {
    sign(
        Claims {
            sub: email.to_owned(),
            email: email.to_owned(),
            purpose: PURPOSE_MAGIC.to_owned(),
            exp: expiry(ttl_seconds)?,
        },
        secret,
    )
}

/// Signs a session token for an authenticated host.
pub fn sign_session_token(
    host_id: i64,
    email: &str,
    secret: &str,
    ttl_seconds: u64,
) -> Result<String, AppError> {
    sign(
        Claims {
            sub: host_id.to_string(),
            email: email.to_owned(),
            purpose: PURPOSE_SESSION.to_owned(),
            exp: expiry(ttl_seconds)?,
        },
        secret,
    )
}

fn expiry(ttl_seconds: u64) -> Result<usize, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize;
    Ok(now + ttl_seconds as usize)
}

fn sign(claims: Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies a token and checks it was minted for the expected purpose.
pub fn verify_token(token: &str, secret: &str, purpose: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    if token_data.claims.purpose != purpose {
        return Err(AppError::AuthError("Invalid token".to_string()));
    }

    Ok(token_data.claims)
}

/// Axum middleware: host authentication.
///
/// Validates the 'Authorization: Bearer <token>' header as a session token
/// and injects `Claims` into the request extensions for handlers to use.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_token(token, &config.jwt_secret, PURPOSE_SESSION) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
