// src/models/host.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'hosts' table: one row per listing owner, keyed by the
/// email the magic link was sent to.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Host {
    pub id: i64,
    pub email: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for requesting a magic sign-in link.
#[derive(Debug, Deserialize, Validate)]
pub struct MagicLinkRequest {
    #[validate(email)]
    pub email: String,
}

/// DTO for exchanging a magic token for a session.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub token: String,
}
