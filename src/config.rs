// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Lifetime of a session token, in seconds.
    pub session_ttl_seconds: u64,
    /// Lifetime of a magic sign-in token, in seconds.
    pub magic_link_ttl_seconds: u64,
    /// Base URL the magic sign-in link points at (the web frontend).
    pub public_base_url: String,
    pub rust_log: String,
}

const DEFAULT_SESSION_TTL: u64 = 60 * 60 * 24 * 7;
const DEFAULT_MAGIC_LINK_TTL: u64 = 60 * 15;

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let session_ttl_seconds = env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL);

        let magic_link_ttl_seconds = env::var("MAGIC_LINK_TTL_SECONDS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_MAGIC_LINK_TTL);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            session_ttl_seconds,
            magic_link_ttl_seconds,
            public_base_url,
            rust_log,
        }
    }
}
