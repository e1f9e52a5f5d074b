// src/handlers/mod.rs

pub mod auth;
pub mod host;
pub mod listings;
