// src/models/mod.rs

pub mod host;
pub mod listing;
