// src/utils/mod.rs

pub mod body_type;
pub mod html;
pub mod jwt;
pub mod location;
pub mod slug;
