//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cookie strings (`document.cookie` assignments, parsing, domain matching)
//! - Cryptographic utilities (HMAC-SHA256, Base64url, random secrets)
//! - Password hashing (Argon2id)
//! - URL / origin helpers

pub mod cookie;
pub mod crypto;
pub mod location;
pub mod password;
