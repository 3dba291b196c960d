//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by the
//! auth shell crates:
//! - Error classification (validation / network / expiry / storage ...)
//! - The user-facing error type and result alias
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
