//! # Workboard Shared Library
//!
//! This crate contains the domain core of Workboard: database models,
//! authorization policy, the task query engine, and the mutation services
//! used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Passwords, JWT tokens, and the authorization policy
//! - `db`: Connection pool and migration runner
//! - `query`: Read side: filtered, sorted, paginated task views
//! - `service`: Write side: validated, invariant-preserving mutations
//! - `projection`: Read shapes returned to callers
//! - `clock`: Injectable time source
//! - `validate`: Field-level validation rules (email shape, date strings)
//! - `error`: Common error types

pub mod auth;
pub mod clock;
pub mod db;
pub mod error;
pub mod models;
pub mod projection;
pub mod query;
pub mod service;
pub mod validate;

/// Current version of the Workboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
