//! # Workboard API Server Library
//!
//! This library provides the HTTP layer of Workboard on top of the
//! domain core in `workboard-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `bootstrap`: First-run admin account seeding
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
