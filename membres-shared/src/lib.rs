//! # Membres Shared Library
//!
//! Types, persistence and business rules shared by the Membres API server
//! and the fixture loader.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `db`: Connection pool and migrations
//! - `auth`: Passwords, tokens, roles and access voters
//! - `lifecycle`: Hooks run when beneficiaries and users are created
//! - `services`: Shift rules

pub mod auth;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod services;

/// Current version of the Membres shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
