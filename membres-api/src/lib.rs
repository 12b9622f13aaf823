//! # Membres API Server Library
//!
//! HTTP surface of the association: authentication, door codes, memberships
//! and registrations, shifts and process updates.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `forms`: Field definitions and input binding
//! - `middleware`: First password guard and client address extraction
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod routes;
