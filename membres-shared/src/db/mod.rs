/// Database layer for Membres
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
///
/// Row types and their queries live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
