//! # Membres Fixtures
//!
//! Sample data for development databases: accounts, memberships, the weekly
//! planning with its shifts, door codes and the rest of the association's
//! records.
//!
//! ## Modules
//!
//! - `fixture`: the `Fixture` trait and the context fixtures load with
//! - `references`: named ids shared between fixtures
//! - `fixtures`: the fifteen sample fixtures
//! - `loader`: validation, purge and ordered loading
//!
//! ## Example
//!
//! ```no_run
//! use membres_fixtures::loader::{FixtureLoader, LoaderConfig};
//!
//! # async fn example(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let loader = FixtureLoader::with_default_fixtures(pool, LoaderConfig::from_env()?);
//! let report = loader.run().await?;
//! println!("Loaded with seed {}", report.seed);
//! # Ok(())
//! # }
//! ```

pub mod fixture;
pub mod fixtures;
pub mod loader;
pub mod references;
