//! # Membres Fixtures
//!
//! Fills a development database with sample data.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo run -p membres-fixtures
//! ```
//!
//! The database is purged first unless `FIXTURES_APPEND` is set. Pass
//! `FIXTURES_SEED` to replay a previous data set.

use membres_fixtures::loader::{FixtureLoader, LoaderConfig};
use membres_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "membres_fixtures=info,membres_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Membres Fixtures v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = LoaderConfig::from_env()?;
    let pool = create_pool(DatabaseConfig {
        url: config.database_url.clone(),
        ..DatabaseConfig::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let loader = FixtureLoader::with_default_fixtures(pool.clone(), config);
    if loader.config().append {
        tracing::info!("Appending to existing data");
    } else {
        loader.purge().await?;
    }

    let report = loader.run().await?;
    for fixture in &report.fixtures {
        tracing::info!(
            order = fixture.order,
            fixture = fixture.name,
            references = fixture.references,
            "Loaded"
        );
    }
    tracing::info!(
        seed = report.seed,
        references = report.references,
        "Done, replay with FIXTURES_SEED={}",
        report.seed
    );

    close_pool(pool).await;
    Ok(())
}
