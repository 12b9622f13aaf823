/// Fixture loader
///
/// Registers fixtures, checks that their orders and dependencies agree, then
/// loads them one after the other into an emptied database.
///
/// # Architecture
///
/// ```text
/// FixtureLoader
///   ├─> validate: unique orders, dependencies registered and loaded first
///   ├─> purge: TRUNCATE every application table
///   └─> run: for each fixture by order
///         ├─> ReferenceRepository::enter(name)
///         └─> Fixture::load(ctx)
/// ```
///
/// # Example
///
/// ```no_run
/// use membres_fixtures::loader::{FixtureLoader, LoaderConfig};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let config = LoaderConfig::from_env()?;
/// let loader = FixtureLoader::with_default_fixtures(pool, config);
///
/// loader.purge().await?;
/// let report = loader.run().await?;
/// println!("{} references", report.references);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::fixture::{Fixture, FixtureContext, FixtureError, FixtureResult};
use crate::fixtures;
use crate::references::ReferenceGraph;

/// Every application table; the truncation cascades so order does not matter
const TABLES: &[&str] = &[
    "users",
    "memberships",
    "beneficiaries",
    "formations",
    "beneficiary_formations",
    "swipe_cards",
    "jobs",
    "periods",
    "period_positions",
    "shifts",
    "registrations",
    "codes",
    "commissions",
    "commission_beneficiaries",
    "tasks",
    "notes",
    "events",
    "proxies",
    "process_updates",
    "services",
    "clients",
];

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub database_url: String,

    /// Seed of the generator; drawn at random when unset
    pub seed: Option<u64>,

    /// Keep existing rows instead of purging first
    pub append: bool,

    /// Offset of local time from UTC
    pub utc_offset_minutes: i32,

    /// A Monday in week A of the four-week cycle
    pub cycle_start: NaiveDate,
}

impl LoaderConfig {
    /// Reads `DATABASE_URL`, `FIXTURES_SEED`, `FIXTURES_APPEND`,
    /// `APP_UTC_OFFSET_MINUTES` and `SHIFT_CYCLE_START`
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let seed = match env::var("FIXTURES_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u64>()?),
            _ => None,
        };

        let append = matches!(
            env::var("FIXTURES_APPEND")
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
                .as_str(),
            "1" | "true" | "yes" | "on"
        );

        let utc_offset_minutes = env::var("APP_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i32>()?;

        let cycle_start = env::var("SHIFT_CYCLE_START")
            .unwrap_or_else(|_| "2024-01-01".to_string())
            .parse::<NaiveDate>()?;

        Ok(Self {
            database_url,
            seed,
            append,
            utc_offset_minutes,
            cycle_start,
        })
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

/// One loaded fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFixture {
    pub order: u32,
    pub name: &'static str,

    /// References it added
    pub references: usize,
}

/// Outcome of a load
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Seed to replay the same data set
    pub seed: u64,

    pub fixtures: Vec<LoadedFixture>,

    /// Total references added
    pub references: usize,

    /// Fixtures each fixture actually read references from
    pub graph: ReferenceGraph,
}

/// Fixture loader
///
/// Holds the registry of fixtures by name.
pub struct FixtureLoader {
    pool: PgPool,
    config: LoaderConfig,
    fixtures: HashMap<&'static str, Arc<dyn Fixture>>,
}

impl FixtureLoader {
    /// Creates a loader with an empty registry
    pub fn new(pool: PgPool, config: LoaderConfig) -> Self {
        FixtureLoader {
            pool,
            config,
            fixtures: HashMap::new(),
        }
    }

    /// Creates a loader with the fifteen sample fixtures registered
    pub fn with_default_fixtures(pool: PgPool, config: LoaderConfig) -> Self {
        let mut loader = Self::new(pool, config);
        for fixture in fixtures::all() {
            loader.register(fixture);
        }
        loader
    }

    /// Registers a fixture, replacing one of the same name
    pub fn register(&mut self, fixture: Arc<dyn Fixture>) {
        debug!(fixture = fixture.name(), order = fixture.order(), "Registering fixture");
        self.fixtures.insert(fixture.name(), fixture);
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Registered fixtures in load order
    pub fn ordered(&self) -> Vec<Arc<dyn Fixture>> {
        let mut ordered: Vec<_> = self.fixtures.values().cloned().collect();
        ordered.sort_by_key(|fixture| (fixture.order(), fixture.name()));
        ordered
    }

    /// Checks orders are unique and every dependency loads earlier
    pub fn validate(&self) -> FixtureResult<()> {
        validate(&self.ordered())
    }

    /// Empties every application table
    pub async fn purge(&self) -> FixtureResult<()> {
        let statement = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", TABLES.join(", "));
        sqlx::query(&statement).execute(&self.pool).await?;

        info!(tables = TABLES.len(), "Database purged");
        Ok(())
    }

    /// Loads every fixture in order
    pub async fn run(&self) -> FixtureResult<LoadReport> {
        let ordered = self.ordered();
        validate(&ordered)?;

        let seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(seed, fixtures = ordered.len(), "Loading fixtures");

        let mut ctx = FixtureContext::new(
            self.pool.clone(),
            StdRng::seed_from_u64(seed),
            Utc::now(),
            self.config.offset(),
            self.config.cycle_start,
        );

        let mut loaded = Vec::with_capacity(ordered.len());
        for fixture in &ordered {
            info!(order = fixture.order(), fixture = fixture.name(), "Loading fixture");

            ctx.refs.enter(fixture.name());
            fixture.load(&mut ctx).await?;

            loaded.push(LoadedFixture {
                order: fixture.order(),
                name: fixture.name(),
                references: ctx.refs.count_owned_by(fixture.name()),
            });
        }

        info!(references = ctx.refs.len(), "Fixtures loaded");

        Ok(LoadReport {
            seed,
            fixtures: loaded,
            references: ctx.refs.len(),
            graph: ctx.refs.graph().clone(),
        })
    }
}

/// Checks `ordered` (sorted by order) for clashes and misplaced dependencies
fn validate(ordered: &[Arc<dyn Fixture>]) -> FixtureResult<()> {
    for pair in ordered.windows(2) {
        if pair[0].order() == pair[1].order() {
            return Err(FixtureError::DuplicateOrder {
                order: pair[0].order(),
                first: pair[0].name(),
                second: pair[1].name(),
            });
        }
    }

    let orders: HashMap<&str, u32> = ordered
        .iter()
        .map(|fixture| (fixture.name(), fixture.order()))
        .collect();

    for fixture in ordered {
        for &dependency in fixture.dependencies() {
            match orders.get(dependency) {
                None => {
                    return Err(FixtureError::UnknownDependency {
                        fixture: fixture.name(),
                        dependency,
                    })
                }
                Some(order) if *order >= fixture.order() => {
                    return Err(FixtureError::DependencyOrder {
                        fixture: fixture.name(),
                        dependency,
                    })
                }
                Some(_) => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;

    struct Stub {
        name: &'static str,
        order: u32,
        dependencies: &'static [&'static str],
    }

    #[async_trait]
    impl Fixture for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn order(&self) -> u32 {
            self.order
        }

        fn dependencies(&self) -> &'static [&'static str] {
            self.dependencies
        }

        async fn load(&self, _ctx: &mut FixtureContext) -> FixtureResult<()> {
            Ok(())
        }
    }

    fn stub(name: &'static str, order: u32, dependencies: &'static [&'static str]) -> Arc<dyn Fixture> {
        Arc::new(Stub {
            name,
            order,
            dependencies,
        })
    }

    fn test_config() -> LoaderConfig {
        LoaderConfig {
            database_url: "postgresql://localhost/unused".to_string(),
            seed: Some(1),
            append: false,
            utc_offset_minutes: 60,
            cycle_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_fixtures_are_ordered_one_to_fifteen() {
        let loader = FixtureLoader::with_default_fixtures(lazy_pool(), test_config());

        let orders: Vec<u32> = loader.ordered().iter().map(|f| f.order()).collect();
        assert_eq!(orders, (1..=15).collect::<Vec<_>>());
        assert!(loader.validate().is_ok());
    }

    #[tokio::test]
    async fn test_default_load_order() {
        let loader = FixtureLoader::with_default_fixtures(lazy_pool(), test_config());

        let names: Vec<&str> = loader.ordered().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "users",
                "admins",
                "super_admin",
                "services",
                "jobs",
                "clients",
                "events",
                "formations",
                "beneficiaries",
                "periods",
                "period_positions",
                "registrations",
                "shifts",
                "codes",
                "commissions",
            ]
        );
    }

    #[test]
    fn test_duplicate_order_is_rejected() {
        let ordered = vec![stub("jobs", 5, &[]), stub("events", 5, &[])];

        assert!(matches!(
            validate(&ordered),
            Err(FixtureError::DuplicateOrder { order: 5, .. })
        ));
    }

    #[test]
    fn test_dependency_must_load_first() {
        let ordered = vec![stub("shifts", 1, &["periods"]), stub("periods", 2, &[])];

        assert!(matches!(
            validate(&ordered),
            Err(FixtureError::DependencyOrder {
                fixture: "shifts",
                dependency: "periods"
            })
        ));
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let ordered = vec![stub("clients", 6, &["services"])];

        assert!(matches!(
            validate(&ordered),
            Err(FixtureError::UnknownDependency {
                dependency: "services",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_register_replaces_same_name() {
        let mut loader = FixtureLoader::new(lazy_pool(), test_config());
        loader.register(stub("jobs", 5, &[]));
        loader.register(stub("jobs", 6, &[]));

        let ordered = loader.ordered();
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].order(), 6);
    }
}
