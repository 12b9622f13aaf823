/// Core Fixture trait and types
///
/// A fixture inserts one kind of sample data. Fixtures run one after the
/// other in ascending [`Fixture::order`] and find the rows created by earlier
/// fixtures through the [`ReferenceRepository`] carried by the context.
///
/// # Fixture Contract
///
/// Every fixture must:
/// 1. Have a unique order between 1 and 15
/// 2. Only reference fixtures listed in [`Fixture::dependencies`], all of
///    them with a lower order
/// 3. Draw every random value from the context's seeded generator
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use membres_fixtures::fixture::{Fixture, FixtureContext, FixtureResult};
/// use membres_shared::models::formation::{CreateFormation, Formation};
///
/// struct HygieneFormation;
///
/// #[async_trait]
/// impl Fixture for HygieneFormation {
///     fn name(&self) -> &'static str {
///         "hygiene"
///     }
///
///     fn order(&self) -> u32 {
///         8
///     }
///
///     async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
///         let formation = Formation::create(
///             &ctx.pool,
///             CreateFormation {
///                 name: "Hygiène".to_string(),
///                 description: None,
///             },
///         )
///         .await?;
///         ctx.refs.add("formation-hygiene", formation.id)
///     }
/// }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use membres_shared::{
    auth::password::{self, PasswordError},
    services::shift::ShiftError,
};
use rand::rngs::StdRng;
use sqlx::PgPool;

use crate::references::ReferenceRepository;

/// Password of every generated account, development only
pub const DEV_PASSWORD: &str = "Membres-2024";

/// Fixture error types
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// A reference was read before any fixture added it
    #[error("Unknown reference: {0}")]
    MissingReference(String),

    /// Two fixtures added the same reference name
    #[error("Reference added twice: {0}")]
    DuplicateReference(String),

    /// Two fixtures share an order
    #[error("Fixtures {first} and {second} share order {order}")]
    DuplicateOrder {
        order: u32,
        first: &'static str,
        second: &'static str,
    },

    /// A dependency is not registered
    #[error("Fixture {fixture} depends on unknown fixture {dependency}")]
    UnknownDependency {
        fixture: &'static str,
        dependency: &'static str,
    },

    /// A dependency would load after its dependent
    #[error("Fixture {fixture} loads before its dependency {dependency}")]
    DependencyOrder {
        fixture: &'static str,
        dependency: &'static str,
    },

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Shift(#[from] ShiftError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Fixture result type alias
pub type FixtureResult<T> = Result<T, FixtureError>;

/// State shared by the fixtures of one load
pub struct FixtureContext {
    pub pool: PgPool,

    /// Rows created so far, by symbolic name
    pub refs: ReferenceRepository,

    /// Seeded generator; the only source of randomness
    pub rng: StdRng,

    /// Instant the load started, dates are placed around it
    pub now: DateTime<Utc>,

    /// Local time offset
    pub offset: FixedOffset,

    /// A Monday of week A
    pub cycle_start: NaiveDate,

    password_hash: Option<String>,
}

impl FixtureContext {
    pub fn new(
        pool: PgPool,
        rng: StdRng,
        now: DateTime<Utc>,
        offset: FixedOffset,
        cycle_start: NaiveDate,
    ) -> Self {
        Self {
            pool,
            refs: ReferenceRepository::new(),
            rng,
            now,
            offset,
            cycle_start,
            password_hash: None,
        }
    }

    /// Hash of [`DEV_PASSWORD`], computed once per load
    pub fn dev_password_hash(&mut self) -> FixtureResult<String> {
        if let Some(hash) = &self.password_hash {
            return Ok(hash.clone());
        }

        let hash = password::hash_password(DEV_PASSWORD)?;
        self.password_hash = Some(hash.clone());
        Ok(hash)
    }
}

/// Core Fixture trait
#[async_trait]
pub trait Fixture: Send + Sync {
    /// Name used in logs and as the owner of the references it adds
    fn name(&self) -> &'static str;

    /// Position in the load, 1 first
    fn order(&self) -> u32;

    /// Fixtures whose references this one reads
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Inserts the rows
    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()>;
}
