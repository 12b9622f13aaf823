/// Database models for Membres
///
/// Each model maps one table of `migrations/` and carries its own queries.
///
/// # Models
///
/// - `user`: accounts, credentials and roles
/// - `membership`: member numbers and withdrawn/frozen state
/// - `beneficiary`: people attached to a membership, one user each
/// - `formation`: skills required by some shifts
/// - `job` / `period` / `shift`: shift planning
/// - `registration`: yearly payments
/// - `code`: door codes shared between shifters
/// - `commission` / `task` / `note`: association life
/// - `event`: general assemblies and proxies
/// - `swipe_card`: access badges
/// - `service`: connected services and their clients
/// - `process_update`: announcements about how things work
///
/// # Example
///
/// ```no_run
/// use membres_shared::models::membership::{CreateMembership, Membership};
/// use membres_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let number = Membership::next_member_number(&pool).await?;
/// let membership = Membership::create(&pool, CreateMembership { member_number: number }).await?;
/// # Ok(())
/// # }
/// ```

pub mod beneficiary;
pub mod code;
pub mod commission;
pub mod event;
pub mod formation;
pub mod job;
pub mod membership;
pub mod note;
pub mod period;
pub mod process_update;
pub mod registration;
pub mod service;
pub mod shift;
pub mod swipe_card;
pub mod task;
pub mod user;
