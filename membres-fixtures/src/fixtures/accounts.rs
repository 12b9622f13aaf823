/// Login accounts: members, admins and the super admin
///
/// Every account shares [`DEV_PASSWORD`](crate::fixture::DEV_PASSWORD).

use async_trait::async_trait;
use membres_shared::{
    auth::roles::Role,
    models::user::{CreateUser, User},
};
use tracing::debug;

use crate::{
    fixture::{Fixture, FixtureContext, FixtureResult},
    references::reference_name,
};

pub const USER_COUNT: usize = 24;
pub const ADMIN_COUNT: usize = 3;

async fn create_account(
    ctx: &mut FixtureContext,
    username: String,
    roles: Vec<Role>,
) -> FixtureResult<User> {
    let password_hash = ctx.dev_password_hash()?;
    let user = User::create(
        &ctx.pool,
        CreateUser {
            email: format!("{}@membres.test", username),
            username,
            password_hash,
            roles,
        },
    )
    .await?;

    debug!(username = %user.username, "Account created");
    Ok(user)
}

/// `membre01`.. with the plain member role, beneficiaries are attached later
pub struct Users;

#[async_trait]
impl Fixture for Users {
    fn name(&self) -> &'static str {
        "users"
    }

    fn order(&self) -> u32 {
        1
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        for i in 1..=USER_COUNT {
            let user = create_account(ctx, format!("membre{:02}", i), vec![Role::User]).await?;
            ctx.refs.add(reference_name("user", i), user.id)?;
        }
        Ok(())
    }
}

/// Shop staff; the first one also maintains the process updates
pub struct Admins;

#[async_trait]
impl Fixture for Admins {
    fn name(&self) -> &'static str {
        "admins"
    }

    fn order(&self) -> u32 {
        2
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        for i in 1..=ADMIN_COUNT {
            let mut roles = vec![Role::Admin];
            if i == 1 {
                roles.push(Role::ProcessManager);
            }

            let user = create_account(ctx, format!("admin{:02}", i), roles).await?;
            ctx.refs.add(reference_name("admin", i), user.id)?;
        }
        Ok(())
    }
}

pub struct SuperAdmin;

#[async_trait]
impl Fixture for SuperAdmin {
    fn name(&self) -> &'static str {
        "super_admin"
    }

    fn order(&self) -> u32 {
        3
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let user = create_account(ctx, "superadmin".to_string(), vec![Role::SuperAdmin]).await?;
        ctx.refs.add("super-admin", user.id)
    }
}
