use async_trait::async_trait;
use membres_shared::models::code::{generate_value, Code};
use rand::seq::SliceRandom;

use crate::{
    fixture::{Fixture, FixtureContext, FixtureResult},
    references::reference_name,
};

const CODE_COUNT: usize = 8;

/// Door code history; only the latest one stays open
pub struct Codes;

#[async_trait]
impl Fixture for Codes {
    fn name(&self) -> &'static str {
        "codes"
    }

    fn order(&self) -> u32 {
        14
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["users", "admins"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let mut registrars = ctx.refs.with_prefix("user-");
        registrars.extend(ctx.refs.with_prefix("admin-"));

        let mut latest = None;
        for i in 1..=CODE_COUNT {
            let Some(registrar_id) = registrars.choose(&mut ctx.rng).copied() else {
                break;
            };
            let value = generate_value(&mut ctx.rng);
            let code = Code::create(&ctx.pool, &value, registrar_id).await?;

            ctx.refs.add(reference_name("code", i), code.id)?;
            latest = Some(code);
        }

        if let Some(code) = latest {
            Code::close_older_than(&ctx.pool, &code).await?;
        }

        Ok(())
    }
}
