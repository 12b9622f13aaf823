use async_trait::async_trait;
use chrono::{Duration, Timelike};
use membres_shared::models::{
    commission::{Commission, CreateCommission},
    task::{CreateTask, Task},
};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::{
    fixture::{Fixture, FixtureContext, FixtureResult},
    references::reference_name,
};

/// (name, email, first task)
const COMMISSIONS: &[(&str, &str, &str)] = &[
    ("Communication", "communication@membres.test", "Préparer la lettre d'information"),
    ("Informatique", "informatique@membres.test", "Mettre à jour le logiciel de caisse"),
    ("Accueil", "accueil@membres.test", "Organiser la prochaine réunion d'information"),
];

/// Working groups with a few members, the first of them owner, an upcoming
/// meeting and an open task
pub struct Commissions;

#[async_trait]
impl Fixture for Commissions {
    fn name(&self) -> &'static str {
        "commissions"
    }

    fn order(&self) -> u32 {
        15
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["beneficiaries", "super_admin"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let beneficiaries = ctx.refs.with_prefix("beneficiary-");
        let registrar_id = ctx.refs.get("super-admin")?;

        for (i, (name, email, task)) in COMMISSIONS.iter().enumerate() {
            let commission = Commission::create(
                &ctx.pool,
                CreateCommission {
                    name: name.to_string(),
                    email: Some(email.to_string()),
                    description: None,
                },
            )
            .await?;

            let size = ctx.rng.gen_range(3..=5);
            let members: Vec<_> = beneficiaries
                .choose_multiple(&mut ctx.rng, size)
                .copied()
                .collect();
            for (rank, beneficiary_id) in members.into_iter().enumerate() {
                Commission::add_beneficiary(&ctx.pool, commission.id, beneficiary_id, rank == 0)
                    .await?;
            }

            let meeting = (ctx.now + Duration::days(ctx.rng.gen_range(3..30)))
                .with_minute(0)
                .and_then(|at| at.with_second(0))
                .and_then(|at| at.with_nanosecond(0))
                .unwrap_or(ctx.now);
            Commission::schedule_meeting(
                &ctx.pool,
                commission.id,
                meeting,
                Some("Local de l'association".to_string()),
            )
            .await?;

            Task::create(
                &ctx.pool,
                CreateTask {
                    title: task.to_string(),
                    description: None,
                    registrar_id: Some(registrar_id),
                    commission_id: Some(commission.id),
                    due_date: Some(meeting.date_naive()),
                    priority: ctx.rng.gen_range(0..3),
                },
            )
            .await?;

            ctx.refs.add(reference_name("commission", i + 1), commission.id)?;
        }

        Ok(())
    }
}
