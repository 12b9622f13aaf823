/// Memberships, their beneficiaries and registrations

use async_trait::async_trait;
use chrono::Duration;
use membres_shared::models::{
    beneficiary::{Beneficiary, CreateBeneficiary},
    membership::{CreateMembership, Membership},
    note::{CreateNote, Note},
    registration::{CreateRegistration, Registration, RegistrationMode},
    swipe_card::SwipeCard,
};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use super::{accounts::USER_COUNT, data};
use crate::{
    fixture::{Fixture, FixtureContext, FixtureResult},
    references::reference_name,
};

/// Every n-th member joins the previous membership as a second beneficiary
const HOUSEHOLD_EVERY: usize = 6;

const MODES: &[RegistrationMode] = &[
    RegistrationMode::Cash,
    RegistrationMode::Cheque,
    RegistrationMode::LocalCurrency,
    RegistrationMode::CreditCard,
    RegistrationMode::HelloAsso,
];

/// One beneficiary per member account
///
/// Most members get their own membership and become its main beneficiary.
/// Each beneficiary also gets a swipe card and some formations.
pub struct Beneficiaries;

#[async_trait]
impl Fixture for Beneficiaries {
    fn name(&self) -> &'static str {
        "beneficiaries"
    }

    fn order(&self) -> u32 {
        9
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["users", "formations"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let formations = ctx.refs.with_prefix("formation-");
        let mut household: Option<Uuid> = None;

        for i in 1..=USER_COUNT {
            let user_id = ctx.refs.get(&reference_name("user", i))?;
            let joins_household = i % HOUSEHOLD_EVERY == 0 && household.is_some();

            let mut tx = ctx.pool.begin().await?;

            let membership_id = match household.filter(|_| joins_household) {
                Some(id) => id,
                None => {
                    let member_number = Membership::next_member_number(&mut *tx).await?;
                    let membership =
                        Membership::create(&mut *tx, CreateMembership { member_number }).await?;
                    membership.id
                }
            };

            let beneficiary = Beneficiary::create(
                &mut *tx,
                CreateBeneficiary {
                    user_id,
                    membership_id: Some(membership_id),
                    firstname: data::pick(&mut ctx.rng, data::FIRSTNAMES).to_string(),
                    lastname: data::pick(&mut ctx.rng, data::LASTNAMES).to_string(),
                    phone: Some(data::phone(&mut ctx.rng)),
                    address: ctx
                        .rng
                        .gen_bool(0.7)
                        .then(|| data::address(&mut ctx.rng)),
                    flying: ctx.rng.gen_bool(0.2),
                },
            )
            .await?;

            if !joins_household {
                Membership::set_main_beneficiary(&mut *tx, membership_id, beneficiary.id).await?;
            }

            tx.commit().await?;

            for formation_id in &formations {
                if ctx.rng.gen_bool(0.3) {
                    Beneficiary::add_formation(&ctx.pool, beneficiary.id, *formation_id).await?;
                }
            }

            let code = data::card_code(&mut ctx.rng);
            SwipeCard::create(&ctx.pool, &code, Some(i as i32), beneficiary.id).await?;

            debug!(
                beneficiary_id = %beneficiary.id,
                membership_id = %membership_id,
                "Beneficiary created"
            );

            if !joins_household {
                ctx.refs.add(reference_name("membership", i), membership_id)?;
                household = Some(membership_id);
            }
            ctx.refs.add(reference_name("beneficiary", i), beneficiary.id)?;
        }

        Ok(())
    }
}

/// Yearly fees taken by the staff, with the occasional note
///
/// About one membership in eight only has a registration older than a year,
/// so expired memberships show up too.
pub struct Registrations;

#[async_trait]
impl Fixture for Registrations {
    fn name(&self) -> &'static str {
        "registrations"
    }

    fn order(&self) -> u32 {
        12
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["beneficiaries", "admins"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let admins = ctx.refs.with_prefix("admin-");
        let memberships = ctx.refs.with_prefix("membership-");

        for (i, membership_id) in memberships.into_iter().enumerate() {
            let registrar_id = admins.choose(&mut ctx.rng).copied();
            let expired = ctx.rng.gen_bool(0.125);
            let days_ago = if expired {
                ctx.rng.gen_range(380..500)
            } else {
                ctx.rng.gen_range(0..330)
            };

            let registration = Registration::create(
                &ctx.pool,
                CreateRegistration {
                    membership_id,
                    registrar_id,
                    date: ctx.now - Duration::days(days_ago),
                    amount_cents: ctx.rng.gen_range(2..=6) * 500,
                    mode: MODES.choose(&mut ctx.rng).copied().unwrap_or(RegistrationMode::Cash),
                },
            )
            .await?;
            ctx.refs.add(reference_name("registration", i + 1), registration.id)?;

            if ctx.rng.gen_bool(0.25) {
                let note = Note::create(
                    &ctx.pool,
                    CreateNote {
                        membership_id,
                        author_id: registrar_id,
                        parent_id: None,
                        text: format!("Adhésion réglée en {}", registration.mode.label()),
                    },
                )
                .await?;

                if ctx.rng.gen_bool(0.5) {
                    Note::create(
                        &ctx.pool,
                        CreateNote {
                            membership_id,
                            author_id: admins.choose(&mut ctx.rng).copied(),
                            parent_id: Some(note.id),
                            text: "Reçu envoyé par email".to_string(),
                        },
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }
}
