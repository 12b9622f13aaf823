/// Weekly planning and the shifts generated from it

use async_trait::async_trait;
use chrono::{Duration, NaiveTime};
use membres_shared::{
    models::{
        period::{CreatePeriod, CreatePeriodPosition, Period, PeriodPosition, WeekCycle},
        shift::Shift,
    },
    services::shift::{self as shift_service, ShiftError},
};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use super::accounts::USER_COUNT;
use crate::{
    fixture::{Fixture, FixtureContext, FixtureError, FixtureResult},
    references::reference_name,
};

/// Local (start, end) hours of the daily slots
const SLOTS: &[((u32, u32), (u32, u32))] = &[
    ((9, 0), (12, 0)),
    ((14, 0), (17, 0)),
    ((17, 30), (20, 30)),
];

/// Monday to Saturday
const OPEN_DAYS: std::ops::RangeInclusive<i16> = 0..=5;

const POSITIONS_PER_PERIOD: usize = 3;

/// Days of history and of planning around today
const PAST_DAYS: i64 = 14;
const FUTURE_DAYS: i64 = 13;

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Three slots a day, rotating over the jobs
pub struct Periods;

#[async_trait]
impl Fixture for Periods {
    fn name(&self) -> &'static str {
        "periods"
    }

    fn order(&self) -> u32 {
        10
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["jobs"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let jobs = ctx.refs.with_prefix("job-");
        if jobs.is_empty() {
            return Err(FixtureError::MissingReference(reference_name("job", 1)));
        }
        let mut index = 0;

        for day_of_week in OPEN_DAYS {
            for (slot, (start, end)) in SLOTS.iter().enumerate() {
                let job_id = jobs[(day_of_week as usize + slot) % jobs.len()];
                let period = Period::create(
                    &ctx.pool,
                    CreatePeriod {
                        day_of_week,
                        start_time: time(start.0, start.1),
                        end_time: time(end.0, end.1),
                        job_id,
                    },
                )
                .await?;

                index += 1;
                ctx.refs.add(reference_name("period", index), period.id)?;
            }
        }

        Ok(())
    }
}

/// Positions of every period for each cycle week
///
/// The first position of a period needs the slot referent formation. A third
/// of the beneficiaries hold one fixed position each, always one without a
/// formation requirement.
pub struct PeriodPositions;

#[async_trait]
impl Fixture for PeriodPositions {
    fn name(&self) -> &'static str {
        "period_positions"
    }

    fn order(&self) -> u32 {
        11
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["periods", "formations", "beneficiaries", "admins"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let periods = ctx.refs.with_prefix("period-");
        let referent = ctx.refs.get(&reference_name("formation", 2))?;
        let admins = ctx.refs.with_prefix("admin-");

        let mut fixed_shifters = ctx.refs.with_prefix("beneficiary-");
        fixed_shifters.shuffle(&mut ctx.rng);
        fixed_shifters.truncate(USER_COUNT / 3);

        let mut open_positions = Vec::new();
        let mut index = 0;

        for period_id in periods {
            for week_cycle in WeekCycle::ALL {
                for slot in 0..POSITIONS_PER_PERIOD {
                    let position = PeriodPosition::create(
                        &ctx.pool,
                        CreatePeriodPosition {
                            period_id,
                            formation_id: (slot == 0).then_some(referent),
                            week_cycle,
                        },
                    )
                    .await?;

                    if position.formation_id.is_none() {
                        open_positions.push(position.id);
                    }
                    index += 1;
                    ctx.refs.add(reference_name("position", index), position.id)?;
                }
            }
        }

        open_positions.shuffle(&mut ctx.rng);
        for (shifter_id, position_id) in fixed_shifters.into_iter().zip(open_positions) {
            let Some(booker_id) = admins.choose(&mut ctx.rng).copied() else {
                break;
            };
            PeriodPosition::book(&ctx.pool, position_id, shifter_id, booker_id).await?;
            debug!(position_id = %position_id, shifter_id = %shifter_id, "Fixed shifter assigned");
        }

        Ok(())
    }
}

/// Shifts of the last two weeks and the next two
///
/// Past shifts are mostly booked and carried out, which turns their
/// shifters into regulars. Upcoming shifts go through the regular booking
/// rules, so a booking refused for a missing formation is simply skipped.
pub struct Shifts;

#[async_trait]
impl Fixture for Shifts {
    fn name(&self) -> &'static str {
        "shifts"
    }

    fn order(&self) -> u32 {
        13
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["users", "beneficiaries"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let users = ctx.refs.with_prefix("user-");
        let beneficiaries = ctx.refs.with_prefix("beneficiary-");
        let members: Vec<_> = beneficiaries.into_iter().zip(users).collect();

        let today = shift_service::local_date(ctx.now, &ctx.offset);
        let mut shifts = Vec::new();
        for day in -PAST_DAYS..=FUTURE_DAYS {
            let date = today + Duration::days(day);
            shifts.extend(
                shift_service::generate_for_date(&ctx.pool, date, ctx.cycle_start, &ctx.offset)
                    .await?,
            );
        }

        let mut carried_out = 0;
        for (i, shift) in shifts.iter().enumerate() {
            ctx.refs.add(reference_name("shift", i + 1), shift.id)?;

            let Some((beneficiary_id, user_id)) = members.choose(&mut ctx.rng).copied() else {
                continue;
            };

            if shift.has_started(ctx.now) {
                let booked = shift.is_booked()
                    || (ctx.rng.gen_bool(0.6)
                        && Shift::book(&ctx.pool, shift.id, beneficiary_id, user_id)
                            .await?
                            .is_some());

                if booked && ctx.rng.gen_bool(0.85) {
                    Shift::set_carried_out(&ctx.pool, shift.id, true).await?;
                    carried_out += 1;
                }
            } else if !shift.is_booked() && ctx.rng.gen_bool(0.3) {
                match shift_service::book(&ctx.pool, shift.id, beneficiary_id, user_id, ctx.now).await
                {
                    Ok(_) => {}
                    Err(ShiftError::Booking(reason)) => {
                        debug!(shift_id = %shift.id, reason = %reason, "Booking skipped");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        info!(
            generated = shifts.len(),
            carried_out,
            "Shifts generated"
        );

        Ok(())
    }
}
