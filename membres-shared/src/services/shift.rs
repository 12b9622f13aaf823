/// Shift rules
///
/// Pure checks take `now` and the association's UTC offset as arguments so
/// they can be tested without a clock; the async functions load what the
/// checks need and apply them.
///
/// # Attendance window
///
/// A beneficiary is "attending" when one of their shifts starts between two
/// hours ago and one hour from now. Only shifts starting after yesterday
/// 23:59:59 local time are considered, so a shift from last night never
/// counts even right after midnight.
///
/// # Example
///
/// ```no_run
/// use chrono::{FixedOffset, Utc};
/// use membres_shared::services::shift;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, beneficiary_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let offset = FixedOffset::east_opt(3600).unwrap();
/// let attendance = shift::attendance(&pool, beneficiary_id, Utc::now(), &offset).await?;
/// if attendance.is_attending(Utc::now(), &offset) {
///     println!("on shift");
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::beneficiary::Beneficiary;
use crate::models::membership::Membership;
use crate::models::period::{Period, PeriodPosition, WeekCycle};
use crate::models::shift::{CreateShift, Shift};

/// Minutes before its start a shift opens the attendance window
pub const ATTENDANCE_LEAD_MINUTES: i64 = 60;

/// Minutes after its start a shift still counts as attended
pub const ATTENDANCE_GRACE_MINUTES: i64 = 120;

/// Reasons a beneficiary cannot book a shift
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Shift is already booked")]
    AlreadyBooked,

    #[error("Shift has already started")]
    AlreadyStarted,

    #[error("Shift was dismissed")]
    Dismissed,

    #[error("Membership is withdrawn or frozen")]
    MembershipInactive,

    #[error("Shift requires a formation the beneficiary does not hold")]
    MissingFormation(Uuid),
}

/// Error type for shift operations
#[derive(Debug, thiserror::Error)]
pub enum ShiftError {
    #[error("Shift {0} not found")]
    NotFound(Uuid),

    #[error("Beneficiary {0} not found")]
    BeneficiaryNotFound(Uuid),

    #[error("Shift is locked")]
    Locked,

    #[error("Shift has already started")]
    AlreadyStarted,

    #[error("Invalid time window: end must be after start")]
    InvalidWindow,

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Shift history of a beneficiary, as needed by the code voter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attendance {
    /// No shift carried out yet
    pub is_beginner: bool,

    /// Starts of the shifts beginning after the end of yesterday
    pub shift_starts: Vec<DateTime<Utc>>,
}

impl Attendance {
    /// Not a beginner and one shift in the attendance window
    pub fn is_attending(&self, now: DateTime<Utc>, offset: &FixedOffset) -> bool {
        !self.is_beginner
            && self
                .shift_starts
                .iter()
                .any(|start| in_attendance_window(*start, now, offset))
    }
}

/// Local calendar date of `at`
pub fn local_date(at: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    at.with_timezone(offset).date_naive()
}

/// Whether `at` falls on the same local day as `now`
pub fn is_same_local_day(at: DateTime<Utc>, now: DateTime<Utc>, offset: &FixedOffset) -> bool {
    local_date(at, offset) == local_date(now, offset)
}

/// Yesterday 23:59:59 local time
pub fn end_of_yesterday(now: DateTime<Utc>, offset: &FixedOffset) -> DateTime<Utc> {
    let midnight = local_date(now, offset).and_time(NaiveTime::MIN);
    let start_of_today = offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    start_of_today - Duration::seconds(1)
}

/// Whether a shift starting at `start` puts its shifter in the attendance
/// window at `now`; bounds are inclusive
pub fn in_attendance_window(start: DateTime<Utc>, now: DateTime<Utc>, offset: &FixedOffset) -> bool {
    start > end_of_yesterday(now, offset)
        && start >= now - Duration::minutes(ATTENDANCE_GRACE_MINUTES)
        && start <= now + Duration::minutes(ATTENDANCE_LEAD_MINUTES)
}

/// Checks whether `membership` (holding `formations`) may book `shift`
pub fn check_booking(
    shift: &Shift,
    membership: &Membership,
    formations: &[Uuid],
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    if shift.is_booked() {
        return Err(BookingError::AlreadyBooked);
    }
    if shift.has_started(now) {
        return Err(BookingError::AlreadyStarted);
    }
    if shift.is_dismissed {
        return Err(BookingError::Dismissed);
    }
    if !membership.can_take_shifts() {
        return Err(BookingError::MembershipInactive);
    }
    if let Some(formation_id) = shift.formation_id {
        if !formations.contains(&formation_id) {
            return Err(BookingError::MissingFormation(formation_id));
        }
    }

    Ok(())
}

/// A started shift keeps its shifter
pub fn check_free(shift: &Shift, now: DateTime<Utc>) -> Result<(), ShiftError> {
    if shift.has_started(now) {
        return Err(ShiftError::AlreadyStarted);
    }

    Ok(())
}

pub fn check_reschedule(
    shift: &Shift,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> Result<(), ShiftError> {
    if shift.locked {
        return Err(ShiftError::Locked);
    }
    if end_at <= start_at {
        return Err(ShiftError::InvalidWindow);
    }

    Ok(())
}

/// A beneficiary who never carried out a shift
pub async fn is_beginner(pool: &PgPool, beneficiary_id: Uuid) -> Result<bool, sqlx::Error> {
    Ok(Shift::count_carried_out(pool, beneficiary_id).await? == 0)
}

/// Loads the facts the attendance window is computed from
pub async fn attendance(
    pool: &PgPool,
    beneficiary_id: Uuid,
    now: DateTime<Utc>,
    offset: &FixedOffset,
) -> Result<Attendance, sqlx::Error> {
    let is_beginner = is_beginner(pool, beneficiary_id).await?;
    let shift_starts =
        Shift::list_by_shifter_since(pool, beneficiary_id, end_of_yesterday(now, offset))
            .await?
            .into_iter()
            .map(|shift| shift.start_at)
            .collect();

    Ok(Attendance {
        is_beginner,
        shift_starts,
    })
}

/// Books `shift_id` for `beneficiary_id` on behalf of `booker_id`
pub async fn book(
    pool: &PgPool,
    shift_id: Uuid,
    beneficiary_id: Uuid,
    booker_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Shift, ShiftError> {
    let shift = Shift::find_by_id(pool, shift_id)
        .await?
        .ok_or(ShiftError::NotFound(shift_id))?;
    let beneficiary = Beneficiary::find_by_id(pool, beneficiary_id)
        .await?
        .ok_or(ShiftError::BeneficiaryNotFound(beneficiary_id))?;
    let membership_id = beneficiary
        .membership_id
        .ok_or(BookingError::MembershipInactive)?;
    let membership = Membership::find_by_id(pool, membership_id)
        .await?
        .ok_or(BookingError::MembershipInactive)?;
    let formations = Beneficiary::formation_ids(pool, beneficiary_id).await?;

    check_booking(&shift, &membership, &formations, now)?;

    let booked = Shift::book(pool, shift_id, beneficiary_id, booker_id)
        .await?
        .ok_or(BookingError::AlreadyBooked)?;

    if membership.first_shift_date.is_none() {
        Membership::set_first_shift_date(pool, membership.id, booked.start_at.date_naive()).await?;
    }

    info!(
        shift_id = %shift_id,
        beneficiary_id = %beneficiary_id,
        booker_id = %booker_id,
        "Shift booked"
    );

    Ok(booked)
}

/// Releases a booked shift before it starts
pub async fn free(pool: &PgPool, shift_id: Uuid, now: DateTime<Utc>) -> Result<Shift, ShiftError> {
    let shift = Shift::find_by_id(pool, shift_id)
        .await?
        .ok_or(ShiftError::NotFound(shift_id))?;

    check_free(&shift, now)?;

    let freed = Shift::free(pool, shift_id)
        .await?
        .ok_or(ShiftError::NotFound(shift_id))?;

    info!(shift_id = %shift_id, "Shift freed");

    Ok(freed)
}

/// Moves an unlocked shift to a new window
pub async fn reschedule(
    pool: &PgPool,
    shift_id: Uuid,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> Result<Shift, ShiftError> {
    let shift = Shift::find_by_id(pool, shift_id)
        .await?
        .ok_or(ShiftError::NotFound(shift_id))?;

    check_reschedule(&shift, start_at, end_at)?;

    // Locked between the read and the write
    Shift::update_times(pool, shift_id, start_at, end_at)
        .await?
        .ok_or(ShiftError::Locked)
}

/// Creates the shifts of `date` from the weekly template
///
/// Every position of every period falling on that weekday whose cycle week
/// matches gets one shift, pre-booked when the position has a fixed
/// shifter. Positions that already produced a shift for that start are
/// skipped, so running this twice for the same day is harmless.
pub async fn generate_for_date(
    pool: &PgPool,
    date: NaiveDate,
    cycle_start: NaiveDate,
    offset: &FixedOffset,
) -> Result<Vec<Shift>, ShiftError> {
    let cycle = WeekCycle::for_date(date, cycle_start);
    let day_of_week = date.weekday().num_days_from_monday() as i16;
    let periods = Period::list_by_day(pool, day_of_week).await?;

    let mut tx = pool.begin().await?;
    let mut created = Vec::new();

    for period in periods {
        let Some((start_at, end_at)) = period.occurrence_on(date, offset) else {
            continue;
        };

        for position in PeriodPosition::list_by_period(pool, period.id).await? {
            if position.week_cycle != cycle {
                continue;
            }
            if Shift::exists_for_position(&mut *tx, position.id, start_at).await? {
                debug!(position_id = %position.id, "Shift already generated");
                continue;
            }

            let shift = Shift::create(
                &mut *tx,
                CreateShift {
                    start_at,
                    end_at,
                    job_id: period.job_id,
                    formation_id: position.formation_id,
                    position_id: Some(position.id),
                    shifter_id: position.shifter_id,
                },
            )
            .await?;
            created.push(shift);
        }
    }

    tx.commit().await?;

    info!(date = %date, cycle = ?cycle, count = created.len(), "Shifts generated");

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn shift(start_at: DateTime<Utc>) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            start_at,
            end_at: start_at + Duration::hours(3),
            job_id: Uuid::new_v4(),
            formation_id: None,
            shifter_id: None,
            booker_id: None,
            booked_time: None,
            position_id: None,
            is_dismissed: false,
            dismissed_reason: None,
            was_carried_out: false,
            locked: false,
            created_at: start_at - Duration::days(7),
        }
    }

    fn membership() -> Membership {
        Membership {
            id: Uuid::new_v4(),
            member_number: 1,
            withdrawn: false,
            withdrawn_date: None,
            frozen: false,
            frozen_change: false,
            first_shift_date: None,
            main_beneficiary_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_end_of_yesterday_uses_local_midnight() {
        // 00:30 local on the 10th is still 23:30 UTC on the 9th
        let now = at("2025-03-09T23:30:00Z");
        assert_eq!(end_of_yesterday(now, &offset()), at("2025-03-09T22:59:59Z"));
    }

    #[test]
    fn test_attendance_window_bounds() {
        let now = at("2025-03-10T12:00:00Z");
        let offset = offset();
        let grace = Duration::minutes(ATTENDANCE_GRACE_MINUTES);
        let lead = Duration::minutes(ATTENDANCE_LEAD_MINUTES);

        assert!(in_attendance_window(now - grace, now, &offset));
        assert!(in_attendance_window(now + lead, now, &offset));
        assert!(in_attendance_window(now, now, &offset));
        assert!(!in_attendance_window(now - grace - Duration::seconds(1), now, &offset));
        assert!(!in_attendance_window(now + lead + Duration::seconds(1), now, &offset));
    }

    #[test]
    fn test_attendance_window_excludes_yesterday() {
        // 00:30 local, shift started at 23:00 local the day before
        let now = at("2025-03-09T23:30:00Z");
        let start = at("2025-03-09T22:00:00Z");
        assert!(!in_attendance_window(start, now, &offset()));
    }

    #[test]
    fn test_beginner_is_never_attending() {
        let now = at("2025-03-10T12:00:00Z");
        let attendance = Attendance {
            is_beginner: true,
            shift_starts: vec![now],
        };
        assert!(!attendance.is_attending(now, &offset()));

        let attendance = Attendance {
            is_beginner: false,
            ..attendance
        };
        assert!(attendance.is_attending(now, &offset()));
    }

    #[test]
    fn test_same_local_day() {
        let offset = offset();
        let now = at("2025-03-10T10:00:00Z");
        assert!(is_same_local_day(at("2025-03-09T23:10:00Z"), now, &offset));
        assert!(!is_same_local_day(at("2025-03-09T22:50:00Z"), now, &offset));
    }

    #[test]
    fn test_check_booking() {
        let now = at("2025-03-10T12:00:00Z");
        let mut free = shift(now + Duration::days(1));
        let membership = membership();

        assert_eq!(check_booking(&free, &membership, &[], now), Ok(()));

        let formation = Uuid::new_v4();
        free.formation_id = Some(formation);
        assert_eq!(
            check_booking(&free, &membership, &[], now),
            Err(BookingError::MissingFormation(formation))
        );
        assert_eq!(check_booking(&free, &membership, &[formation], now), Ok(()));

        let mut booked = shift(now + Duration::days(1));
        booked.shifter_id = Some(Uuid::new_v4());
        assert_eq!(
            check_booking(&booked, &membership, &[], now),
            Err(BookingError::AlreadyBooked)
        );

        let started = shift(now - Duration::minutes(5));
        assert_eq!(
            check_booking(&started, &membership, &[], now),
            Err(BookingError::AlreadyStarted)
        );
    }

    #[test]
    fn test_locked_shift_can_be_booked() {
        let now = at("2025-03-10T12:00:00Z");
        let mut locked = shift(now + Duration::days(1));
        locked.locked = true;

        assert_eq!(check_booking(&locked, &membership(), &[], now), Ok(()));
        assert!(matches!(
            check_reschedule(&locked, locked.start_at, locked.end_at),
            Err(ShiftError::Locked)
        ));
    }

    #[test]
    fn test_inactive_membership_cannot_book() {
        let now = at("2025-03-10T12:00:00Z");
        let free = shift(now + Duration::days(1));

        let mut frozen = membership();
        frozen.frozen = true;
        assert_eq!(
            check_booking(&free, &frozen, &[], now),
            Err(BookingError::MembershipInactive)
        );

        let mut withdrawn = membership();
        withdrawn.withdrawn = true;
        assert_eq!(
            check_booking(&free, &withdrawn, &[], now),
            Err(BookingError::MembershipInactive)
        );
    }

    #[test]
    fn test_started_shift_cannot_be_freed() {
        let now = at("2025-03-10T12:00:00Z");
        assert!(check_free(&shift(now + Duration::hours(1)), now).is_ok());
        assert!(matches!(check_free(&shift(now), now), Err(ShiftError::AlreadyStarted)));
    }

    #[test]
    fn test_reschedule_rejects_inverted_window() {
        let now = at("2025-03-10T12:00:00Z");
        let s = shift(now);
        assert!(matches!(
            check_reschedule(&s, now, now - Duration::hours(1)),
            Err(ShiftError::InvalidWindow)
        ));
    }
}
