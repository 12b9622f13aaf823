/// Periods and period positions: the weekly planning template
///
/// A period is a recurring slot ("Tuesday 09:00–12:00, shelving"). Each
/// period has positions, one per person needed, tagged with the week of the
/// four-week cycle (A–D) they apply to. A position may be held by a fixed
/// shifter, in which case generated shifts are pre-booked for them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE week_cycle AS ENUM ('A', 'B', 'C', 'D');
///
/// CREATE TABLE periods (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     day_of_week SMALLINT NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
///     start_time TIME NOT NULL,
///     end_time TIME NOT NULL CHECK (end_time > start_time),
///     job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE
/// );
///
/// CREATE TABLE period_positions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     period_id UUID NOT NULL REFERENCES periods(id) ON DELETE CASCADE,
///     formation_id UUID REFERENCES formations(id) ON DELETE SET NULL,
///     week_cycle week_cycle NOT NULL,
///     shifter_id UUID REFERENCES beneficiaries(id) ON DELETE SET NULL,
///     booker_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     booked_time TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Week of the four-week shift cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "week_cycle")]
pub enum WeekCycle {
    A,
    B,
    C,
    D,
}

impl WeekCycle {
    pub const ALL: [WeekCycle; 4] = [WeekCycle::A, WeekCycle::B, WeekCycle::C, WeekCycle::D];

    /// Cycle week of `date`, counting from the Monday-based week of
    /// `cycle_start` which is week A
    pub fn for_date(date: NaiveDate, cycle_start: NaiveDate) -> Self {
        let monday = |d: NaiveDate| d - chrono::Duration::days(d.weekday().num_days_from_monday() as i64);
        let weeks = (monday(date) - monday(cycle_start)).num_days().div_euclid(7);
        Self::ALL[weeks.rem_euclid(4) as usize]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Period {
    pub id: Uuid,

    /// 0 = Monday ... 6 = Sunday
    pub day_of_week: i16,

    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePeriod {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub job_id: Uuid,
}

impl Period {
    /// Start and end of this period on `date` in the association's time zone,
    /// None when `date` is another weekday
    pub fn occurrence_on(
        &self,
        date: NaiveDate,
        offset: &FixedOffset,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if date.weekday().num_days_from_monday() as i16 != self.day_of_week {
            return None;
        }

        let start = offset
            .from_local_datetime(&date.and_time(self.start_time))
            .single()?;
        let end = offset
            .from_local_datetime(&date.and_time(self.end_time))
            .single()?;

        Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
    }

    pub async fn create(pool: &PgPool, data: CreatePeriod) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Period>(
            r#"
            INSERT INTO periods (day_of_week, start_time, end_time, job_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, day_of_week, start_time, end_time, job_id
            "#,
        )
        .bind(data.day_of_week)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.job_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Period>(
            "SELECT id, day_of_week, start_time, end_time, job_id FROM periods WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Periods of one weekday whose job is enabled
    pub async fn list_by_day(pool: &PgPool, day_of_week: i16) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Period>(
            r#"
            SELECT p.id, p.day_of_week, p.start_time, p.end_time, p.job_id
            FROM periods p
            JOIN jobs j ON j.id = p.job_id
            WHERE p.day_of_week = $1 AND j.enabled
            ORDER BY p.start_time
            "#,
        )
        .bind(day_of_week)
        .fetch_all(pool)
        .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PeriodPosition {
    pub id: Uuid,
    pub period_id: Uuid,
    pub formation_id: Option<Uuid>,
    pub week_cycle: WeekCycle,

    /// Fixed shifter holding this position
    pub shifter_id: Option<Uuid>,
    pub booker_id: Option<Uuid>,
    pub booked_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePeriodPosition {
    pub period_id: Uuid,
    pub formation_id: Option<Uuid>,
    pub week_cycle: WeekCycle,
}

const POSITION_COLUMNS: &str =
    "id, period_id, formation_id, week_cycle, shifter_id, booker_id, booked_time";

impl PeriodPosition {
    pub async fn create(pool: &PgPool, data: CreatePeriodPosition) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PeriodPosition>(&format!(
            r#"
            INSERT INTO period_positions (period_id, formation_id, week_cycle)
            VALUES ($1, $2, $3)
            RETURNING {POSITION_COLUMNS}
            "#
        ))
        .bind(data.period_id)
        .bind(data.formation_id)
        .bind(data.week_cycle)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_period(pool: &PgPool, period_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PeriodPosition>(&format!(
            "SELECT {POSITION_COLUMNS} FROM period_positions WHERE period_id = $1 ORDER BY week_cycle"
        ))
        .bind(period_id)
        .fetch_all(pool)
        .await
    }

    /// Assigns a fixed shifter to a free position
    pub async fn book(
        pool: &PgPool,
        id: Uuid,
        shifter_id: Uuid,
        booker_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PeriodPosition>(&format!(
            r#"
            UPDATE period_positions
            SET shifter_id = $2, booker_id = $3, booked_time = NOW()
            WHERE id = $1 AND shifter_id IS NULL
            RETURNING {POSITION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(shifter_id)
        .bind(booker_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn free(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PeriodPosition>(&format!(
            r#"
            UPDATE period_positions
            SET shifter_id = NULL, booker_id = NULL, booked_time = NULL
            WHERE id = $1
            RETURNING {POSITION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_cycle_rotation() {
        // 2025-01-06 is a Monday
        let start = date(2025, 1, 6);
        assert_eq!(WeekCycle::for_date(date(2025, 1, 6), start), WeekCycle::A);
        assert_eq!(WeekCycle::for_date(date(2025, 1, 12), start), WeekCycle::A);
        assert_eq!(WeekCycle::for_date(date(2025, 1, 13), start), WeekCycle::B);
        assert_eq!(WeekCycle::for_date(date(2025, 1, 27), start), WeekCycle::D);
        assert_eq!(WeekCycle::for_date(date(2025, 2, 3), start), WeekCycle::A);
        // Dates before the cycle start wrap around
        assert_eq!(WeekCycle::for_date(date(2024, 12, 30), start), WeekCycle::D);
    }

    #[test]
    fn test_period_occurrence() {
        let period = Period {
            id: Uuid::new_v4(),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            job_id: Uuid::new_v4(),
        };
        let paris_winter = FixedOffset::east_opt(3600).unwrap();

        // 2025-01-07 is a Tuesday
        let (start, end) = period.occurrence_on(date(2025, 1, 7), &paris_winter).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 7, 8, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 7, 11, 0, 0).unwrap());

        assert!(period.occurrence_on(date(2025, 1, 8), &paris_winter).is_none());
    }
}
