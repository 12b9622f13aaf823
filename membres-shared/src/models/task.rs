/// Tasks: to-do items followed by commissions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, title, description, registrar_id, commission_id, due_date, \
     status, priority, closed, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub registrar_id: Option<Uuid>,
    pub commission_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,

    /// Higher is more urgent
    pub priority: i16,

    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub registrar_id: Option<Uuid>,
    pub commission_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: i16,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.closed && self.due_date.is_some_and(|due| due < today)
    }

    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, registrar_id, commission_id, due_date, priority)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.registrar_id)
        .bind(data.commission_id)
        .bind(data.due_date)
        .bind(data.priority)
        .fetch_one(pool)
        .await
    }

    /// Open tasks, most urgent first
    pub async fn list_open(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE NOT closed
            ORDER BY priority DESC, due_date ASC NULLS LAST
            "#
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn close(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET closed = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let mut task = Task {
            id: Uuid::new_v4(),
            title: "Inventaire".to_string(),
            description: None,
            registrar_id: None,
            commission_id: None,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 9),
            status: None,
            priority: 0,
            closed: false,
            created_at: Utc::now(),
        };

        assert!(task.is_overdue(today));
        task.closed = true;
        assert!(!task.is_overdue(today));
        task.closed = false;
        task.due_date = None;
        assert!(!task.is_overdue(today));
    }
}
