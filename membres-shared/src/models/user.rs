/// User accounts
///
/// A user is the login identity; personal data lives on the linked
/// beneficiary (at most one per user, enforced by a unique key on
/// `beneficiaries.user_id`). Staff accounts created by fixtures or by hand may
/// have no beneficiary at all.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(180) NOT NULL UNIQUE,
///     email VARCHAR(180) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     roles TEXT[] NOT NULL DEFAULT '{}',
///     enabled BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use membres_shared::auth::roles::Role;
/// use membres_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     username: "JeanDupont".to_string(),
///     email: "jean.dupont@example.org".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     roles: vec![Role::User],
/// }).await?;
///
/// User::add_role(&pool, user.id, Role::Admin).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::auth::roles::{self, Role};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, roles, enabled, created_at, updated_at, last_login_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Login name, unique
    pub username: String,

    /// Contact address, unique
    pub email: String,

    /// Argon2id PHC hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Raw `ROLE_*` strings as stored
    pub roles: Vec<String>,

    /// Disabled accounts cannot authenticate
    pub enabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,

    pub roles: Vec<Role>,
}

impl User {
    /// Parsed roles; unknown strings are skipped
    pub fn roles(&self) -> Vec<Role> {
        roles::parse_roles(&self.roles)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    /// Inserts a user
    ///
    /// Accepts any executor so that it can run inside the transaction that
    /// also creates the linked beneficiary.
    ///
    /// # Errors
    ///
    /// Unique violations on `users_username_key` / `users_email_key`.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let roles: Vec<String> = data.roles.iter().map(|r| r.as_str().to_string()).collect();

        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, roles)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(roles)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by username or e-mail, as typed on the login form
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<Self>, sqlx::Error> {
        if login.contains('@') {
            Self::find_by_email(pool, login).await
        } else {
            Self::find_by_username(pool, login).await
        }
    }

    /// Usernames beginning with `prefix`, used to de-duplicate generated names
    pub async fn usernames_starting_with<'e, E>(
        executor: E,
        prefix: &str,
    ) -> Result<Vec<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT username FROM users WHERE username LIKE $1 ORDER BY username")
            .bind(format!("{}%", escape_like(prefix)))
            .fetch_all(executor)
            .await
    }

    /// Grants a role; granting a role twice is a no-op
    pub async fn add_role(pool: &PgPool, id: Uuid, role: Role) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET roles = CASE WHEN $2 = ANY(roles) THEN roles ELSE array_append(roles, $2) END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(pool)
        .await
    }

    pub async fn remove_role(
        pool: &PgPool,
        id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET roles = array_remove(roles, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(pool)
        .await
    }

    /// Replaces the password hash
    pub async fn set_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_enabled(pool: &PgPool, id: Uuid, enabled: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET enabled = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Users holding a role, by username
    pub async fn list_by_role(pool: &PgPool, role: Role) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE $1 = ANY(roles) ORDER BY username"
        ))
        .bind(role.as_str())
        .fetch_all(pool)
        .await
    }
}

/// Escapes LIKE wildcards so that user input matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(roles: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            username: "JeanDupont".to_string(),
            email: "jean@example.org".to_string(),
            password_hash: "hash".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_roles_parsing() {
        let user = user_with_roles(&["ROLE_USER", "ROLE_PASSWORD_TO_SET", "ROLE_OLD"]);
        assert_eq!(user.roles(), vec![Role::User, Role::PasswordToSet]);
        assert!(user.has_role(Role::PasswordToSet));
        assert!(!user.has_role(Role::Admin));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user_with_roles(&[])).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("JeanDupont"), "JeanDupont");
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
    }
}
