use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::users::{
    error::{UniqueField, UserError, UserResult},
    repo_types::{NewUser, User, UserChanges},
};

/// Storage contract for users. Implementations enforce username and email
/// uniqueness and report violations as [`UserError::Conflict`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> UserResult<User>;
    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> UserResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;
    /// All users, ascending by id.
    async fn list(&self) -> UserResult<Vec<User>>;
    /// Returns `None` when no row has `id`.
    async fn update(&self, id: i64, changes: UserChanges) -> UserResult<Option<User>>;
    /// Returns `false` when no row has `id`.
    async fn delete(&self, id: i64) -> UserResult<bool>;
}

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates the users table when it does not exist yet.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id            BIGSERIAL PRIMARY KEY,
                username      VARCHAR(50) NOT NULL,
                email         TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT users_username_key UNIQUE (username),
                CONSTRAINT users_email_key UNIQUE (email)
            )
            "#,
        )
        .execute(&self.db)
        .await?;
        info!("users table ready");
        Ok(())
    }
}

/// Unique column guarded by the named constraint.
fn conflict_field(constraint: Option<&str>) -> Option<UniqueField> {
    match constraint {
        Some(USERNAME_CONSTRAINT) => Some(UniqueField::Username),
        Some(EMAIL_CONSTRAINT) => Some(UniqueField::Email),
        _ => None,
    }
}

fn map_write_error(e: sqlx::Error) -> UserError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(field) = conflict_field(db_err.constraint()) {
                return UserError::Conflict(field);
            }
        }
    }
    e.into()
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> UserResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username      = COALESCE($2, username),
                   email         = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash)
             WHERE id = $1
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(
            conflict_field(Some("users_username_key")),
            Some(UniqueField::Username)
        );
        assert_eq!(
            conflict_field(Some("users_email_key")),
            Some(UniqueField::Email)
        );
    }

    #[test]
    fn unknown_constraint_is_not_a_conflict() {
        assert_eq!(conflict_field(Some("users_pkey")), None);
        assert_eq!(conflict_field(None), None);
    }

    #[test]
    fn non_database_errors_are_internal() {
        assert!(matches!(
            map_write_error(sqlx::Error::RowNotFound),
            UserError::Internal(_)
        ));
    }
}
