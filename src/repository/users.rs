//! Users repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateUser, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Load a user and keep it from being deleted until the transaction ends
    pub async fn lock_shared(&self, conn: &mut PgConnection, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Load a user with an exclusive row lock, blocking new reservations for it
    pub async fn lock_for_delete(&self, conn: &mut PgConnection, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// List all users
    pub async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id != $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Create a new user
    pub async fn create(&self, user: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, phone, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_duplicate_email(e, &user.email))
    }

    /// Update an existing user
    pub async fn update(&self, id: i64, user: &UpdateUser) -> AppResult<User> {
        let email = user.email.as_deref();

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(email)
        .bind(&user.phone)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_duplicate_email(e, email.unwrap_or_default()))?
        .ok_or_else(|| not_found(id))
    }

    /// Delete a user
    pub async fn delete(&self, conn: &mut PgConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Whether any reservation (open or closed) references the user
    pub async fn has_reservations(&self, conn: &mut PgConnection, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = $1)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(exists)
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User with id {} not found", id))
}

/// The unique index on LOWER(email) catches writes that raced past `email_exists`.
fn map_duplicate_email(error: sqlx::Error, email: &str) -> AppError {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("A user with email {} already exists", email))
        }
        other => AppError::Database(other),
    }
}
