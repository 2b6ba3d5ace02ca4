//! User directory service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateUser, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user, rejecting duplicate emails
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        let user = user.trimmed();
        user.validate()?;

        if self.repository.users.email_exists(&user.email, None).await? {
            return Err(AppError::Conflict(format!(
                "A user with email {} already exists",
                user.email
            )));
        }

        let created = self.repository.users.create(&user).await?;
        tracing::info!("Created user with id: {}", created.id);
        Ok(created)
    }

    /// Update a user; the new email must not belong to another user
    pub async fn update_user(&self, id: i64, user: UpdateUser) -> AppResult<User> {
        let user = user.trimmed();
        user.validate()?;

        // Verify user exists
        self.repository.users.get_by_id(id).await?;

        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "A user with email {} already exists",
                    email
                )));
            }
        }

        let updated = self.repository.users.update(id, &user).await?;
        tracing::info!("Updated user with id: {}", updated.id);
        Ok(updated)
    }

    /// Delete a user that has no reservations on record.
    ///
    /// The user row stays locked until commit, so a reservation being created
    /// for the same user either finishes first and is seen here, or waits.
    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;

        self.repository.users.lock_for_delete(&mut tx, id).await?;

        if self.repository.users.has_reservations(&mut tx, id).await? {
            return Err(AppError::Conflict(format!(
                "User {} has reservations and cannot be deleted",
                id
            )));
        }

        self.repository.users.delete(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!("Deleted user with id: {}", id);
        Ok(())
    }
}
