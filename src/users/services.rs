use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::users::{
    dto::{UserCreate, UserRead, UserUpdate},
    error::{UniqueField, UserError, UserResult},
    password::hash_password,
    repo::UserRepository,
    repo_types::{NewUser, UserChanges},
};

/// User business rules on top of an injected repository.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, hash_cost: u32) -> Self {
        Self { repo, hash_cost }
    }

    /// Rejects a taken username before looking at the email, then hashes and
    /// stores. A constraint hit at insert time surfaces as the same conflict.
    pub async fn create_user(&self, data: UserCreate) -> UserResult<UserRead> {
        self.ensure_available(Some(&data.username), Some(&data.email), None)
            .await?;

        let password_hash = hash_password(data.password, self.hash_cost).await?;
        let user = self
            .repo
            .insert(NewUser {
                username: data.username,
                email: data.email,
                password_hash,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user.into())
    }

    pub async fn list_users(&self) -> UserResult<Vec<UserRead>> {
        let users = self.repo.list().await?;
        debug!(count = users.len(), "users listed");
        Ok(users.into_iter().map(UserRead::from).collect())
    }

    pub async fn get_user_by_id(&self, id: i64) -> UserResult<UserRead> {
        self.repo
            .find_by_id(id)
            .await?
            .map(UserRead::from)
            .ok_or(UserError::NotFound)
    }

    pub async fn get_user_by_username(&self, username: &str) -> UserResult<UserRead> {
        self.repo
            .find_by_username(username)
            .await?
            .map(UserRead::from)
            .ok_or(UserError::NotFound)
    }

    /// Applies the fields present in `data`. Changed unique fields are
    /// re-checked against other users; a new password is re-hashed.
    pub async fn update_user(&self, id: i64, data: UserUpdate) -> UserResult<UserRead> {
        let current = self.repo.find_by_id(id).await?.ok_or(UserError::NotFound)?;

        let username = data.username.filter(|u| *u != current.username);
        let email = data.email.filter(|e| *e != current.email);
        self.ensure_available(username.as_deref(), email.as_deref(), Some(id))
            .await?;

        let password_hash = match data.password {
            Some(p) => Some(hash_password(p, self.hash_cost).await?),
            None => None,
        };
        let changes = UserChanges {
            username,
            email,
            password_hash,
        };
        if changes.is_empty() {
            return Ok(current.into());
        }

        let user = self
            .repo
            .update(id, changes)
            .await?
            .ok_or(UserError::NotFound)?;
        info!(user_id = user.id, "user updated");
        Ok(user.into())
    }

    pub async fn delete_user(&self, id: i64) -> UserResult<()> {
        if !self.repo.delete(id).await? {
            return Err(UserError::NotFound);
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    async fn ensure_available(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        owner: Option<i64>,
    ) -> UserResult<()> {
        if let Some(username) = username {
            if let Some(u) = self.repo.find_by_username(username).await? {
                if Some(u.id) != owner {
                    warn!(%username, "username already registered");
                    return Err(UserError::Conflict(UniqueField::Username));
                }
            }
        }
        if let Some(email) = email {
            if let Some(u) = self.repo.find_by_email(email).await? {
                if Some(u.id) != owner {
                    warn!(%email, "email already registered");
                    return Err(UserError::Conflict(UniqueField::Email));
                }
            }
        }
        Ok(())
    }
}
