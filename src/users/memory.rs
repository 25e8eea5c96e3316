use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::users::{
    error::{UniqueField, UserError, UserResult},
    repo::UserRepository,
    repo_types::{NewUser, User, UserChanges},
};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Table {
    /// First unique column the values would collide with, ignoring row `skip`.
    /// Username is checked before email.
    fn collision(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        skip: Option<i64>,
    ) -> Option<UniqueField> {
        let taken = |pred: &dyn Fn(&User) -> bool| {
            self.rows
                .values()
                .any(|u| Some(u.id) != skip && pred(u))
        };
        if let Some(name) = username {
            if taken(&|u| u.username == name) {
                return Some(UniqueField::Username);
            }
        }
        if let Some(email) = email {
            if taken(&|u| u.email == email) {
                return Some(UniqueField::Email);
            }
        }
        None
    }
}

/// Process-local repository. Ids start at 1 and are never reused.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> UserResult<User> {
        let mut table = self.table.write().await;
        if let Some(field) = table.collision(Some(&user.username), Some(&user.email), None) {
            return Err(UserError::Conflict(field));
        }
        table.last_id += 1;
        let row = User {
            id: table.last_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> UserResult<Option<User>> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(field) =
            table.collision(changes.username.as_deref(), changes.email.as_deref(), Some(id))
        {
            return Err(UserError::Conflict(field));
        }
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            row.username = username;
        }
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(hash) = changes.password_hash {
            row.password_hash = hash;
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
