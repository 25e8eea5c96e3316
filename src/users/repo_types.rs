use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,                    // storage-assigned, ascending
    pub username: String,           // unique, case-sensitive
    pub email: String,              // unique
    pub password_hash: String,      // bcrypt, never serialized
    pub created_at: OffsetDateTime, // set once on insert
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Column changes for an update. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}
