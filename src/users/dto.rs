use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::{Validate, ValidationErrors};

use crate::users::repo_types::User;

/// Request body for user creation.
#[derive(Debug, Deserialize, Validate)]
pub struct UserCreate {
    #[validate(length(min = 3, max = 50, message = "username must have 3 to 50 characters"))]
    pub username: String,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must have at least 8 characters"))]
    pub password: String,
}

/// Request body for a partial update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 3, max = 50, message = "username must have 3 to 50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "password must have at least 8 characters"))]
    pub password: Option<String>,
}

/// Public view of a user. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRead {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserRead {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

/// One rule violation on one request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl FieldError {
    pub(crate) fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            code: code.to_string(),
        }
    }
}

/// Flattens validator output into one entry per violation, ordered by field.
pub(crate) fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                FieldError::new(field, &err.code, message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, email: &str, password: &str) -> UserCreate {
        UserCreate {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn failing_fields(input: &UserCreate) -> Vec<String> {
        match input.validate() {
            Ok(()) => vec![],
            Err(e) => field_errors(&e).into_iter().map(|f| f.field).collect(),
        }
    }

    #[test]
    fn accepts_valid_create() {
        assert!(create("testuser", "test@example.com", "securepass123")
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_short_username() {
        let errs = create("ab", "test@example.com", "securepass123")
            .validate()
            .unwrap_err();
        let errs = field_errors(&errs);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "username");
        assert_eq!(errs[0].code, "length");
        assert_eq!(errs[0].message, "username must have 3 to 50 characters");
    }

    #[test]
    fn rejects_long_username() {
        let long = "a".repeat(51);
        assert_eq!(
            failing_fields(&create(&long, "test@example.com", "securepass123")),
            vec!["username"]
        );
    }

    #[test]
    fn rejects_short_password_and_bad_email_together() {
        assert_eq!(
            failing_fields(&create("testuser", "notanemail", "short")),
            vec!["email", "password"]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // three two-byte characters
        assert!(create("äöü", "test@example.com", "securepass123")
            .validate()
            .is_ok());
    }

    #[test]
    fn email_syntax() {
        for ok in ["a@b.co", "test@example.com", "first.last+tag@sub.example.org"] {
            assert!(failing_fields(&create("testuser", ok, "securepass123")).is_empty(), "{ok}");
        }
        for bad in ["notanemail", "a b@c.de", "foo@bar.com.", "a@b..c", "@example.com"] {
            assert_eq!(
                failing_fields(&create("testuser", bad, "securepass123")),
                vec!["email"],
                "{bad}"
            );
        }
    }

    #[test]
    fn update_checks_only_present_fields() {
        assert!(UserUpdate::default().validate().is_ok());
        let upd = UserUpdate {
            password: Some("short".into()),
            ..Default::default()
        };
        let errs = field_errors(&upd.validate().unwrap_err());
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "password");
    }

    #[test]
    fn read_never_serializes_credentials() {
        let read = UserRead {
            id: 1,
            username: "testuser".into(),
            email: "test@example.com".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&read).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("password_hash"));
        assert_eq!(obj["created_at"], "1970-01-01T00:00:00Z");
    }
}
