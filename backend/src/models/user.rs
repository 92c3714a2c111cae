//! Models that represent users, authentication payloads, and role metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use validator::Validate;

use crate::types::{TeamId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
/// Database representation of a user account.
pub struct User {
    pub id: UserId,
    /// Unique login identifier.
    pub email: String,
    /// Argon2 hash of the user's password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    /// Team the user belongs to; managers approve requests of their team.
    pub team_id: TeamId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Supported user roles stored in the database.
pub enum UserRole {
    /// Submits and cancels their own leave.
    #[default]
    Employee,
    /// Reviews pending leave of their team.
    Manager,
    /// Manager rights plus account administration.
    Admin,
}

impl UserRole {
    /// Returns the canonical snake_case representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Employee => "employee",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }

    /// Whether the role may approve or reject leave requests.
    pub fn can_review_leave(&self) -> bool {
        matches!(self, UserRole::Manager | UserRole::Admin)
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "employee" | "EMPLOYEE" => Some(UserRole::Employee),
            "manager" | "MANAGER" => Some(UserRole::Manager),
            "admin" | "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserRole::parse(&value).ok_or_else(|| format!("unknown user role: {}", value))
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UserRole::parse(&s).ok_or_else(|| {
            serde::de::Error::unknown_variant(&s, &["employee", "manager", "admin"])
        })
    }
}

/// Identity resolved by the auth middleware and handed to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: UserRole,
    pub team_id: TeamId,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        AuthUser {
            user_id: user.id,
            role: user.role,
            team_id: user.team_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
/// Payload for creating a new user account.
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    pub team_id: TeamId,
}

#[derive(Debug, Serialize, Deserialize)]
/// Token returned after a successful login.
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub team_id: TeamId,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            team_id: user.team_id,
        }
    }
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        name: String,
        role: UserRole,
        team_id: TeamId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email,
            password_hash,
            name,
            role,
            team_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn user_role_serde_accepts_and_emits_snake_case() {
        let m: UserRole = serde_json::from_str("\"manager\"").unwrap();
        let a: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(m, UserRole::Manager);
        assert_eq!(a, UserRole::Admin);
        assert!(serde_json::from_str::<UserRole>("\"owner\"").is_err());

        let sm = serde_json::to_value(UserRole::Manager).unwrap();
        assert_eq!(sm, Value::String("manager".into()));
    }

    #[test]
    fn only_managers_and_admins_review_leave() {
        assert!(!UserRole::Employee.can_review_leave());
        assert!(UserRole::Manager.can_review_leave());
        assert!(UserRole::Admin.can_review_leave());
    }

    #[test]
    fn user_json_never_contains_password_hash() {
        let user = User::new(
            "alice@example.com".into(),
            "hash".into(),
            "Alice".into(),
            UserRole::Employee,
            TeamId::new(),
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        let resp: UserResponse = user.into();
        assert_eq!(resp.role, UserRole::Employee);
    }

    #[test]
    fn register_request_validates_fields() {
        let bad = RegisterRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            name: String::new(),
            role: UserRole::Employee,
            team_id: TeamId::new(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("name"));
    }
}
