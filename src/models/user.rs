use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProfileId, UserId};

/// Role attached to every account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Superuser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Superuser => "superuser",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Role::User => 0,
            Role::Moderator => 1,
            Role::Superuser => 2,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "superuser" => Ok(Role::Superuser),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub phone_number: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    #[serde(skip)]
    pub password_hash: String,
}

impl User {
    /// Capability check: a superuser can do what a moderator can, and so on down.
    pub fn has_role(&self, role: Role) -> bool {
        self.is_active && self.role.rank() >= role.rank()
    }
}

/// Account fields gathered at registration, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub phone_number: String,
    pub full_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub bio: String,
    pub website: String,
}
