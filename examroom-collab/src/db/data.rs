use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// Access level of an account.
///
/// The first account ever created is an admin, every account after that is a
/// candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Candidate,
}

impl UserRole {
    /// Returns true if this role covers the access level of `required`
    pub fn grants(&self, required: UserRole) -> bool {
        match required {
            UserRole::Admin => matches!(self, UserRole::Admin),
            UserRole::Candidate => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Candidate => "candidate",
        }
    }
}

/// An examroom account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    pub email: String,
    /// The argon2 PHC string, never exposed over the wire
    pub password: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in
    pub user: UserData,
}

/// A room that candidates are gathered in
#[derive(Debug, Clone)]
pub struct RoomData {
    pub id: String,
    pub name: String,
    pub participant_limit: u32,
    /// The admin that created the room
    pub creator_id: PrimaryKey,
    pub created_at: DateTime<Utc>,
}
