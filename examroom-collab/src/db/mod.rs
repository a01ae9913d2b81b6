use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Represents a type that can store and fetch examroom data
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Inserts a new user, assigning its role.
    ///
    /// The username conflict check happens before the email conflict check,
    /// and both are atomic with the insertion and the first-user decision.
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_username(&self, username: &str) -> Result<UserData>;

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    /// Returns the session for a token.
    ///
    /// An expired session is reported the same way as a missing one.
    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData>;
    async fn room_by_id(&self, room_id: &str) -> Result<RoomData>;
    async fn list_rooms(&self) -> Result<Vec<RoomData>>;
    async fn delete_room(&self, room_id: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// The already hashed password
    pub password: String,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewRoom {
    pub id: String,
    pub name: String,
    pub participant_limit: u32,
    /// The creator of the new room
    pub user_id: PrimaryKey,
}
