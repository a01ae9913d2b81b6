//! All schemas that are exposed from endpoints are defined here
//! along with the [ToSerialized] impls

use examroom_collab::{RoomData, SessionData, UserData};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    id: i32,
    username: String,
    email: String,
    role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResult {
    pub success: bool,
    pub user: User,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    id: i32,
    expires_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResult {
    user: User,
    session: SessionInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    id: String,
    name: String,
    participant_limit: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomResult {
    pub success: bool,
    pub room: Room,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListResult {
    pub rooms: Vec<Room>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResult {
    pub success: bool,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.as_str().to_string(),
        }
    }
}

impl ToSerialized<SessionResult> for SessionData {
    fn to_serialized(&self) -> SessionResult {
        SessionResult {
            user: self.user.to_serialized(),
            session: SessionInfo {
                id: self.id,
                expires_at: self.expires_at.to_rfc3339(),
            },
        }
    }
}

impl ToSerialized<Room> for RoomData {
    fn to_serialized(&self) -> Room {
        Room {
            id: self.id.clone(),
            name: self.name.clone(),
            participant_limit: self.participant_limit,
        }
    }
}
