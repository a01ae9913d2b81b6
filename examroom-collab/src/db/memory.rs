use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{
    Database, DatabaseError, NewRoom, NewSession, NewUser, PrimaryKey, Result, RoomData,
    SessionData, UserData, UserRole,
};

/// An in-memory database implementation for examroom.
///
/// All tables live behind a single lock, so every check-then-insert is atomic
/// with respect to concurrent requests.
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<PrimaryKey, UserData>,
    sessions: HashMap<String, SessionRow>,
    rooms: HashMap<String, RoomData>,

    /// Doubles as the "has any user ever been created" counter
    last_user_id: PrimaryKey,
    last_session_id: PrimaryKey,
}

struct SessionRow {
    id: PrimaryKey,
    token: String,
    user_id: PrimaryKey,
    expires_at: DateTime<Utc>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    fn user_by_username(&self, username: &str) -> Option<&UserData> {
        self.users.values().find(|u| u.username == username)
    }

    fn user_by_email(&self, email: &str) -> Option<&UserData> {
        self.users.values().find(|u| u.email == email)
    }

    /// Joins a session row with its user, filtering out expired sessions
    fn live_session(&self, token: &str) -> Option<SessionData> {
        let row = self.sessions.get(token)?;

        if row.expires_at <= Utc::now() {
            return None;
        }

        let user = self.users.get(&row.user_id)?;

        Some(SessionData {
            id: row.id,
            token: row.token.clone(),
            expires_at: row.expires_at,
            user: user.clone(),
        })
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut tables = self.tables.lock();

        if tables.user_by_username(&new_user.username).is_some() {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "username",
                value: new_user.username,
            });
        }

        if tables.user_by_email(&new_user.email).is_some() {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "email",
                value: new_user.email,
            });
        }

        let role = if tables.last_user_id == 0 {
            UserRole::Admin
        } else {
            UserRole::Candidate
        };

        tables.last_user_id += 1;

        let user = UserData {
            id: tables.last_user_id,
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
            role,
            created_at: Utc::now(),
        };

        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.tables
            .lock()
            .users
            .get(&user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.tables
            .lock()
            .user_by_username(username)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "username",
            })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        let mut tables = self.tables.lock();

        if tables.sessions.contains_key(&new_session.token) {
            return Err(DatabaseError::Conflict {
                resource: "session",
                field: "token",
                value: new_session.token,
            });
        }

        let user = tables
            .users
            .get(&new_session.user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })?;

        tables.last_session_id += 1;

        let row = SessionRow {
            id: tables.last_session_id,
            token: new_session.token.clone(),
            user_id: new_session.user_id,
            expires_at: new_session.expires_at,
        };

        let session = SessionData {
            id: row.id,
            token: row.token.clone(),
            expires_at: row.expires_at,
            user,
        };

        tables.sessions.insert(new_session.token, row);

        Ok(session)
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        self.tables
            .lock()
            .live_session(token)
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        self.tables
            .lock()
            .sessions
            .remove(token)
            .map(|_| ())
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();

        self.tables
            .lock()
            .sessions
            .retain(|_, row| row.expires_at > now);

        Ok(())
    }

    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData> {
        let mut tables = self.tables.lock();

        if tables.rooms.contains_key(&new_room.id) {
            return Err(DatabaseError::Conflict {
                resource: "room",
                field: "id",
                value: new_room.id,
            });
        }

        // Ensure the creator exists
        if !tables.users.contains_key(&new_room.user_id) {
            return Err(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            });
        }

        let room = RoomData {
            id: new_room.id.clone(),
            name: new_room.name,
            participant_limit: new_room.participant_limit,
            creator_id: new_room.user_id,
            created_at: Utc::now(),
        };

        tables.rooms.insert(new_room.id, room.clone());

        Ok(room)
    }

    async fn room_by_id(&self, room_id: &str) -> Result<RoomData> {
        self.tables
            .lock()
            .rooms
            .get(room_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })
    }

    async fn list_rooms(&self) -> Result<Vec<RoomData>> {
        let mut rooms: Vec<_> = self.tables.lock().rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(rooms)
    }

    async fn delete_room(&self, room_id: &str) -> Result<()> {
        self.tables
            .lock()
            .rooms
            .remove(room_id)
            .map(|_| ())
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "hashed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_user_is_admin() {
        let db = MemoryDatabase::new();

        let first = db.create_user(new_user("alice", "alice@x.com")).await.unwrap();
        let second = db.create_user(new_user("bob", "bob@x.com")).await.unwrap();
        let third = db.create_user(new_user("carol", "carol@x.com")).await.unwrap();

        assert_eq!(first.role, UserRole::Admin);
        assert_eq!(second.role, UserRole::Candidate);
        assert_eq!(third.role, UserRole::Candidate);
    }

    #[tokio::test]
    async fn test_username_conflict_is_checked_before_email() {
        let db = MemoryDatabase::new();

        db.create_user(new_user("alice", "alice@x.com")).await.unwrap();

        // Both fields collide, the username must win
        let err = db
            .create_user(new_user("alice", "alice@x.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DatabaseError::Conflict {
                field: "username",
                ..
            }
        ));

        let err = db
            .create_user(new_user("bob", "alice@x.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DatabaseError::Conflict { field: "email", .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_racing_registrations_with_the_same_username_yield_one_user() {
        let db = Arc::new(MemoryDatabase::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let db = db.clone();

                tokio::spawn(async move {
                    db.create_user(new_user("alice", &format!("alice{}@x.com", i)))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_racing_first_registrations_produce_one_admin() {
        let db = Arc::new(MemoryDatabase::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let db = db.clone();

                tokio::spawn(async move {
                    db.create_user(new_user(
                        &format!("user{}", i),
                        &format!("user{}@x.com", i),
                    ))
                    .await
                })
            })
            .collect();

        let mut admins = 0;
        for handle in handles {
            let user = handle.await.unwrap().unwrap();

            if user.role == UserRole::Admin {
                admins += 1;
            }
        }

        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn test_expired_sessions_do_not_validate() {
        let db = MemoryDatabase::new();

        let user = db.create_user(new_user("alice", "alice@x.com")).await.unwrap();

        db.create_session(NewSession {
            token: "stale".to_string(),
            user_id: user.id,
            expires_at: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();

        let err = db.session_by_token("stale").await.unwrap_err();

        // Indistinguishable from a missing session
        assert!(matches!(
            err,
            DatabaseError::NotFound {
                resource: "session",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_clear_expired_sessions_keeps_live_ones() {
        let db = MemoryDatabase::new();

        let user = db.create_user(new_user("alice", "alice@x.com")).await.unwrap();

        db.create_session(NewSession {
            token: "stale".to_string(),
            user_id: user.id,
            expires_at: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();

        db.create_session(NewSession {
            token: "live".to_string(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

        db.clear_expired_sessions().await.unwrap();

        assert!(db.session_by_token("live").await.is_ok());
        assert!(db.delete_session_by_token("stale").await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_a_session_twice_fails() {
        let db = MemoryDatabase::new();

        let user = db.create_user(new_user("alice", "alice@x.com")).await.unwrap();

        db.create_session(NewSession {
            token: "token".to_string(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

        db.delete_session_by_token("token").await.unwrap();

        let err = db.delete_session_by_token("token").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_room_lifecycle() {
        let db = MemoryDatabase::new();

        let user = db.create_user(new_user("alice", "alice@x.com")).await.unwrap();

        let room = db
            .create_room(NewRoom {
                id: "room-1".to_string(),
                name: "Morning exam".to_string(),
                participant_limit: 10,
                user_id: user.id,
            })
            .await
            .unwrap();

        assert_eq!(room.creator_id, user.id);
        assert_eq!(db.list_rooms().await.unwrap().len(), 1);

        db.delete_room("room-1").await.unwrap();

        assert!(db.room_by_id("room-1").await.is_err());
        assert!(db.delete_room("room-1").await.is_err());
    }
}
