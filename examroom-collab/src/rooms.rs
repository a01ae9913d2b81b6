use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::{util::random_string, Database, DatabaseError, NewRoom, PrimaryKey, RoomData};

/// Manages the rooms of an examroom instance
pub struct RoomManager<Db> {
    db: Arc<Db>,
    /// Upper bound for a room's participant limit
    max_participant_limit: u32,
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Participant limit must be between 1 and {max}")]
    ParticipantLimitOutOfRange { max: u32 },
    #[error(transparent)]
    Db(DatabaseError),
}

#[derive(Debug)]
pub struct NewPlainRoom {
    pub name: String,
    pub participant_limit: u32,
    /// The creator of the new room
    pub user_id: PrimaryKey,
}

impl<Db> RoomManager<Db>
where
    Db: Database,
{
    const ROOM_ID_LENGTH: usize = 21;

    pub fn new(db: &Arc<Db>, max_participant_limit: u32) -> Self {
        Self {
            db: db.clone(),
            max_participant_limit,
        }
    }

    /// Creates a new room with an opaque id
    pub async fn create_room(&self, new_room: NewPlainRoom) -> Result<RoomData, RoomError> {
        if new_room.participant_limit < 1 || new_room.participant_limit > self.max_participant_limit
        {
            return Err(RoomError::ParticipantLimitOutOfRange {
                max: self.max_participant_limit,
            });
        }

        let room = self
            .db
            .create_room(NewRoom {
                id: random_string(Self::ROOM_ID_LENGTH),
                name: new_room.name,
                participant_limit: new_room.participant_limit,
                user_id: new_room.user_id,
            })
            .await
            .map_err(RoomError::Db)?;

        info!("Room \"{}\" was created", room.name);

        Ok(room)
    }

    pub async fn room_by_id(&self, room_id: &str) -> Result<RoomData, DatabaseError> {
        self.db.room_by_id(room_id).await
    }

    /// Get all rooms
    pub async fn list_all(&self) -> Result<Vec<RoomData>, DatabaseError> {
        self.db.list_rooms().await
    }

    /// Deletes a room by id, if it exists
    pub async fn delete_room(&self, room_id: &str) -> Result<(), DatabaseError> {
        self.db.delete_room(room_id).await?;

        info!("Room {} was deleted", room_id);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{MemoryDatabase, NewUser};

    use super::*;

    async fn manager_with_user() -> (RoomManager<MemoryDatabase>, PrimaryKey) {
        let db = Arc::new(MemoryDatabase::new());

        let user = db
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password: "hashed".to_string(),
            })
            .await
            .unwrap();

        (RoomManager::new(&db, 50), user.id)
    }

    #[tokio::test]
    async fn test_create_room_echoes_its_input() {
        let (manager, user_id) = manager_with_user().await;

        let room = manager
            .create_room(NewPlainRoom {
                name: "Morning exam".to_string(),
                participant_limit: 25,
                user_id,
            })
            .await
            .unwrap();

        assert_eq!(room.name, "Morning exam");
        assert_eq!(room.participant_limit, 25);
        assert_eq!(room.creator_id, user_id);
        assert_eq!(room.id.len(), 21);
    }

    #[tokio::test]
    async fn test_participant_limit_is_bounded() {
        let (manager, user_id) = manager_with_user().await;

        let too_small = manager
            .create_room(NewPlainRoom {
                name: "Exam".to_string(),
                participant_limit: 0,
                user_id,
            })
            .await
            .unwrap_err();

        let too_large = manager
            .create_room(NewPlainRoom {
                name: "Exam".to_string(),
                participant_limit: 51,
                user_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            too_small,
            RoomError::ParticipantLimitOutOfRange { max: 50 }
        ));
        assert!(matches!(
            too_large,
            RoomError::ParticipantLimitOutOfRange { max: 50 }
        ));
    }

    #[tokio::test]
    async fn test_delete_room() {
        let (manager, user_id) = manager_with_user().await;

        let room = manager
            .create_room(NewPlainRoom {
                name: "Exam".to_string(),
                participant_limit: 10,
                user_id,
            })
            .await
            .unwrap();

        manager.delete_room(&room.id).await.unwrap();

        assert!(manager.room_by_id(&room.id).await.is_err());
        assert!(manager.list_all().await.unwrap().is_empty());
    }
}
