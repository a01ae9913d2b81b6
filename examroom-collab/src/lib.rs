mod auth;
mod db;
mod rooms;
mod util;

use std::sync::Arc;

pub use auth::*;
pub use db::*;
pub use rooms::*;

/// The examroom collab system, facilitating authentication, sessions, and room management.
pub struct Collab<Db> {
    pub auth: Auth<Db>,
    pub rooms: RoomManager<Db>,
}

impl<Db> Collab<Db>
where
    Db: Database,
{
    pub fn new(database: Db, max_participant_limit: u32) -> Self {
        let database = Arc::new(database);

        Self {
            auth: Auth::new(&database),
            rooms: RoomManager::new(&database, max_participant_limit),
        }
    }
}
