use std::sync::Arc;

use axum::extract::FromRef;
use examroom_collab::{Collab, MemoryDatabase};

pub type ServerCollab = Collab<MemoryDatabase>;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub collab: Arc<ServerCollab>,
}
