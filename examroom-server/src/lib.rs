use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::routing::get;
use examroom_collab::{Collab, MemoryDatabase};
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod auth;
mod context;
mod docs;
mod errors;
mod logging;
mod rooms;
mod schemas;
mod serialized;

pub use context::ServerContext;
pub use logging::init_logger;

pub type Router = axum::Router<ServerContext>;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;
/// The default upper bound for a room's participant limit.
pub const DEFAULT_MAX_PARTICIPANT_LIMIT: u32 = 100;

/// Builds the full application with a fresh in-memory database
pub fn create_app(max_participant_limit: u32) -> axum::Router {
    let collab = Arc::new(Collab::new(MemoryDatabase::new(), max_participant_limit));

    let context = ServerContext { collab };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/rooms", rooms::router());

    Router::new()
        .nest("/api", api_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the examroom server
pub async fn run_server() {
    let port = env::var("EXAMROOM_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let max_participant_limit = env::var("EXAMROOM_MAX_PARTICIPANTS")
        .map(|x| {
            x.parse::<u32>()
                .expect("Participant limit must be a number")
        })
        .unwrap_or(DEFAULT_MAX_PARTICIPANT_LIMIT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();
    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("Listening on port {}.", port);

    axum::serve(
        listener,
        create_app(max_participant_limit).into_make_service(),
    )
    .await
    .expect("server runs")
}
