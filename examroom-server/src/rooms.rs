use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json,
};
use examroom_collab::{NewPlainRoom, UserRole};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{NewRoomSchema, ValidatedSchema},
    serialized::{Room, RoomListResult, RoomResult, SuccessResult, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "rooms",
    security(("SessionCookie" = [])),
    responses(
        (status = 200, body = RoomListResult),
        (status = 401, description = "No valid session was presented")
    )
)]
pub(crate) async fn list_rooms(
    _session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<RoomListResult>> {
    let rooms = context.collab.rooms.list_all().await?;

    Ok(Json(RoomListResult {
        rooms: rooms.to_serialized(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "rooms",
    security(("SessionCookie" = [])),
    responses(
        (status = 200, body = Room),
        (status = 404, description = "The room does not exist")
    )
)]
pub(crate) async fn room(
    _session: Session,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
) -> ServerResult<Json<Room>> {
    let room = context.collab.rooms.room_by_id(&room_id).await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "rooms",
    request_body = NewRoomSchema,
    security(("SessionCookie" = [])),
    responses(
        (status = 201, body = RoomResult),
        (status = 400, description = "The name or participant limit is invalid"),
        (status = 401, description = "No valid session was presented"),
        (status = 403, description = "The session's user is not an admin")
    )
)]
pub(crate) async fn create_room(
    session: Session,
    State(context): State<ServerContext>,
    body: Result<Json<NewRoomSchema>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<RoomResult>)> {
    // The authorization gate comes before validation, so a candidate with a
    // malformed body still sees a 403
    session.0.authorize(UserRole::Admin)?;

    let Json(body) = body.map_err(|_| ServerError::malformed_body())?;
    body.validate_full()?;

    let room = context
        .collab
        .rooms
        .create_room(NewPlainRoom {
            name: body.name,
            participant_limit: body.participant_limit,
            user_id: session.user().id,
        })
        .await?;

    let result = RoomResult {
        success: true,
        room: room.to_serialized(),
    };

    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    tag = "rooms",
    security(("SessionCookie" = [])),
    responses(
        (status = 200, body = SuccessResult),
        (status = 401, description = "No valid session was presented"),
        (status = 403, description = "The session's user is not an admin"),
        (status = 404, description = "The room does not exist")
    )
)]
pub(crate) async fn delete_room(
    session: Session,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
) -> ServerResult<Json<SuccessResult>> {
    session.0.authorize(UserRole::Admin)?;

    context.collab.rooms.delete_room(&room_id).await?;

    Ok(Json(SuccessResult { success: true }))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/:id", get(room).delete(delete_room))
}
