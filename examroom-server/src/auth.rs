use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use examroom_collab::{Credentials, DatabaseError, NewPlainUser, SessionData, UserData, UserRole};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema, ValidatedJson},
    serialized::{LoginResult, RegisterResult, SessionResult, SuccessResult, ToSerialized},
    Router,
};

/// The name of the cookie the session token is carried in
pub const SESSION_COOKIE_NAME: &str = "auth_session";

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it
pub struct Session(pub SessionData);

impl Session {
    /// Returns the user of the session
    pub fn user(&self) -> UserData {
        self.0.user.clone()
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| ServerError::Unauthorized)?;

        let token = jar
            .get(SESSION_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .ok_or(ServerError::Unauthorized)?;

        let session = context
            .collab
            .auth
            .session(&token)
            .await
            .map_err(|_| ServerError::Unauthorized)?;

        Ok(Self(session))
    }
}

/// Builds the cookie carrying a session token, scoped to the whole service
/// and expiring together with the session
fn session_cookie(session: &SessionData) -> Cookie<'static> {
    let max_age = time::Duration::seconds((session.expires_at - Utc::now()).num_seconds());

    Cookie::build((SESSION_COOKIE_NAME, session.token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Builds the cookie shape used to clear the session cookie on the client
fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 201, body = RegisterResult),
        (status = 400, description = "Validation failed, or the username or email is taken")
    )
)]
pub(crate) async fn register(
    State(context): State<ServerContext>,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<(StatusCode, CookieJar, Json<RegisterResult>)> {
    let session = context
        .collab
        .auth
        .register(NewPlainUser {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    let message = match session.user.role {
        UserRole::Admin => "Admin account created successfully",
        UserRole::Candidate => "Account created successfully",
    };

    let result = RegisterResult {
        success: true,
        user: session.user.to_serialized(),
        message: message.to_string(),
    };

    let jar = jar.add(session_cookie(&session));

    Ok((StatusCode::CREATED, jar, Json(result)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult),
        (status = 401, description = "The username or password is incorrect")
    )
)]
pub(crate) async fn login(
    State(context): State<ServerContext>,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<(CookieJar, Json<LoginResult>)> {
    let session = context
        .collab
        .auth
        .login(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    let result = LoginResult {
        success: true,
        user: session.user.to_serialized(),
    };

    let jar = jar.add(session_cookie(&session));

    Ok((jar, Json(result)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    security(("SessionCookie" = [])),
    responses(
        (status = 200, body = SuccessResult),
        (status = 401, description = "No valid session was presented")
    )
)]
pub(crate) async fn logout(
    State(context): State<ServerContext>,
    session: Session,
    jar: CookieJar,
) -> ServerResult<(CookieJar, Json<SuccessResult>)> {
    context
        .collab
        .auth
        .logout(&session.0.token)
        .await
        .map_err(|e| match e {
            DatabaseError::NotFound { .. } => ServerError::Unauthorized,
            e => e.into(),
        })?;

    let jar = jar.remove(removal_cookie());

    Ok((jar, Json(SuccessResult { success: true })))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    security(("SessionCookie" = [])),
    responses(
        (status = 200, body = SessionResult),
        (status = 401, description = "No valid session was presented")
    )
)]
pub(crate) async fn session(session: Session) -> Json<SessionResult> {
    Json(session.0.to_serialized())
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}
