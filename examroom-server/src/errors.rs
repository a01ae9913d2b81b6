use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use examroom_collab::{AuthError, DatabaseError, RoomError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Validation failed")]
    Validation(Vec<ValidationDetail>),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Admin access required")]
    Forbidden,
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

/// A single field violation as exposed in a validation error response
#[derive(Debug, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl ServerError {
    /// Builds a validation error from the errors collected by [validator]
    pub fn validation(errors: &ValidationErrors) -> Self {
        let mut details: Vec<_> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationDetail {
                    field: to_camel_case(field),
                    message: error
                        .message
                        .clone()
                        .map(|m| m.into_owned())
                        .unwrap_or_else(|| error.code.to_string()),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));

        Self::Validation(details)
    }

    /// The rejection used when the request body isn't parseable at all
    pub fn malformed_body() -> Self {
        Self::Validation(vec![ValidationDetail {
            field: "body".to_string(),
            message: "Invalid JSON body".to_string(),
        }])
    }

    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_body(&self) -> serde_json::Value {
        match self {
            Self::Validation(details) => json!({
                "error": "Validation failed",
                "details": details,
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), Json(self.as_body())).into_response()
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource: "room", ..
            } => Self::NotFound { resource: "Room" },
            DatabaseError::NotFound { resource, .. } => Self::NotFound { resource },
            DatabaseError::Conflict {
                field: "username", ..
            } => Self::Conflict("Username already taken"),
            DatabaseError::Conflict { field: "email", .. } => {
                Self::Conflict("Email already registered")
            }
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Forbidden => Self::Forbidden,
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<RoomError> for ServerError {
    fn from(value: RoomError) -> Self {
        match value {
            // The bound depends on runtime configuration, so the derive rules
            // can't check it. It still surfaces in the validation shape.
            e @ RoomError::ParticipantLimitOutOfRange { .. } => Self::Validation(vec![
                ValidationDetail {
                    field: "participantLimit".to_string(),
                    message: e.to_string(),
                },
            ]),
            RoomError::Db(e) => e.into(),
        }
    }
}

fn to_camel_case(field: &str) -> String {
    let mut result = String::with_capacity(field.len());
    let mut capitalize = false;

    for c in field.chars() {
        if c == '_' {
            capitalize = true;
        } else if capitalize {
            result.extend(c.to_uppercase());
            capitalize = false;
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("participant_limit"), "participantLimit");
        assert_eq!(to_camel_case("confirm_password"), "confirmPassword");
        assert_eq!(to_camel_case("username"), "username");
    }

    #[test]
    fn test_conflict_messages() {
        let username: ServerError = DatabaseError::Conflict {
            resource: "user",
            field: "username",
            value: "alice".to_string(),
        }
        .into();

        let email: ServerError = DatabaseError::Conflict {
            resource: "user",
            field: "email",
            value: "alice@x.com".to_string(),
        }
        .into();

        assert_eq!(username.to_string(), "Username already taken");
        assert_eq!(email.to_string(), "Email already registered");
    }

    #[test]
    fn test_participant_limit_violations_use_the_validation_shape() {
        let err: ServerError = RoomError::ParticipantLimitOutOfRange { max: 100 }.into();

        let ServerError::Validation(details) = err else {
            panic!("expected a validation error");
        };

        assert_eq!(details[0].field, "participantLimit");
        assert_eq!(
            details[0].message,
            "Participant limit must be between 1 and 100"
        );
    }
}
