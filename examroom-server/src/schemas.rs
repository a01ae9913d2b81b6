use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Username must be between 3 and 20 characters"
    ))]
    pub username: String,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email is too long")
    )]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must be between 8 and 255 characters"
    ))]
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(min = 1, max = 128, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 255, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRoomSchema {
    #[validate(length(min = 1, max = 100, message = "Room name must not be empty"))]
    pub name: String,
    #[validate(range(min = 1, message = "Participant limit must be at least 1"))]
    pub participant_limit: u32,
}

/// A request schema checked by [validator], with room for rules the derive
/// can't express
pub trait ValidatedSchema: Validate {
    /// Adds cross-field violations to `errors`
    fn validate_extra(&self, _errors: &mut ValidationErrors) {}

    /// Runs every rule, collecting all violations at once
    fn validate_full(&self) -> Result<(), ServerError> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        self.validate_extra(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServerError::validation(&errors))
        }
    }
}

impl ValidatedSchema for LoginSchema {}
impl ValidatedSchema for NewRoomSchema {}

impl ValidatedSchema for RegisterSchema {
    fn validate_extra(&self, errors: &mut ValidationErrors) {
        let is_valid_charset = self
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !is_valid_charset {
            let mut error = ValidationError::new("username_charset");
            error.message =
                Some("Username may only contain letters, numbers, and underscores".into());

            errors.add("username", error);
        }

        if self.password != self.confirm_password {
            let mut error = ValidationError::new("must_match");
            error.message = Some("Passwords do not match".into());

            errors.add("confirm_password", error);
        }
    }
}

/// Rejects a request with a structured validation error before any handler
/// runs, so a failing request never mutates state
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + ValidatedSchema,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| ServerError::malformed_body())?;

        value.validate_full()?;

        Ok(Self(value))
    }
}
