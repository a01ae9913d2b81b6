use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipauto::utoipauto;

use crate::auth::SESSION_COOKIE_NAME;

#[utoipauto(paths = "./examroom-server/src")]
#[derive(OpenApi)]
#[openapi(
    modifiers(&Security),
    info(
        description = "examroom-server exposes the authentication and room management endpoints of an examroom instance"
    ))
]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                SESSION_COOKIE_NAME.to_string(),
            )));

            components.add_security_scheme("SessionCookie", scheme)
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
