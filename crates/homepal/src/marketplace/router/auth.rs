//! Caller identity from the trusted gateway headers.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::marketplace::domain::{UserId, UserRole};
use crate::marketplace::service::Actor;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";
pub(crate) const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.to_string(),
            "code": "UNAUTHORIZED",
        });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

fn header<'a>(parts: &'a Parts, name: &'static str) -> Result<&'a str, AuthRejection> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthRejection::MissingHeader(name))
}

#[axum::async_trait]
impl<St> FromRequestParts<St> for Actor
where
    St: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER)?;
        let raw_role = header(parts, USER_ROLE_HEADER)?;
        let role =
            UserRole::parse(raw_role).ok_or_else(|| AuthRejection::UnknownRole(raw_role.to_string()))?;

        Ok(Actor {
            id: UserId(id.to_string()),
            role,
        })
    }
}
