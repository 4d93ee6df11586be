use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    infra::{app_error::AppError, app_state::AppState},
    models::{UserEntity, UserRole},
};

/// Header carrying the identity provider's subject, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, resolved against the users table.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl TryFrom<UserEntity> for CurrentUser {
    type Error = AppError;

    fn try_from(user: UserEntity) -> Result<Self, Self::Error> {
        let role = user.role().ok_or(AppError::Unauthorized)?;
        Ok(Self {
            id: user.id,
            email: user.email,
            role,
        })
    }
}

pub fn user_id_from_headers(headers: &HeaderMap) -> Result<Option<Uuid>, AppError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    let id = value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or(AppError::Unauthorized)?;

    Ok(Some(id))
}

/// Resolves the caller's identity, if any, and stores it as a request extension.
///
/// Anonymous requests pass through untouched; a malformed or unknown identity
/// is rejected outright.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(id) = user_id_from_headers(req.headers())? {
        let user = state
            .store
            .find_user(id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let user = CurrentUser::try_from(user)?;
        tracing::debug!(user_id = %user.id, role = %user.role, "Authenticated request");
        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}

/// Rejects requests that were not authenticated by [`authenticate`].
pub async fn users_authorization(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<CurrentUser>().is_none() {
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn missing_header_is_anonymous() {
        assert!(matches!(user_id_from_headers(&HeaderMap::new()), Ok(None)));
    }

    #[test]
    fn malformed_header_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            user_id_from_headers(&headers),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn well_formed_header_is_parsed() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(user_id_from_headers(&headers).unwrap(), Some(id));
    }
}
