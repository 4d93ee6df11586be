use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::NotificationList,
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::NotificationEntity,
    services::notifications,
};

/// Defines notification inbox routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_notifications))
        .routes(utoipa_axum::routes!(mark_all_read))
        .routes(utoipa_axum::routes!(mark_read))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization))
}

/// Fetch the authenticated user's notifications, newest first.
#[utoipa::path(
    get,
    path = "/notifications",
    tags = ["Notifications"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List notifications", body = StdResponse<NotificationList, String>)
    )
)]
async fn get_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let list = notifications::list_notifications(state.store.as_ref(), &user).await?;

    Ok(StdResponse {
        data: Some(list),
        message: Some("Get notifications successfully"),
    })
}

#[utoipa::path(
    patch,
    path = "/notifications/{id}/read",
    tags = ["Notifications"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Marked notification as read", body = StdResponse<NotificationEntity, String>),
        (status = 404, description = "No such notification for this user")
    )
)]
async fn mark_read(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let notification = notifications::mark_read(state.store.as_ref(), &user, id).await?;

    Ok(StdResponse {
        data: Some(notification),
        message: Some("Marked notification as read"),
    })
}

/// Mark every notification of the authenticated user as read; returns how many changed.
#[utoipa::path(
    patch,
    path = "/notifications/read-all",
    tags = ["Notifications"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "Marked all notifications as read", body = StdResponse<usize, String>)
    )
)]
async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let updated = notifications::mark_all_read(state.store.as_ref(), &user).await?;

    Ok(StdResponse {
        data: Some(updated),
        message: Some("Marked all notifications as read"),
    })
}
