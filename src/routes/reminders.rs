use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::{CreateReminderReq, DueReminder, UpdateReminderReq},
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::ReminderEntity,
    services::{self, details},
};

/// Defines reminder routes with OpenAPI specs. Reminders are personal, so every route needs a user.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_reminders))
        .routes(utoipa_axum::routes!(create_reminder))
        .routes(utoipa_axum::routes!(get_due_reminders))
        .routes(utoipa_axum::routes!(update_reminder))
        .routes(utoipa_axum::routes!(delete_reminder))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization))
}

#[utoipa::path(
    get,
    path = "/medicines/{id}/reminders",
    tags = ["Reminders"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID")
    ),
    responses(
        (status = 200, description = "List my reminders for the medicine", body = StdResponse<Vec<ReminderEntity>, String>)
    )
)]
async fn get_reminders(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let reminders = details::list_reminders(state.store.as_ref(), &user, id).await?;

    Ok(StdResponse {
        data: Some(reminders),
        message: Some("Get reminders successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/medicines/{id}/reminders",
    tags = ["Reminders"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID")
    ),
    request_body = CreateReminderReq,
    responses(
        (status = 201, description = "Added reminder successfully", body = StdResponse<ReminderEntity, String>)
    )
)]
async fn create_reminder(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateReminderReq>,
) -> Result<impl IntoResponse, AppError> {
    let reminder = details::add_reminder(state.store.as_ref(), &user, id, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(reminder),
            message: Some("Added reminder successfully"),
        },
    ))
}

/// Fetch the authenticated user's reminders that fire today.
#[utoipa::path(
    get,
    path = "/reminders/due",
    tags = ["Reminders"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List due reminders", body = StdResponse<Vec<DueReminder>, String>)
    )
)]
async fn get_due_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let due = details::due_reminders(state.store.as_ref(), &user, services::today()).await?;

    Ok(StdResponse {
        data: Some(due),
        message: Some("Get due reminders successfully"),
    })
}

#[utoipa::path(
    patch,
    path = "/reminders/{id}",
    tags = ["Reminders"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Reminder ID")
    ),
    request_body = UpdateReminderReq,
    responses(
        (status = 200, description = "Updated reminder successfully", body = StdResponse<ReminderEntity, String>)
    )
)]
async fn update_reminder(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<UpdateReminderReq>,
) -> Result<impl IntoResponse, AppError> {
    let reminder = details::update_reminder(state.store.as_ref(), &user, id, body).await?;

    Ok(StdResponse {
        data: Some(reminder),
        message: Some("Updated reminder successfully"),
    })
}

#[utoipa::path(
    delete,
    path = "/reminders/{id}",
    tags = ["Reminders"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Reminder ID")
    ),
    responses(
        (status = 200, description = "Deleted reminder successfully", body = StdResponse<ReminderEntity, String>)
    )
)]
async fn delete_reminder(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let reminder = details::delete_reminder(state.store.as_ref(), &user, id).await?;

    Ok(StdResponse {
        data: Some(reminder),
        message: Some("Deleted reminder successfully"),
    })
}
