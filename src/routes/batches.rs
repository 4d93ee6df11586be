use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::{BatchChange, CreateBatchReq, UpdateBatchReq},
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::BatchEntity,
    services::details,
};

/// Defines batch routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new().routes(utoipa_axum::routes!(get_batches));

    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(create_batch))
        .routes(utoipa_axum::routes!(update_batch))
        .routes(utoipa_axum::routes!(delete_batch))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization));

    public.merge(protected)
}

/// Fetch the batches of a medicine, soonest expiry first.
#[utoipa::path(
    get,
    path = "/medicines/{id}/batches",
    tags = ["Batches"],
    params(
        ("id" = Uuid, Path, description = "Medicine ID")
    ),
    responses(
        (status = 200, description = "List batches", body = StdResponse<Vec<BatchEntity>, String>)
    )
)]
async fn get_batches(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let batches = details::list_batches(state.store.as_ref(), id).await?;

    Ok(StdResponse {
        data: Some(batches),
        message: Some("Get batches successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/medicines/{id}/batches",
    tags = ["Batches"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID")
    ),
    request_body = CreateBatchReq,
    responses(
        (status = 201, description = "Added batch successfully", body = StdResponse<BatchChange, String>)
    )
)]
async fn create_batch(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateBatchReq>,
) -> Result<impl IntoResponse, AppError> {
    let change = details::add_batch(state.store.as_ref(), &user, id, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(change),
            message: Some("Added batch successfully"),
        },
    ))
}

#[utoipa::path(
    patch,
    path = "/batches/{id}",
    tags = ["Batches"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Batch ID")
    ),
    request_body = UpdateBatchReq,
    responses(
        (status = 200, description = "Updated batch successfully", body = StdResponse<BatchChange, String>)
    )
)]
async fn update_batch(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<UpdateBatchReq>,
) -> Result<impl IntoResponse, AppError> {
    let change = details::update_batch(state.store.as_ref(), &user, id, body).await?;

    Ok(StdResponse {
        data: Some(change),
        message: Some("Updated batch successfully"),
    })
}

#[utoipa::path(
    delete,
    path = "/batches/{id}",
    tags = ["Batches"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Batch ID")
    ),
    responses(
        (status = 200, description = "Deleted batch successfully", body = StdResponse<BatchChange, String>)
    )
)]
async fn delete_batch(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let change = details::delete_batch(state.store.as_ref(), &user, id).await?;

    Ok(StdResponse {
        data: Some(change),
        message: Some("Deleted batch successfully"),
    })
}
