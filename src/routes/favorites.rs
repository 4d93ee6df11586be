use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::MedicineView,
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::MedicineEntity,
    services::{self, favorites},
};

/// Defines favorites routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_favorites))
        .routes(utoipa_axum::routes!(add_favorite, remove_favorite))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization))
}

/// Fetch the authenticated user's favorite medicines.
#[utoipa::path(
    get,
    path = "/favorites",
    tags = ["Favorites"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List favorites", body = StdResponse<Vec<MedicineView>, String>)
    )
)]
async fn get_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let favorites = favorites::list_favorites(state.store.as_ref(), &user, services::today()).await?;

    Ok(StdResponse {
        data: Some(favorites),
        message: Some("Get favorites successfully"),
    })
}

/// Mark a medicine as favorite. Repeating the call is harmless.
#[utoipa::path(
    put,
    path = "/favorites/{medicine_id}",
    tags = ["Favorites"],
    security(("userId" = [])),
    params(
        ("medicine_id" = Uuid, Path, description = "Medicine ID to favorite")
    ),
    responses(
        (status = 200, description = "Added favorite successfully", body = StdResponse<MedicineEntity, String>),
        (status = 404, description = "Medicine not found")
    )
)]
async fn add_favorite(
    Path(medicine_id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let medicine = favorites::add_favorite(state.store.as_ref(), &user, medicine_id).await?;

    Ok(StdResponse {
        data: Some(medicine),
        message: Some("Added favorite successfully"),
    })
}

#[utoipa::path(
    delete,
    path = "/favorites/{medicine_id}",
    tags = ["Favorites"],
    security(("userId" = [])),
    params(
        ("medicine_id" = Uuid, Path, description = "Medicine ID to unfavorite")
    ),
    responses(
        (status = 200, description = "Whether a favorite was removed", body = StdResponse<bool, String>)
    )
)]
async fn remove_favorite(
    Path(medicine_id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let removed = favorites::remove_favorite(state.store.as_ref(), &user, medicine_id).await?;

    Ok(StdResponse {
        data: Some(removed),
        message: Some("Removed favorite successfully"),
    })
}
