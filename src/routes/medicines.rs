use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::{
        CreateMedicineReq, MedicineDetails, MedicineQuery, MedicineView, Page, UpdateMedicineReq,
    },
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::MedicineEntity,
    services::{self, medicines},
};

/// Defines medicine listing routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_medicines))
        .routes(utoipa_axum::routes!(get_medicine))
        .routes(utoipa_axum::routes!(get_medicine_details));

    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(create_medicine))
        .routes(utoipa_axum::routes!(get_my_medicines))
        .routes(utoipa_axum::routes!(update_medicine))
        .routes(utoipa_axum::routes!(delete_medicine))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization));

    public.merge(protected)
}

/// Browse listings with filters, ordering and pagination.
#[utoipa::path(
    get,
    path = "/medicines",
    tags = ["Medicines"],
    params(MedicineQuery),
    responses(
        (status = 200, description = "List medicines", body = StdResponse<Page<MedicineView>, String>)
    )
)]
async fn get_medicines(
    Query(query): Query<MedicineQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let page = medicines::list_medicines(state.store.as_ref(), &query, services::today()).await?;

    Ok(StdResponse {
        data: Some(page),
        message: Some("Get medicines successfully"),
    })
}

/// Post a new listing as the authenticated donor.
#[utoipa::path(
    post,
    path = "/medicines",
    tags = ["Medicines"],
    security(("userId" = [])),
    request_body = CreateMedicineReq,
    responses(
        (status = 201, description = "Created medicine successfully", body = StdResponse<MedicineEntity, String>),
        (status = 403, description = "Caller is not a donor"),
        (status = 422, description = "Invalid medicine form")
    )
)]
async fn create_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateMedicineReq>,
) -> Result<impl IntoResponse, AppError> {
    let medicine =
        medicines::create_medicine(state.store.as_ref(), &user, body, services::today()).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(medicine),
            message: Some("Created medicine successfully"),
        },
    ))
}

/// Fetch the listings posted by the authenticated user.
#[utoipa::path(
    get,
    path = "/medicines/mine",
    tags = ["Medicines"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List my medicines", body = StdResponse<Vec<MedicineView>, String>)
    )
)]
async fn get_my_medicines(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let medicines =
        medicines::list_user_medicines(state.store.as_ref(), user.id, services::today()).await?;

    Ok(StdResponse {
        data: Some(medicines),
        message: Some("Get my medicines successfully"),
    })
}

/// Fetch a listing with its expiry state.
#[utoipa::path(
    get,
    path = "/medicines/{id}",
    tags = ["Medicines"],
    params(
        ("id" = Uuid, Path, description = "Medicine ID to fetch")
    ),
    responses(
        (status = 200, description = "Get medicine successfully", body = StdResponse<MedicineView, String>),
        (status = 404, description = "Medicine not found")
    )
)]
async fn get_medicine(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let medicine = medicines::get_medicine(state.store.as_ref(), id, services::today()).await?;

    Ok(StdResponse {
        data: Some(medicine),
        message: Some("Get medicine successfully"),
    })
}

/// Fetch a listing with batches, interactions, the caller's reminders and the donor.
#[utoipa::path(
    get,
    path = "/medicines/{id}/details",
    tags = ["Medicines"],
    params(
        ("id" = Uuid, Path, description = "Medicine ID to fetch")
    ),
    responses(
        (status = 200, description = "Get medicine details successfully", body = StdResponse<MedicineDetails, String>),
        (status = 404, description = "Medicine not found")
    )
)]
async fn get_medicine_details(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = user.as_ref().map(|Extension(user)| user);
    let details =
        medicines::get_medicine_details(state.store.as_ref(), id, viewer, services::today())
            .await?;

    Ok(StdResponse {
        data: Some(details),
        message: Some("Get medicine details successfully"),
    })
}

/// Edit a listing that is still available.
#[utoipa::path(
    patch,
    path = "/medicines/{id}",
    tags = ["Medicines"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID to update")
    ),
    request_body = UpdateMedicineReq,
    responses(
        (status = 200, description = "Updated medicine successfully", body = StdResponse<MedicineEntity, String>),
        (status = 403, description = "Caller does not own the medicine"),
        (status = 409, description = "Medicine is no longer available")
    )
)]
async fn update_medicine(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<UpdateMedicineReq>,
) -> Result<impl IntoResponse, AppError> {
    let medicine =
        medicines::update_medicine(state.store.as_ref(), &user, id, body, services::today())
            .await?;

    Ok(StdResponse {
        data: Some(medicine),
        message: Some("Updated medicine successfully"),
    })
}

/// Delete a listing that is still available, along with its image.
#[utoipa::path(
    delete,
    path = "/medicines/{id}",
    tags = ["Medicines"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted medicine successfully", body = StdResponse<MedicineEntity, String>),
        (status = 403, description = "Caller does not own the medicine"),
        (status = 409, description = "Medicine is no longer available")
    )
)]
async fn delete_medicine(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let medicine =
        medicines::delete_medicine(state.store.as_ref(), state.images.as_ref(), &user, id).await?;

    Ok(StdResponse {
        data: Some(medicine),
        message: Some("Deleted medicine successfully"),
    })
}
