use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::ClaimWithMedicine,
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::ClaimEntity,
    services::{self, claims},
};

/// Defines claim routes with OpenAPI specs. Every claim route needs a user.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(claim_medicine))
        .routes(utoipa_axum::routes!(get_medicine_claims))
        .routes(utoipa_axum::routes!(get_my_claims))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization))
}

/// Claim an available, unexpired medicine. Exactly one claim can ever succeed.
#[utoipa::path(
    post,
    path = "/medicines/{id}/claim",
    tags = ["Claims"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID to claim")
    ),
    responses(
        (status = 201, description = "Claimed medicine successfully", body = StdResponse<ClaimWithMedicine, String>),
        (status = 403, description = "Caller is not a claimer"),
        (status = 404, description = "Medicine not found"),
        (status = 409, description = "Medicine already claimed or expired")
    )
)]
async fn claim_medicine(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let claimed = claims::claim_medicine(state.store.as_ref(), &user, id, services::today()).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(claimed),
            message: Some("Claimed medicine successfully"),
        },
    ))
}

/// Fetch the claims on a listing owned by the authenticated donor.
#[utoipa::path(
    get,
    path = "/medicines/{id}/claims",
    tags = ["Claims"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID whose claims to fetch")
    ),
    responses(
        (status = 200, description = "List medicine claims", body = StdResponse<Vec<ClaimEntity>, String>),
        (status = 403, description = "Caller does not own the medicine")
    )
)]
async fn get_medicine_claims(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let claims = claims::list_medicine_claims(state.store.as_ref(), &user, id).await?;

    Ok(StdResponse {
        data: Some(claims),
        message: Some("Get medicine claims successfully"),
    })
}

/// Fetch the authenticated claimer's claims, newest first.
#[utoipa::path(
    get,
    path = "/claims/mine",
    tags = ["Claims"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "List my claims", body = StdResponse<Vec<ClaimWithMedicine>, String>)
    )
)]
async fn get_my_claims(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let claims = claims::list_user_claims(state.store.as_ref(), &user).await?;

    Ok(StdResponse {
        data: Some(claims),
        message: Some("Get my claims successfully"),
    })
}
