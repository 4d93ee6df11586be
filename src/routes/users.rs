use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::RegisterUserReq,
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::UserEntity,
    services::users,
};

/// Signup route. Mounted outside the identity lookup, since the caller has no
/// profile row yet.
pub fn registration_routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(register_user))
}

/// Defines profile routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new().routes(utoipa_axum::routes!(get_user));

    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_me))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization));

    public.merge(protected)
}

/// Create the profile of an identity that just signed up.
#[utoipa::path(
    post,
    path = "/users",
    tags = ["Users"],
    request_body = RegisterUserReq,
    responses(
        (status = 201, description = "Registered user successfully", body = StdResponse<UserEntity, String>),
        (status = 409, description = "Profile or email already exists"),
        (status = 422, description = "Invalid profile")
    )
)]
async fn register_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterUserReq>,
) -> Result<impl IntoResponse, AppError> {
    let caller = middleware::user_id_from_headers(&headers)?;
    let user = users::register_user(state.store.as_ref(), caller, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(user),
            message: Some("Registered user successfully"),
        },
    ))
}

/// Fetch the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/users/me",
    tags = ["Users"],
    security(("userId" = [])),
    responses(
        (status = 200, description = "Get profile successfully", body = StdResponse<UserEntity, String>),
        (status = 401, description = "Not authenticated")
    )
)]
async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::current_user(state.store.as_ref(), &user).await?;

    Ok(StdResponse {
        data: Some(user),
        message: Some("Get profile successfully"),
    })
}

/// Fetch a user's public profile.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tags = ["Users"],
    params(
        ("id" = Uuid, Path, description = "User ID to fetch")
    ),
    responses(
        (status = 200, description = "Get user successfully", body = StdResponse<UserEntity, String>),
        (status = 404, description = "User not found")
    )
)]
async fn get_user(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::get_user(state.store.as_ref(), id).await?;

    Ok(StdResponse {
        data: Some(user),
        message: Some("Get user successfully"),
    })
}
