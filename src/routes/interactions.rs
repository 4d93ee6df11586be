use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    dto::{CheckInteractionsReq, CreateInteractionReq},
    infra::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser},
    },
    models::InteractionEntity,
    services::details,
};

/// Defines drug interaction routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_interactions))
        .routes(utoipa_axum::routes!(check_interactions));

    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(create_interaction))
        .routes(utoipa_axum::routes!(delete_interaction))
        .route_layer(axum::middleware::from_fn(middleware::users_authorization));

    public.merge(protected)
}

#[utoipa::path(
    get,
    path = "/medicines/{id}/interactions",
    tags = ["Interactions"],
    params(
        ("id" = Uuid, Path, description = "Medicine ID")
    ),
    responses(
        (status = 200, description = "List interactions", body = StdResponse<Vec<InteractionEntity>, String>)
    )
)]
async fn get_interactions(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let interactions = details::list_interactions(state.store.as_ref(), id).await?;

    Ok(StdResponse {
        data: Some(interactions),
        message: Some("Get interactions successfully"),
    })
}

/// Check a list of medications against the known interactions of a medicine.
#[utoipa::path(
    post,
    path = "/medicines/{id}/interactions/check",
    tags = ["Interactions"],
    params(
        ("id" = Uuid, Path, description = "Medicine ID")
    ),
    request_body = CheckInteractionsReq,
    responses(
        (status = 200, description = "Matching interactions, most severe first", body = StdResponse<Vec<InteractionEntity>, String>)
    )
)]
async fn check_interactions(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<CheckInteractionsReq>,
) -> Result<impl IntoResponse, AppError> {
    let conflicts = details::check_interactions(state.store.as_ref(), id, body).await?;

    Ok(StdResponse {
        data: Some(conflicts),
        message: Some("Checked interactions successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/medicines/{id}/interactions",
    tags = ["Interactions"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Medicine ID")
    ),
    request_body = CreateInteractionReq,
    responses(
        (status = 201, description = "Added interaction successfully", body = StdResponse<InteractionEntity, String>)
    )
)]
async fn create_interaction(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateInteractionReq>,
) -> Result<impl IntoResponse, AppError> {
    let interaction = details::add_interaction(state.store.as_ref(), &user, id, body).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(interaction),
            message: Some("Added interaction successfully"),
        },
    ))
}

#[utoipa::path(
    delete,
    path = "/interactions/{id}",
    tags = ["Interactions"],
    security(("userId" = [])),
    params(
        ("id" = Uuid, Path, description = "Interaction ID")
    ),
    responses(
        (status = 200, description = "Deleted interaction successfully", body = StdResponse<InteractionEntity, String>)
    )
)]
async fn delete_interaction(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let interaction = details::delete_interaction(state.store.as_ref(), &user, id).await?;

    Ok(StdResponse {
        data: Some(interaction),
        message: Some("Deleted interaction successfully"),
    })
}
