pub mod batches;
pub mod claims;
pub mod favorites;
pub mod interactions;
pub mod medicines;
pub mod notifications;
pub mod reminders;
pub mod users;

use axum::{Router, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::infra::{
    app_error::StdResponse, app_state::AppState, middleware, swagger::create_swagger_ui,
};

/// Every API route with its OpenAPI spec.
///
/// The identity lookup wraps everything except signup and the health check.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let identified = OpenApiRouter::new()
        .merge(users::routes_with_openapi())
        .merge(medicines::routes_with_openapi())
        .merge(claims::routes_with_openapi())
        .merge(batches::routes_with_openapi())
        .merge(interactions::routes_with_openapi())
        .merge(reminders::routes_with_openapi())
        .merge(favorites::routes_with_openapi())
        .merge(notifications::routes_with_openapi())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    OpenApiRouter::new()
        .merge(identified)
        .merge(users::registration_routes_with_openapi())
        .routes(utoipa_axum::routes!(health))
}

/// The complete application: API routes, Swagger UI and shared state.
pub fn app(state: AppState) -> Router {
    let routes = routes_with_openapi(&state);

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("MedShare API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let swagger_ui = create_swagger_ui(openapi);

    Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is up", body = StdResponse<String, String>)
    )
)]
async fn health() -> impl IntoResponse {
    StdResponse::<&str, &str> {
        data: Some("ok"),
        message: None,
    }
}
