use axum::Router;
use utoipa::openapi::{
    OpenApi,
    security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::infra::middleware::USER_ID_HEADER;

/// Mounts Swagger UI at `/swagger-ui` serving the document at `/api-docs/openapi.json`.
pub fn create_swagger_ui<S>(mut openapi: OpenApi) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let components = openapi.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
        "userId",
        SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ID_HEADER))),
    );

    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", openapi)
        .into()
}
