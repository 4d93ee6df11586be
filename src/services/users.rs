use uuid::Uuid;

use crate::{
    domain::validation::validate_registration,
    dto::RegisterUserReq,
    infra::{app_error::AppError, middleware::CurrentUser},
    models::{CreateUserEntity, UserEntity},
    store::MarketplaceStore,
};

/// Creates the profile row for an identity that just signed up.
///
/// `caller` is the identity asserted by the gateway, when present; it must
/// match the id being registered.
pub async fn register_user(
    store: &dyn MarketplaceStore,
    caller: Option<Uuid>,
    req: RegisterUserReq,
) -> Result<UserEntity, AppError> {
    if caller.is_some_and(|id| id != req.id) {
        return Err(AppError::ForbiddenResource(
            "Cannot register a profile for another identity".into(),
        ));
    }
    validate_registration(&req)?;

    let user = store
        .create_user(CreateUserEntity {
            id: req.id,
            email: req.email.trim().to_lowercase(),
            role: req.role.as_str().into(),
            full_name: req
                .full_name
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "Registered user");
    Ok(user)
}

pub async fn current_user(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
) -> Result<UserEntity, AppError> {
    get_user(store, user.id).await
}

pub async fn get_user(store: &dyn MarketplaceStore, id: Uuid) -> Result<UserEntity, AppError> {
    store.find_user(id).await?.ok_or(AppError::NotFound)
}
