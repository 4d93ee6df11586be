use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    dto::ClaimWithMedicine,
    infra::{app_error::AppError, middleware::CurrentUser},
    models::{ClaimEntity, CreateNotificationEntity, NotificationType, UserRole},
    services::{ensure_owner_or_admin, ensure_role, notifications},
    store::MarketplaceStore,
};

/// Claims an available, unexpired medicine for `user`.
///
/// The status flip and the claim row are written atomically by the store;
/// the donor's notification is sent afterwards and only logged on failure.
pub async fn claim_medicine(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
    today: NaiveDate,
) -> Result<ClaimWithMedicine, AppError> {
    ensure_role(user, &[UserRole::Claimer], "claim medicines")?;

    let (claim, medicine) = store.claim_medicine(medicine_id, user.id, today).await?;
    tracing::info!(
        claim_id = %claim.id,
        medicine_id = %medicine.id,
        claimer_id = %user.id,
        "Medicine claimed"
    );

    notifications::notify(
        store,
        CreateNotificationEntity {
            user_id: medicine.posted_by,
            notification_type: NotificationType::Claim.as_str().into(),
            title: "Medicine claimed".into(),
            message: format!("{} claimed your listing \"{}\"", user.email, medicine.name),
            medicine_id: Some(medicine.id),
            claim_id: Some(claim.id),
        },
    )
    .await;

    Ok(ClaimWithMedicine { claim, medicine })
}

pub async fn list_user_claims(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
) -> Result<Vec<ClaimWithMedicine>, AppError> {
    store.list_user_claims(user.id).await
}

pub async fn list_medicine_claims(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
) -> Result<Vec<ClaimEntity>, AppError> {
    let medicine = store.get_medicine(medicine_id).await?;
    ensure_owner_or_admin(user, &medicine)?;
    store.list_medicine_claims(medicine_id).await
}
