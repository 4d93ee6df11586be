use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    domain::expiry,
    dto::MedicineView,
    infra::{app_error::AppError, middleware::CurrentUser},
    models::MedicineEntity,
    store::MarketplaceStore,
};

/// Idempotent; returns the favorited medicine.
pub async fn add_favorite(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
) -> Result<MedicineEntity, AppError> {
    let medicine = store.get_medicine(medicine_id).await?;
    store.add_favorite(user.id, medicine_id).await?;
    Ok(medicine)
}

/// Returns whether the medicine was a favorite.
pub async fn remove_favorite(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
) -> Result<bool, AppError> {
    store.remove_favorite(user.id, medicine_id).await
}

pub async fn list_favorites(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    today: NaiveDate,
) -> Result<Vec<MedicineView>, AppError> {
    let medicines = store.list_favorites(user.id).await?;
    Ok(medicines
        .into_iter()
        .map(|m| expiry::view(m, today))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::UserRole,
        services::{
            fixtures::{paracetamol, register, today},
            medicines,
        },
        store::MemoryStore,
    };

    #[tokio::test]
    async fn favoriting_twice_keeps_one_entry() {
        let store = MemoryStore::new();
        let donor = register(&store, "donor@example.com", UserRole::Donor).await;
        let claimer = register(&store, "claimer@example.com", UserRole::Claimer).await;
        let medicine = medicines::create_medicine(&store, &donor, paracetamol(), today())
            .await
            .unwrap();

        add_favorite(&store, &claimer, medicine.id).await.unwrap();
        add_favorite(&store, &claimer, medicine.id).await.unwrap();

        let favorites = list_favorites(&store, &claimer, today()).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert!(favorites[0].claimable);
        assert!(remove_favorite(&store, &claimer, medicine.id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_medicine_cannot_be_favorited() {
        let store = MemoryStore::new();
        let claimer = register(&store, "claimer@example.com", UserRole::Claimer).await;

        let err = add_favorite(&store, &claimer, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
