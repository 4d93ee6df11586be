use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    api::images::ImageStorage,
    domain::{
        expiry,
        validation::{validate_medicine_update, validate_new_medicine},
    },
    dto::{
        CreateMedicineReq, MedicineDetails, MedicineQuery, MedicineView, Page, UpdateMedicineReq,
    },
    infra::{app_error::AppError, middleware::CurrentUser},
    models::{CreateMedicineEntity, MedicineEntity, MedicineStatus, UpdateMedicineEntity, UserRole},
    services::{ensure_owner_or_admin, ensure_role},
    store::MarketplaceStore,
};

const DEFAULT_CONDITION: &str = "new";

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub async fn list_medicines(
    store: &dyn MarketplaceStore,
    query: &MedicineQuery,
    today: NaiveDate,
) -> Result<Page<MedicineView>, AppError> {
    let page = store.list_medicines(query).await?;
    Ok(page.map(|m| expiry::view(m, today)))
}

pub async fn list_user_medicines(
    store: &dyn MarketplaceStore,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<MedicineView>, AppError> {
    let medicines = store.list_user_medicines(user_id).await?;
    Ok(medicines
        .into_iter()
        .map(|m| expiry::view(m, today))
        .collect())
}

pub async fn get_medicine(
    store: &dyn MarketplaceStore,
    id: Uuid,
    today: NaiveDate,
) -> Result<MedicineView, AppError> {
    let medicine = store.get_medicine(id).await?;
    Ok(expiry::view(medicine, today))
}

/// The medicine with its sub-entities and donor profile.
///
/// Reminders are personal, so only the viewer's own are included.
pub async fn get_medicine_details(
    store: &dyn MarketplaceStore,
    id: Uuid,
    viewer: Option<&CurrentUser>,
    today: NaiveDate,
) -> Result<MedicineDetails, AppError> {
    let medicine = store.get_medicine(id).await?;

    let (batches, interactions, reminders, donor) = futures::try_join!(
        store.list_batches(id),
        store.list_interactions(id),
        store.list_medicine_reminders(id),
        store.find_user(medicine.posted_by),
    )?;

    let reminders = match viewer {
        Some(viewer) => reminders
            .into_iter()
            .filter(|r| r.user_id == viewer.id)
            .collect(),
        None => Vec::new(),
    };

    Ok(MedicineDetails {
        medicine: expiry::view(medicine, today),
        batches,
        interactions,
        reminders,
        donor,
    })
}

pub async fn create_medicine(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    req: CreateMedicineReq,
    today: NaiveDate,
) -> Result<MedicineEntity, AppError> {
    ensure_role(user, &[UserRole::Donor, UserRole::Admin], "post medicines")?;
    validate_new_medicine(&req, today)?;

    let medicine = store
        .create_medicine(CreateMedicineEntity {
            name: req.name.trim().to_owned(),
            description: req.description.trim().to_owned(),
            quantity: req.quantity,
            expiry_date: req.expiry_date,
            condition: trimmed(req.condition).unwrap_or_else(|| DEFAULT_CONDITION.into()),
            image_url: trimmed(req.image_url),
            location: req.location.trim().to_owned(),
            latitude: req.latitude,
            longitude: req.longitude,
            posted_by: user.id,
            status: MedicineStatus::Available.as_str().into(),
        })
        .await?;

    tracing::info!(medicine_id = %medicine.id, donor_id = %user.id, "Medicine posted");
    Ok(medicine)
}

pub async fn update_medicine(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
    req: UpdateMedicineReq,
    today: NaiveDate,
) -> Result<MedicineEntity, AppError> {
    let medicine = store.get_medicine(id).await?;
    ensure_owner_or_admin(user, &medicine)?;
    validate_medicine_update(&req, &medicine, today)?;

    let changes = UpdateMedicineEntity {
        name: req.name.map(|v| v.trim().to_owned()),
        description: req.description.map(|v| v.trim().to_owned()),
        quantity: req.quantity,
        expiry_date: req.expiry_date,
        condition: trimmed(req.condition),
        image_url: trimmed(req.image_url),
        location: req.location.map(|v| v.trim().to_owned()),
        latitude: req.latitude,
        longitude: req.longitude,
        status: req.status.map(|s| s.as_str().to_owned()),
    };

    let updated = store.update_available_medicine(id, changes).await?;
    tracing::info!(medicine_id = %id, "Medicine updated");
    Ok(updated)
}

/// Deletes the listing, then removes its image on a best-effort basis.
///
/// A failed image removal is logged and leaves the deletion in place.
pub async fn delete_medicine(
    store: &dyn MarketplaceStore,
    images: &dyn ImageStorage,
    user: &CurrentUser,
    id: Uuid,
) -> Result<MedicineEntity, AppError> {
    let medicine = store.get_medicine(id).await?;
    ensure_owner_or_admin(user, &medicine)?;

    let deleted = store.delete_available_medicine(id).await?;
    tracing::info!(medicine_id = %id, "Medicine deleted");

    if let Some(image_url) = &deleted.image_url {
        if let Err(err) = images.remove(image_url).await {
            tracing::warn!(medicine_id = %id, %image_url, "Failed to remove medicine image: {err:#}");
        }
    }

    Ok(deleted)
}
