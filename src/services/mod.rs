//! Marketplace workflows: role checks, ownership checks and validation in
//! front of the [`MarketplaceStore`](crate::store::MarketplaceStore).

pub mod claims;
pub mod details;
pub mod favorites;
pub mod medicines;
pub mod notifications;
pub mod users;

use chrono::{NaiveDate, Utc};

use crate::{
    infra::{app_error::AppError, middleware::CurrentUser},
    models::{MedicineEntity, UserRole},
};

/// The calendar day expiry is evaluated against.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn ensure_role(user: &CurrentUser, allowed: &[UserRole], action: &str) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }

    Err(AppError::ForbiddenResource(format!(
        "Users with role {} cannot {action}",
        user.role
    )))
}

pub(crate) fn ensure_owner_or_admin(user: &CurrentUser, medicine: &MedicineEntity) -> Result<(), AppError> {
    if medicine.posted_by == user.id || user.is_admin() {
        return Ok(());
    }

    Err(AppError::ForbiddenResource(
        "Only the donor who posted this medicine can change it".into(),
    ))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use crate::{
        dto::CreateMedicineReq,
        infra::middleware::CurrentUser,
        models::{CreateUserEntity, UserRole},
        store::{MarketplaceStore, MemoryStore},
    };

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    pub async fn register(store: &MemoryStore, email: &str, role: UserRole) -> CurrentUser {
        let user = store
            .create_user(CreateUserEntity {
                id: Uuid::new_v4(),
                email: email.into(),
                role: role.as_str().into(),
                full_name: None,
            })
            .await
            .unwrap();
        CurrentUser::try_from(user).unwrap()
    }

    pub fn paracetamol() -> CreateMedicineReq {
        CreateMedicineReq {
            name: "Paracetamol 500mg".into(),
            description: "Sealed blister pack of ten tablets".into(),
            quantity: 10,
            expiry_date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            condition: None,
            image_url: None,
            location: "City A".into(),
            latitude: None,
            longitude: None,
        }
    }
}
