//! Persistence seam of the marketplace.
//!
//! [`MarketplaceStore`] is data access only: authorization and validation live
//! in [`crate::services`]. Multi-row writes (claiming, batch aggregates,
//! cascading deletes) are atomic in every implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{
    domain::expiry::is_expired,
    dto::{ClaimWithMedicine, MedicineQuery, Page},
    infra::app_error::AppError,
    models::{
        BatchEntity, ClaimEntity, CreateBatchEntity, CreateInteractionEntity,
        CreateMedicineEntity, CreateNotificationEntity, CreateReminderEntity, CreateUserEntity,
        InteractionEntity, MedicineEntity, MedicineStatus, NotificationEntity, ReminderEntity,
        UpdateBatchEntity, UpdateMedicineEntity, UpdateReminderEntity, UserEntity,
    },
};

pub type StoreResult<T> = Result<T, AppError>;

#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    // Users

    async fn create_user(&self, user: CreateUserEntity) -> StoreResult<UserEntity>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserEntity>>;

    // Medicines

    async fn list_medicines(&self, query: &MedicineQuery) -> StoreResult<Page<MedicineEntity>>;
    /// Listings posted by `user_id`, newest first.
    async fn list_user_medicines(&self, user_id: Uuid) -> StoreResult<Vec<MedicineEntity>>;
    async fn get_medicine(&self, id: Uuid) -> StoreResult<MedicineEntity>;
    async fn create_medicine(&self, medicine: CreateMedicineEntity) -> StoreResult<MedicineEntity>;
    /// Applies `changes` only while the medicine is still available.
    async fn update_available_medicine(
        &self,
        id: Uuid,
        changes: UpdateMedicineEntity,
    ) -> StoreResult<MedicineEntity>;
    /// Deletes the medicine and everything hanging off it, only while still available.
    async fn delete_available_medicine(&self, id: Uuid) -> StoreResult<MedicineEntity>;

    // Claims

    /// Flips `available -> claimed` and records a pending claim as one atomic step.
    ///
    /// Fails with `Conflict` when the medicine is no longer available or its
    /// expiry date is on or before `today`, and with `NotFound` when it does not exist.
    async fn claim_medicine(
        &self,
        medicine_id: Uuid,
        claimer_id: Uuid,
        today: NaiveDate,
    ) -> StoreResult<(ClaimEntity, MedicineEntity)>;
    /// Claims made by `claimer_id`, newest first.
    async fn list_user_claims(&self, claimer_id: Uuid) -> StoreResult<Vec<ClaimWithMedicine>>;
    async fn list_medicine_claims(&self, medicine_id: Uuid) -> StoreResult<Vec<ClaimEntity>>;

    // Batches. Every write recomputes the medicine's total_quantity in the same step.

    async fn list_batches(&self, medicine_id: Uuid) -> StoreResult<Vec<BatchEntity>>;
    async fn get_batch(&self, id: Uuid) -> StoreResult<BatchEntity>;
    async fn add_batch(&self, batch: CreateBatchEntity)
    -> StoreResult<(BatchEntity, MedicineEntity)>;
    async fn update_batch(
        &self,
        id: Uuid,
        changes: UpdateBatchEntity,
    ) -> StoreResult<(BatchEntity, MedicineEntity)>;
    async fn delete_batch(&self, id: Uuid) -> StoreResult<(BatchEntity, MedicineEntity)>;

    // Interactions

    async fn list_interactions(&self, medicine_id: Uuid) -> StoreResult<Vec<InteractionEntity>>;
    async fn get_interaction(&self, id: Uuid) -> StoreResult<InteractionEntity>;
    async fn add_interaction(
        &self,
        interaction: CreateInteractionEntity,
    ) -> StoreResult<InteractionEntity>;
    async fn delete_interaction(&self, id: Uuid) -> StoreResult<InteractionEntity>;

    // Reminders

    async fn list_medicine_reminders(&self, medicine_id: Uuid) -> StoreResult<Vec<ReminderEntity>>;
    async fn list_user_reminders(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<(ReminderEntity, MedicineEntity)>>;
    async fn get_reminder(&self, id: Uuid) -> StoreResult<ReminderEntity>;
    async fn add_reminder(&self, reminder: CreateReminderEntity) -> StoreResult<ReminderEntity>;
    async fn update_reminder(
        &self,
        id: Uuid,
        changes: UpdateReminderEntity,
    ) -> StoreResult<ReminderEntity>;
    async fn delete_reminder(&self, id: Uuid) -> StoreResult<ReminderEntity>;

    // Favorites

    /// Idempotent.
    async fn add_favorite(&self, user_id: Uuid, medicine_id: Uuid) -> StoreResult<()>;
    /// Returns whether a favorite was removed.
    async fn remove_favorite(&self, user_id: Uuid, medicine_id: Uuid) -> StoreResult<bool>;
    async fn list_favorites(&self, user_id: Uuid) -> StoreResult<Vec<MedicineEntity>>;

    // Notifications

    async fn create_notification(
        &self,
        notification: CreateNotificationEntity,
    ) -> StoreResult<NotificationEntity>;
    /// Newest first.
    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<NotificationEntity>>;
    /// `NotFound` unless the notification belongs to `user_id`.
    async fn mark_notification_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<NotificationEntity>;
    /// Returns how many notifications changed.
    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<usize>;
}

/// Explains why a claim compare-and-swap matched nothing.
pub(crate) fn claim_rejection(current: Option<&MedicineEntity>, today: NaiveDate) -> AppError {
    match current {
        None => AppError::NotFound,
        Some(m) if m.status() == Some(MedicineStatus::Claimed) => {
            AppError::Conflict("Medicine has already been claimed".into())
        }
        Some(m) if !m.is_available() => {
            AppError::Conflict(format!("Medicine is not available (status: {})", m.status))
        }
        Some(m) if is_expired(m.expiry_date, today) => {
            AppError::Conflict("Medicine has expired and cannot be claimed".into())
        }
        Some(_) => AppError::Conflict("Medicine could not be claimed".into()),
    }
}

/// Explains why a write guarded on `status = available` matched nothing.
pub(crate) fn unavailable_rejection(current: Option<&MedicineEntity>, action: &str) -> AppError {
    match current {
        None => AppError::NotFound,
        Some(m) => AppError::Conflict(format!(
            "Only available listings can be {action} (status: {})",
            m.status
        )),
    }
}

/// Behaviour every [`MarketplaceStore`] must share, run against each backend.
#[cfg(test)]
pub(crate) mod conformance {
    use std::sync::Arc;

    use super::*;
    use crate::models::UserRole;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn next_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    /// Emails are unique per call so the checks can share a database.
    pub async fn user(store: &dyn MarketplaceStore, role: UserRole) -> UserEntity {
        let id = Uuid::new_v4();
        store
            .create_user(CreateUserEntity {
                id,
                email: format!("{}-{id}@example.com", role.as_str()),
                role: role.as_str().into(),
                full_name: None,
            })
            .await
            .unwrap()
    }

    pub async fn medicine(
        store: &dyn MarketplaceStore,
        donor: Uuid,
        name: &str,
        expiry: NaiveDate,
    ) -> MedicineEntity {
        store
            .create_medicine(CreateMedicineEntity {
                name: name.into(),
                description: "Sealed strip of 500mg tablets".into(),
                quantity: 10,
                expiry_date: expiry,
                condition: "new".into(),
                image_url: None,
                location: "City A".into(),
                latitude: None,
                longitude: None,
                posted_by: donor,
                status: MedicineStatus::Available.as_str().into(),
            })
            .await
            .unwrap()
    }

    pub async fn claim_flips_status_and_records_one_pending_claim(store: &dyn MarketplaceStore) {
        let donor = user(store, UserRole::Donor).await;
        let claimer = user(store, UserRole::Claimer).await;
        let m = medicine(store, donor.id, "Paracetamol", next_year()).await;

        let (claim, claimed) = store.claim_medicine(m.id, claimer.id, today()).await.unwrap();
        assert_eq!(claim.status, "pending");
        assert_eq!(claim.medicine_id, m.id);
        assert_eq!(claimed.status, "claimed");

        let again = store.claim_medicine(m.id, claimer.id, today()).await.unwrap_err();
        assert!(matches!(again, AppError::Conflict(ref msg) if msg.contains("already been claimed")));
        assert_eq!(store.list_medicine_claims(m.id).await.unwrap().len(), 1);
        assert_eq!(store.list_user_claims(claimer.id).await.unwrap().len(), 1);
    }

    pub async fn claim_rejections_are_classified(store: &dyn MarketplaceStore) {
        let donor = user(store, UserRole::Donor).await;
        let claimer = user(store, UserRole::Claimer).await;

        let missing = store.claim_medicine(Uuid::new_v4(), claimer.id, today()).await;
        assert!(matches!(missing, Err(AppError::NotFound)));

        let expiring = medicine(store, donor.id, "Ibuprofen", today()).await;
        let err = store
            .claim_medicine(expiring.id, claimer.id, today())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("expired")));
        assert_eq!(store.get_medicine(expiring.id).await.unwrap().status, "available");
        assert!(store.list_medicine_claims(expiring.id).await.unwrap().is_empty());
    }

    pub async fn concurrent_claims_have_exactly_one_winner(store: Arc<dyn MarketplaceStore>) {
        let donor = user(store.as_ref(), UserRole::Donor).await;
        let m = medicine(store.as_ref(), donor.id, "Amoxicillin", next_year()).await;

        let medicine_id = m.id;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let claimer = user(store.as_ref(), UserRole::Claimer).await;
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.claim_medicine(medicine_id, claimer.id, today()).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(err) => assert!(matches!(err, AppError::Conflict(_))),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.list_medicine_claims(m.id).await.unwrap().len(), 1);
    }

    pub async fn batch_writes_keep_total_quantity_in_sync(store: &dyn MarketplaceStore) {
        let donor = user(store, UserRole::Donor).await;
        let m = medicine(store, donor.id, "Cetirizine", next_year()).await;
        let expiry = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let batch = |quantity| CreateBatchEntity {
            medicine_id: m.id,
            quantity,
            expiry_date: expiry,
            condition: "new".into(),
        };
        let (first, _) = store.add_batch(batch(4)).await.unwrap();
        let (_, after_add) = store.add_batch(batch(6)).await.unwrap();
        assert_eq!(after_add.total_quantity, 10);

        let (_, after_update) = store
            .update_batch(
                first.id,
                UpdateBatchEntity {
                    quantity: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after_update.total_quantity, 7);

        let (_, after_delete) = store.delete_batch(first.id).await.unwrap();
        assert_eq!(after_delete.total_quantity, 6);
        assert_eq!(store.get_medicine(m.id).await.unwrap().total_quantity, 6);
    }

    pub async fn delete_cascades_and_detaches_notifications(store: &dyn MarketplaceStore) {
        let donor = user(store, UserRole::Donor).await;
        let fan = user(store, UserRole::Claimer).await;
        let m = medicine(store, donor.id, "Loratadine", next_year()).await;
        store.add_favorite(fan.id, m.id).await.unwrap();
        store
            .add_batch(CreateBatchEntity {
                medicine_id: m.id,
                quantity: 3,
                expiry_date: next_year(),
                condition: "new".into(),
            })
            .await
            .unwrap();
        let notification = store
            .create_notification(CreateNotificationEntity {
                user_id: fan.id,
                notification_type: "update".into(),
                title: "Listing updated".into(),
                message: "A medicine you follow changed".into(),
                medicine_id: Some(m.id),
                claim_id: None,
            })
            .await
            .unwrap();

        store.delete_available_medicine(m.id).await.unwrap();

        assert!(matches!(store.get_medicine(m.id).await, Err(AppError::NotFound)));
        assert!(store.list_favorites(fan.id).await.unwrap().is_empty());
        assert!(store.list_batches(m.id).await.unwrap().is_empty());
        assert!(store.list_user_medicines(donor.id).await.unwrap().is_empty());

        let kept = store.list_notifications(fan.id).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, notification.id);
        assert_eq!(kept[0].medicine_id, None);
    }

    pub async fn search_is_case_insensitive_and_literal(store: &dyn MarketplaceStore) {
        let donor = user(store, UserRole::Donor).await;
        let tag = Uuid::new_v4().simple().to_string();
        let m = medicine(store, donor.id, &format!("Paracetamol 500mg {tag}"), next_year()).await;

        let by_name = store
            .list_medicines(&MedicineQuery {
                name: Some(tag.to_uppercase()),
                location: Some("city a".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.total, 1);
        assert_eq!(by_name.items[0].id, m.id);

        let wildcard = store
            .list_medicines(&MedicineQuery {
                name: Some(tag.clone()),
                q: Some("50%".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(wildcard.total, 0);
    }
}
