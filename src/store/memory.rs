use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::{catalog, expiry::is_expired},
    dto::{ClaimWithMedicine, MedicineQuery, Page},
    infra::app_error::AppError,
    models::{
        BatchEntity, ClaimEntity, ClaimStatus, CreateBatchEntity, CreateInteractionEntity,
        CreateMedicineEntity, CreateNotificationEntity, CreateReminderEntity, CreateUserEntity,
        FavoriteEntity, InteractionEntity, MedicineEntity, MedicineStatus, NotificationEntity,
        ReminderEntity, UpdateBatchEntity, UpdateMedicineEntity, UpdateReminderEntity, UserEntity,
    },
    store::{MarketplaceStore, StoreResult, claim_rejection, unavailable_rejection},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserEntity>,
    medicines: HashMap<Uuid, MedicineEntity>,
    claims: HashMap<Uuid, ClaimEntity>,
    batches: HashMap<Uuid, BatchEntity>,
    interactions: HashMap<Uuid, InteractionEntity>,
    reminders: HashMap<Uuid, ReminderEntity>,
    favorites: Vec<FavoriteEntity>,
    notifications: HashMap<Uuid, NotificationEntity>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing so that "newest first" orderings are total.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + TimeDelta::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn medicine(&self, id: Uuid) -> StoreResult<&MedicineEntity> {
        self.medicines.get(&id).ok_or(AppError::NotFound)
    }

    fn recompute_total_quantity(&mut self, medicine_id: Uuid) -> StoreResult<MedicineEntity> {
        let total: i64 = self
            .batches
            .values()
            .filter(|b| b.medicine_id == medicine_id)
            .map(|b| i64::from(b.quantity))
            .sum();
        let now = self.now();
        let medicine = self
            .medicines
            .get_mut(&medicine_id)
            .ok_or(AppError::NotFound)?;
        medicine.total_quantity = i32::try_from(total).unwrap_or(i32::MAX);
        medicine.updated_at = now;
        Ok(medicine.clone())
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

/// In-process store used for local development and tests.
///
/// A single lock guards every table, so each trait method is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketplaceStore for MemoryStore {
    async fn create_user(&self, user: CreateUserEntity) -> StoreResult<UserEntity> {
        let mut tables = self.tables.write().await;

        let email_taken = tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email));
        if tables.users.contains_key(&user.id) || email_taken {
            return Err(AppError::Conflict("Resource already exists".into()));
        }

        let now = tables.now();
        let user = UserEntity {
            id: user.id,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserEntity>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_medicines(&self, query: &MedicineQuery) -> StoreResult<Page<MedicineEntity>> {
        let tables = self.tables.read().await;
        Ok(catalog::apply(query, tables.medicines.values().cloned()))
    }

    async fn list_user_medicines(&self, user_id: Uuid) -> StoreResult<Vec<MedicineEntity>> {
        let tables = self.tables.read().await;
        let mut medicines: Vec<MedicineEntity> = tables
            .medicines
            .values()
            .filter(|m| m.posted_by == user_id)
            .cloned()
            .collect();
        newest_first(&mut medicines, |m| m.created_at);
        Ok(medicines)
    }

    async fn get_medicine(&self, id: Uuid) -> StoreResult<MedicineEntity> {
        self.tables.read().await.medicine(id).cloned()
    }

    async fn create_medicine(&self, medicine: CreateMedicineEntity) -> StoreResult<MedicineEntity> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&medicine.posted_by) {
            return Err(AppError::NotFound);
        }

        let now = tables.now();
        let medicine = MedicineEntity {
            id: Uuid::new_v4(),
            name: medicine.name,
            description: medicine.description,
            quantity: medicine.quantity,
            total_quantity: 0,
            expiry_date: medicine.expiry_date,
            condition: medicine.condition,
            image_url: medicine.image_url,
            location: medicine.location,
            latitude: medicine.latitude,
            longitude: medicine.longitude,
            posted_by: medicine.posted_by,
            status: medicine.status,
            created_at: now,
            updated_at: now,
        };
        tables.medicines.insert(medicine.id, medicine.clone());
        Ok(medicine)
    }

    async fn update_available_medicine(
        &self,
        id: Uuid,
        changes: UpdateMedicineEntity,
    ) -> StoreResult<MedicineEntity> {
        let mut tables = self.tables.write().await;
        let current = tables.medicines.get(&id);
        if !current.is_some_and(MedicineEntity::is_available) {
            return Err(unavailable_rejection(current, "edited"));
        }

        let now = tables.now();
        let medicine = tables.medicines.get_mut(&id).ok_or(AppError::NotFound)?;
        let UpdateMedicineEntity {
            name,
            description,
            quantity,
            expiry_date,
            condition,
            image_url,
            location,
            latitude,
            longitude,
            status,
        } = changes;
        if let Some(name) = name {
            medicine.name = name;
        }
        if let Some(description) = description {
            medicine.description = description;
        }
        if let Some(quantity) = quantity {
            medicine.quantity = quantity;
        }
        if let Some(expiry_date) = expiry_date {
            medicine.expiry_date = expiry_date;
        }
        if let Some(condition) = condition {
            medicine.condition = condition;
        }
        if image_url.is_some() {
            medicine.image_url = image_url;
        }
        if let Some(location) = location {
            medicine.location = location;
        }
        if latitude.is_some() {
            medicine.latitude = latitude;
        }
        if longitude.is_some() {
            medicine.longitude = longitude;
        }
        if let Some(status) = status {
            medicine.status = status;
        }
        medicine.updated_at = now;
        Ok(medicine.clone())
    }

    async fn delete_available_medicine(&self, id: Uuid) -> StoreResult<MedicineEntity> {
        let mut tables = self.tables.write().await;
        let current = tables.medicines.get(&id);
        if !current.is_some_and(MedicineEntity::is_available) {
            return Err(unavailable_rejection(current, "deleted"));
        }

        let medicine = tables.medicines.remove(&id).ok_or(AppError::NotFound)?;
        let removed_claims: Vec<Uuid> = tables
            .claims
            .values()
            .filter(|c| c.medicine_id == id)
            .map(|c| c.id)
            .collect();
        tables.claims.retain(|_, c| c.medicine_id != id);
        tables.batches.retain(|_, b| b.medicine_id != id);
        tables.interactions.retain(|_, i| i.medicine_id != id);
        tables.reminders.retain(|_, r| r.medicine_id != id);
        tables.favorites.retain(|f| f.medicine_id != id);
        for notification in tables.notifications.values_mut() {
            if notification.medicine_id == Some(id) {
                notification.medicine_id = None;
            }
            if notification
                .claim_id
                .is_some_and(|claim_id| removed_claims.contains(&claim_id))
            {
                notification.claim_id = None;
            }
        }
        Ok(medicine)
    }

    async fn claim_medicine(
        &self,
        medicine_id: Uuid,
        claimer_id: Uuid,
        today: NaiveDate,
    ) -> StoreResult<(ClaimEntity, MedicineEntity)> {
        let mut tables = self.tables.write().await;
        let current = tables.medicines.get(&medicine_id);
        let claimable =
            current.is_some_and(|m| m.is_available() && !is_expired(m.expiry_date, today));
        if !claimable {
            return Err(claim_rejection(current, today));
        }
        if tables.claims.values().any(|c| c.medicine_id == medicine_id) {
            return Err(AppError::Conflict("Medicine has already been claimed".into()));
        }

        let now = tables.now();
        let medicine = tables
            .medicines
            .get_mut(&medicine_id)
            .ok_or(AppError::NotFound)?;
        medicine.status = MedicineStatus::Claimed.as_str().into();
        medicine.updated_at = now;
        let medicine = medicine.clone();

        let claim = ClaimEntity {
            id: Uuid::new_v4(),
            medicine_id,
            claimer_id,
            status: ClaimStatus::Pending.as_str().into(),
            created_at: now,
            updated_at: now,
        };
        tables.claims.insert(claim.id, claim.clone());

        Ok((claim, medicine))
    }

    async fn list_user_claims(&self, claimer_id: Uuid) -> StoreResult<Vec<ClaimWithMedicine>> {
        let tables = self.tables.read().await;
        let mut claims: Vec<ClaimWithMedicine> = tables
            .claims
            .values()
            .filter(|c| c.claimer_id == claimer_id)
            .filter_map(|c| {
                tables.medicines.get(&c.medicine_id).map(|m| ClaimWithMedicine {
                    claim: c.clone(),
                    medicine: m.clone(),
                })
            })
            .collect();
        newest_first(&mut claims, |c| c.claim.created_at);
        Ok(claims)
    }

    async fn list_medicine_claims(&self, medicine_id: Uuid) -> StoreResult<Vec<ClaimEntity>> {
        let tables = self.tables.read().await;
        let mut claims: Vec<ClaimEntity> = tables
            .claims
            .values()
            .filter(|c| c.medicine_id == medicine_id)
            .cloned()
            .collect();
        claims.sort_by_key(|c| c.created_at);
        Ok(claims)
    }

    async fn list_batches(&self, medicine_id: Uuid) -> StoreResult<Vec<BatchEntity>> {
        let tables = self.tables.read().await;
        let mut batches: Vec<BatchEntity> = tables
            .batches
            .values()
            .filter(|b| b.medicine_id == medicine_id)
            .cloned()
            .collect();
        batches.sort_by_key(|b| (b.expiry_date, b.created_at));
        Ok(batches)
    }

    async fn get_batch(&self, id: Uuid) -> StoreResult<BatchEntity> {
        let tables = self.tables.read().await;
        tables.batches.get(&id).cloned().ok_or(AppError::NotFound)
    }

    async fn add_batch(
        &self,
        batch: CreateBatchEntity,
    ) -> StoreResult<(BatchEntity, MedicineEntity)> {
        let mut tables = self.tables.write().await;
        tables.medicine(batch.medicine_id)?;

        let now = tables.now();
        let batch = BatchEntity {
            id: Uuid::new_v4(),
            medicine_id: batch.medicine_id,
            quantity: batch.quantity,
            expiry_date: batch.expiry_date,
            condition: batch.condition,
            created_at: now,
            updated_at: now,
        };
        tables.batches.insert(batch.id, batch.clone());
        let medicine = tables.recompute_total_quantity(batch.medicine_id)?;
        Ok((batch, medicine))
    }

    async fn update_batch(
        &self,
        id: Uuid,
        changes: UpdateBatchEntity,
    ) -> StoreResult<(BatchEntity, MedicineEntity)> {
        let mut tables = self.tables.write().await;
        let now = tables.now();

        let batch = tables.batches.get_mut(&id).ok_or(AppError::NotFound)?;
        if let Some(quantity) = changes.quantity {
            batch.quantity = quantity;
        }
        if let Some(expiry_date) = changes.expiry_date {
            batch.expiry_date = expiry_date;
        }
        if let Some(condition) = changes.condition {
            batch.condition = condition;
        }
        batch.updated_at = now;
        let batch = batch.clone();

        let medicine = tables.recompute_total_quantity(batch.medicine_id)?;
        Ok((batch, medicine))
    }

    async fn delete_batch(&self, id: Uuid) -> StoreResult<(BatchEntity, MedicineEntity)> {
        let mut tables = self.tables.write().await;
        let batch = tables.batches.remove(&id).ok_or(AppError::NotFound)?;
        let medicine = tables.recompute_total_quantity(batch.medicine_id)?;
        Ok((batch, medicine))
    }

    async fn list_interactions(&self, medicine_id: Uuid) -> StoreResult<Vec<InteractionEntity>> {
        let tables = self.tables.read().await;
        let mut interactions: Vec<InteractionEntity> = tables
            .interactions
            .values()
            .filter(|i| i.medicine_id == medicine_id)
            .cloned()
            .collect();
        interactions.sort_by_key(|i| i.created_at);
        Ok(interactions)
    }

    async fn get_interaction(&self, id: Uuid) -> StoreResult<InteractionEntity> {
        let tables = self.tables.read().await;
        tables.interactions.get(&id).cloned().ok_or(AppError::NotFound)
    }

    async fn add_interaction(
        &self,
        interaction: CreateInteractionEntity,
    ) -> StoreResult<InteractionEntity> {
        let mut tables = self.tables.write().await;
        tables.medicine(interaction.medicine_id)?;

        let now = tables.now();
        let interaction = InteractionEntity {
            id: Uuid::new_v4(),
            medicine_id: interaction.medicine_id,
            interacts_with: interaction.interacts_with,
            severity: interaction.severity,
            description: interaction.description,
            created_at: now,
        };
        tables.interactions.insert(interaction.id, interaction.clone());
        Ok(interaction)
    }

    async fn delete_interaction(&self, id: Uuid) -> StoreResult<InteractionEntity> {
        let mut tables = self.tables.write().await;
        tables.interactions.remove(&id).ok_or(AppError::NotFound)
    }

    async fn list_medicine_reminders(&self, medicine_id: Uuid) -> StoreResult<Vec<ReminderEntity>> {
        let tables = self.tables.read().await;
        let mut reminders: Vec<ReminderEntity> = tables
            .reminders
            .values()
            .filter(|r| r.medicine_id == medicine_id)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.created_at);
        Ok(reminders)
    }

    async fn list_user_reminders(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<(ReminderEntity, MedicineEntity)>> {
        let tables = self.tables.read().await;
        let mut reminders: Vec<(ReminderEntity, MedicineEntity)> = tables
            .reminders
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                tables
                    .medicines
                    .get(&r.medicine_id)
                    .map(|m| (r.clone(), m.clone()))
            })
            .collect();
        reminders.sort_by_key(|(r, _)| r.created_at);
        Ok(reminders)
    }

    async fn get_reminder(&self, id: Uuid) -> StoreResult<ReminderEntity> {
        let tables = self.tables.read().await;
        tables.reminders.get(&id).cloned().ok_or(AppError::NotFound)
    }

    async fn add_reminder(&self, reminder: CreateReminderEntity) -> StoreResult<ReminderEntity> {
        let mut tables = self.tables.write().await;
        tables.medicine(reminder.medicine_id)?;

        let now = tables.now();
        let reminder = ReminderEntity {
            id: Uuid::new_v4(),
            medicine_id: reminder.medicine_id,
            user_id: reminder.user_id,
            reminder_type: reminder.reminder_type,
            threshold: reminder.threshold,
            frequency: reminder.frequency,
            created_at: now,
            updated_at: now,
        };
        tables.reminders.insert(reminder.id, reminder.clone());
        Ok(reminder)
    }

    async fn update_reminder(
        &self,
        id: Uuid,
        changes: UpdateReminderEntity,
    ) -> StoreResult<ReminderEntity> {
        let mut tables = self.tables.write().await;
        let now = tables.now();

        let reminder = tables.reminders.get_mut(&id).ok_or(AppError::NotFound)?;
        if changes.threshold.is_some() {
            reminder.threshold = changes.threshold;
        }
        if changes.frequency.is_some() {
            reminder.frequency = changes.frequency;
        }
        reminder.updated_at = now;
        Ok(reminder.clone())
    }

    async fn delete_reminder(&self, id: Uuid) -> StoreResult<ReminderEntity> {
        let mut tables = self.tables.write().await;
        tables.reminders.remove(&id).ok_or(AppError::NotFound)
    }

    async fn add_favorite(&self, user_id: Uuid, medicine_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.medicine(medicine_id)?;

        let exists = tables
            .favorites
            .iter()
            .any(|f| f.user_id == user_id && f.medicine_id == medicine_id);
        if !exists {
            let created_at = tables.now();
            tables.favorites.push(FavoriteEntity {
                user_id,
                medicine_id,
                created_at,
            });
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, medicine_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.user_id == user_id && f.medicine_id == medicine_id));
        Ok(tables.favorites.len() < before)
    }

    async fn list_favorites(&self, user_id: Uuid) -> StoreResult<Vec<MedicineEntity>> {
        let tables = self.tables.read().await;
        let mut favorites: Vec<&FavoriteEntity> = tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .collect();
        newest_first(&mut favorites, |f| f.created_at);
        Ok(favorites
            .into_iter()
            .filter_map(|f| tables.medicines.get(&f.medicine_id).cloned())
            .collect())
    }

    async fn create_notification(
        &self,
        notification: CreateNotificationEntity,
    ) -> StoreResult<NotificationEntity> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let notification = NotificationEntity {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            read: false,
            medicine_id: notification.medicine_id,
            claim_id: notification.claim_id,
            created_at: now,
        };
        tables.notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<NotificationEntity>> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<NotificationEntity> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut notifications, |n| n.created_at);
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<NotificationEntity> {
        let mut tables = self.tables.write().await;
        let notification = tables
            .notifications
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .ok_or(AppError::NotFound)?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        let mut updated = 0;
        for notification in tables.notifications.values_mut() {
            if notification.user_id == user_id && !notification.read {
                notification.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{models::UserRole, store::conformance};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    async fn user(store: &MemoryStore, email: &str, role: UserRole) -> UserEntity {
        store
            .create_user(CreateUserEntity {
                id: Uuid::new_v4(),
                email: email.into(),
                role: role.as_str().into(),
                full_name: None,
            })
            .await
            .unwrap()
    }

    async fn medicine(store: &MemoryStore, donor: Uuid, expiry: NaiveDate) -> MedicineEntity {
        store
            .create_medicine(CreateMedicineEntity {
                name: "Paracetamol".into(),
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

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        user(&store, "donor@example.com", UserRole::Donor).await;

        let err = store
            .create_user(CreateUserEntity {
                id: Uuid::new_v4(),
                email: "DONOR@example.com".into(),
                role: "claimer".into(),
                full_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn claim_flips_status_and_records_pending_claim() {
        conformance::claim_flips_status_and_records_one_pending_claim(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn failed_claims_are_classified() {
        conformance::claim_rejections_are_classified(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        conformance::concurrent_claims_have_exactly_one_winner(Arc::new(MemoryStore::new())).await;
    }

    #[tokio::test]
    async fn batch_writes_keep_total_quantity_in_sync() {
        conformance::batch_writes_keep_total_quantity_in_sync(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn deleting_a_medicine_cascades() {
        let store = MemoryStore::new();
        conformance::delete_cascades_and_detaches_notifications(&store).await;
        let page = store.list_medicines(&MedicineQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_literal() {
        conformance::search_is_case_insensitive_and_literal(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn claimed_medicine_cannot_be_edited_or_deleted() {
        let store = MemoryStore::new();
        let donor = user(&store, "donor@example.com", UserRole::Donor).await;
        let claimer = user(&store, "claimer@example.com", UserRole::Claimer).await;
        let m = medicine(&store, donor.id, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).await;
        store.claim_medicine(m.id, claimer.id, today()).await.unwrap();

        let edit = store
            .update_available_medicine(m.id, UpdateMedicineEntity::default())
            .await;
        assert!(matches!(edit, Err(AppError::Conflict(_))));
        let delete = store.delete_available_medicine(m.id).await;
        assert!(matches!(delete, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn favorites_are_idempotent() {
        let store = MemoryStore::new();
        let donor = user(&store, "donor@example.com", UserRole::Donor).await;
        let m = medicine(&store, donor.id, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).await;

        store.add_favorite(donor.id, m.id).await.unwrap();
        store.add_favorite(donor.id, m.id).await.unwrap();
        assert_eq!(store.list_favorites(donor.id).await.unwrap().len(), 1);
        assert!(store.remove_favorite(donor.id, m.id).await.unwrap());
        assert!(!store.remove_favorite(donor.id, m.id).await.unwrap());
    }

    #[tokio::test]
    async fn notifications_only_mark_the_owners() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let n = store
            .create_notification(CreateNotificationEntity {
                user_id: owner,
                notification_type: "claim".into(),
                title: "Medicine claimed".into(),
                message: "Someone claimed your listing".into(),
                medicine_id: None,
                claim_id: None,
            })
            .await
            .unwrap();

        let stranger = store.mark_notification_read(n.id, Uuid::new_v4()).await;
        assert!(matches!(stranger, Err(AppError::NotFound)));
        assert_eq!(store.mark_all_notifications_read(owner).await.unwrap(), 1);
        assert_eq!(store.mark_all_notifications_read(owner).await.unwrap(), 0);
    }
}
