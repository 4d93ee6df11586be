//! Batches, interactions and reminders hanging off a medicine listing.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    domain::{
        interactions::find_conflicts,
        reminders::due_reason,
        validation::{
            validate_batch_update, validate_new_batch, validate_new_interaction,
            validate_new_reminder, validate_reminder_update,
        },
    },
    dto::{
        BatchChange, CheckInteractionsReq, CreateBatchReq, CreateInteractionReq,
        CreateReminderReq, DueReminder, UpdateBatchReq, UpdateReminderReq,
    },
    infra::{app_error::AppError, middleware::CurrentUser},
    models::{
        BatchEntity, CreateBatchEntity, CreateInteractionEntity, CreateReminderEntity,
        InteractionEntity, MedicineEntity, ReminderEntity, UpdateBatchEntity,
        UpdateReminderEntity,
    },
    services::ensure_owner_or_admin,
    store::MarketplaceStore,
};

fn batch_change((batch, medicine): (BatchEntity, MedicineEntity)) -> BatchChange {
    BatchChange {
        batch,
        total_quantity: medicine.total_quantity,
    }
}

async fn owned_medicine(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
) -> Result<MedicineEntity, AppError> {
    let medicine = store.get_medicine(medicine_id).await?;
    ensure_owner_or_admin(user, &medicine)?;
    Ok(medicine)
}

// Batches

pub async fn list_batches(
    store: &dyn MarketplaceStore,
    medicine_id: Uuid,
) -> Result<Vec<BatchEntity>, AppError> {
    store.get_medicine(medicine_id).await?;
    store.list_batches(medicine_id).await
}

pub async fn add_batch(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
    req: CreateBatchReq,
) -> Result<BatchChange, AppError> {
    owned_medicine(store, user, medicine_id).await?;
    validate_new_batch(&req)?;

    let change = store
        .add_batch(CreateBatchEntity {
            medicine_id,
            quantity: req.quantity,
            expiry_date: req.expiry_date,
            condition: req.condition.as_str().into(),
        })
        .await?;

    Ok(batch_change(change))
}

pub async fn update_batch(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
    req: UpdateBatchReq,
) -> Result<BatchChange, AppError> {
    let batch = store.get_batch(id).await?;
    owned_medicine(store, user, batch.medicine_id).await?;
    validate_batch_update(&req)?;

    let change = store
        .update_batch(
            id,
            UpdateBatchEntity {
                quantity: req.quantity,
                expiry_date: req.expiry_date,
                condition: req.condition.map(|c| c.as_str().to_owned()),
            },
        )
        .await?;

    Ok(batch_change(change))
}

pub async fn delete_batch(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
) -> Result<BatchChange, AppError> {
    let batch = store.get_batch(id).await?;
    owned_medicine(store, user, batch.medicine_id).await?;
    Ok(batch_change(store.delete_batch(id).await?))
}

// Interactions

pub async fn list_interactions(
    store: &dyn MarketplaceStore,
    medicine_id: Uuid,
) -> Result<Vec<InteractionEntity>, AppError> {
    store.get_medicine(medicine_id).await?;
    store.list_interactions(medicine_id).await
}

pub async fn add_interaction(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
    req: CreateInteractionReq,
) -> Result<InteractionEntity, AppError> {
    owned_medicine(store, user, medicine_id).await?;
    validate_new_interaction(&req)?;

    store
        .add_interaction(CreateInteractionEntity {
            medicine_id,
            interacts_with: req.interacts_with.trim().to_owned(),
            severity: req.severity.as_str().into(),
            description: req.description.trim().to_owned(),
        })
        .await
}

pub async fn delete_interaction(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
) -> Result<InteractionEntity, AppError> {
    let interaction = store.get_interaction(id).await?;
    owned_medicine(store, user, interaction.medicine_id).await?;
    store.delete_interaction(id).await
}

/// Known interactions of the medicine with any of the caller's medications.
pub async fn check_interactions(
    store: &dyn MarketplaceStore,
    medicine_id: Uuid,
    req: CheckInteractionsReq,
) -> Result<Vec<InteractionEntity>, AppError> {
    let interactions = list_interactions(store, medicine_id).await?;
    Ok(find_conflicts(interactions, &req.medications))
}

// Reminders

/// The caller's reminders on one medicine.
pub async fn list_reminders(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
) -> Result<Vec<ReminderEntity>, AppError> {
    store.get_medicine(medicine_id).await?;
    let reminders = store.list_medicine_reminders(medicine_id).await?;
    Ok(reminders
        .into_iter()
        .filter(|r| r.user_id == user.id)
        .collect())
}

pub async fn add_reminder(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    medicine_id: Uuid,
    req: CreateReminderReq,
) -> Result<ReminderEntity, AppError> {
    store.get_medicine(medicine_id).await?;
    validate_new_reminder(&req)?;

    store
        .add_reminder(CreateReminderEntity {
            medicine_id,
            user_id: user.id,
            reminder_type: req.reminder_type.as_str().into(),
            threshold: req.threshold,
            frequency: req.frequency.map(|f| f.trim().to_owned()),
        })
        .await
}

async fn own_reminder(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
) -> Result<ReminderEntity, AppError> {
    let reminder = store.get_reminder(id).await?;
    if reminder.user_id != user.id {
        return Err(AppError::ForbiddenResource(
            "Reminders can only be changed by their owner".into(),
        ));
    }
    Ok(reminder)
}

pub async fn update_reminder(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
    req: UpdateReminderReq,
) -> Result<ReminderEntity, AppError> {
    let reminder = own_reminder(store, user, id).await?;
    let reminder_type = reminder
        .reminder_type()
        .ok_or_else(|| AppError::BadRequest(format!("Unknown reminder type {}", reminder.reminder_type)))?;
    validate_reminder_update(
        &req,
        reminder_type,
        reminder.threshold,
        reminder.frequency.as_deref(),
    )?;

    store
        .update_reminder(
            id,
            UpdateReminderEntity {
                threshold: req.threshold,
                frequency: req.frequency.map(|f| f.trim().to_owned()),
            },
        )
        .await
}

pub async fn delete_reminder(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
) -> Result<ReminderEntity, AppError> {
    own_reminder(store, user, id).await?;
    store.delete_reminder(id).await
}

/// The caller's reminders that fire today.
pub async fn due_reminders(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    today: NaiveDate,
) -> Result<Vec<DueReminder>, AppError> {
    let reminders = store.list_user_reminders(user.id).await?;
    Ok(reminders
        .into_iter()
        .filter_map(|(reminder, medicine)| {
            due_reason(&reminder, &medicine, today).map(|reason| DueReminder {
                reminder,
                medicine,
                reason,
            })
        })
        .collect())
}
