//! Request and response bodies exchanged over HTTP.
//!
//! These types are shared by the route handlers and by [`crate::client`], so
//! both sides of the wire agree on a single definition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{
    BatchCondition, BatchEntity, ClaimEntity, InteractionEntity, MedicineEntity, MedicineStatus,
    NotificationEntity, ReminderEntity, ReminderType, Severity, UserEntity, UserRole,
};

// Users

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RegisterUserReq {
    /// Subject issued by the identity provider at signup.
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub full_name: Option<String>,
}

// Medicines

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct CreateMedicineReq {
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, ToSchema)]
pub struct UpdateMedicineReq {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub condition: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<MedicineStatus>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Expiry,
    Name,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MedicineQuery {
    /// Case-insensitive substring of the medicine name.
    pub name: Option<String>,
    /// Case-insensitive substring of the pickup location.
    pub location: Option<String>,
    /// Case-insensitive substring of the name or the description.
    pub q: Option<String>,
    pub status: Option<MedicineStatus>,
    pub sort: Option<SortOrder>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// A medicine with its expiry state computed for the current day.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct MedicineView {
    pub medicine: MedicineEntity,
    pub expired: bool,
    pub days_until_expiry: i64,
    pub claimable: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct MedicineDetails {
    pub medicine: MedicineView,
    pub batches: Vec<BatchEntity>,
    pub interactions: Vec<InteractionEntity>,
    pub reminders: Vec<ReminderEntity>,
    pub donor: Option<UserEntity>,
}

// Claims

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ClaimWithMedicine {
    pub claim: ClaimEntity,
    pub medicine: MedicineEntity,
}

// Batches, interactions, reminders

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct CreateBatchReq {
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub condition: BatchCondition,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, ToSchema)]
pub struct UpdateBatchReq {
    pub quantity: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub condition: Option<BatchCondition>,
}

/// A batch write together with the recomputed total of its medicine.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct BatchChange {
    pub batch: BatchEntity,
    pub total_quantity: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct CreateInteractionReq {
    pub interacts_with: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct CheckInteractionsReq {
    /// Names of the medications the caller is already taking.
    pub medications: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct CreateReminderReq {
    pub reminder_type: ReminderType,
    pub threshold: Option<i32>,
    pub frequency: Option<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, ToSchema)]
pub struct UpdateReminderReq {
    pub threshold: Option<i32>,
    pub frequency: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct DueReminder {
    pub reminder: ReminderEntity,
    pub medicine: MedicineEntity,
    pub reason: String,
}

// Notifications

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct NotificationList {
    pub notifications: Vec<NotificationEntity>,
    pub unread_count: usize,
}
