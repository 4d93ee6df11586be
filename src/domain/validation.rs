//! Field rules applied before anything is written.
//!
//! Every validator collects all failures instead of stopping at the first one,
//! so a form can highlight each offending field at once.

use std::fmt;

use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{
        CreateBatchReq, CreateInteractionReq, CreateMedicineReq, CreateReminderReq,
        RegisterUserReq, UpdateBatchReq, UpdateMedicineReq, UpdateReminderReq,
    },
    models::{MedicineEntity, MedicineStatus, ReminderType, UserRole},
};

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MIN_LOCATION_LEN: usize = 2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    if char_len(name) < MIN_NAME_LEN {
        errors.push("name", "Medication name must be at least 3 characters");
    }
}

fn check_description(errors: &mut ValidationErrors, description: &str) {
    if char_len(description) < MIN_DESCRIPTION_LEN {
        errors.push("description", "Description must be at least 10 characters");
    }
}

fn check_quantity(errors: &mut ValidationErrors, field: &str, quantity: i32) {
    if quantity < 1 {
        errors.push(field, "Quantity must be at least 1");
    }
}

fn check_expiry(errors: &mut ValidationErrors, expiry_date: NaiveDate, today: NaiveDate) {
    if expiry_date <= today {
        errors.push("expiry_date", "Expiry date must be in the future");
    }
}

fn check_location(errors: &mut ValidationErrors, location: &str) {
    if char_len(location) < MIN_LOCATION_LEN {
        errors.push("location", "Location must be at least 2 characters");
    }
}

fn check_image_url(errors: &mut ValidationErrors, image_url: Option<&str>) {
    let Some(raw) = image_url.map(str::trim).filter(|url| !url.is_empty()) else {
        return;
    };

    let valid = Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false);

    if !valid {
        errors.push("image_url", "Invalid URL");
    }
}

fn check_coordinates(errors: &mut ValidationErrors, latitude: Option<f64>, longitude: Option<f64>) {
    match (latitude, longitude) {
        (None, None) => {}
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                errors.push("latitude", "Latitude must be between -90 and 90");
            }
            if !(-180.0..=180.0).contains(&lng) {
                errors.push("longitude", "Longitude must be between -180 and 180");
            }
        }
        _ => errors.push(
            "latitude",
            "Latitude and longitude must be provided together",
        ),
    }
}

fn check_condition(errors: &mut ValidationErrors, condition: Option<&str>) {
    if condition.is_some_and(|c| c.trim().is_empty()) {
        errors.push("condition", "Condition cannot be empty");
    }
}

pub fn validate_new_medicine(
    req: &CreateMedicineReq,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_name(&mut errors, &req.name);
    check_description(&mut errors, &req.description);
    check_quantity(&mut errors, "quantity", req.quantity);
    check_expiry(&mut errors, req.expiry_date, today);
    check_location(&mut errors, &req.location);
    check_image_url(&mut errors, req.image_url.as_deref());
    check_coordinates(&mut errors, req.latitude, req.longitude);
    check_condition(&mut errors, req.condition.as_deref());
    errors.into_result()
}

/// Only the provided fields are checked. A coordinate sent on its own is
/// paired with the listing's stored counterpart.
pub fn validate_medicine_update(
    req: &UpdateMedicineReq,
    current: &MedicineEntity,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Some(name) = &req.name {
        check_name(&mut errors, name);
    }
    if let Some(description) = &req.description {
        check_description(&mut errors, description);
    }
    if let Some(quantity) = req.quantity {
        check_quantity(&mut errors, "quantity", quantity);
    }
    if let Some(expiry_date) = req.expiry_date {
        check_expiry(&mut errors, expiry_date, today);
    }
    if let Some(location) = &req.location {
        check_location(&mut errors, location);
    }
    check_image_url(&mut errors, req.image_url.as_deref());
    if req.latitude.is_some() || req.longitude.is_some() {
        check_coordinates(
            &mut errors,
            req.latitude.or(current.latitude),
            req.longitude.or(current.longitude),
        );
    }
    check_condition(&mut errors, req.condition.as_deref());
    if req.status == Some(MedicineStatus::Claimed) {
        errors.push(
            "status",
            "Status can only be set to available or expired",
        );
    }
    errors.into_result()
}

pub fn validate_registration(req: &RegisterUserReq) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let email = req.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed {
        errors.push("email", "Invalid email address");
    }
    if req.role == UserRole::Admin {
        errors.push("role", "Only donor or claimer roles can be chosen at signup");
    }
    errors.into_result()
}

pub fn validate_new_batch(req: &CreateBatchReq) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_quantity(&mut errors, "quantity", req.quantity);
    errors.into_result()
}

pub fn validate_batch_update(req: &UpdateBatchReq) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Some(quantity) = req.quantity {
        check_quantity(&mut errors, "quantity", quantity);
    }
    errors.into_result()
}

pub fn validate_new_interaction(req: &CreateInteractionReq) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if req.interacts_with.trim().is_empty() {
        errors.push("interacts_with", "Interacting medication is required");
    }
    if req.description.trim().is_empty() {
        errors.push("description", "Description is required");
    }
    errors.into_result()
}

fn check_reminder_fields(
    errors: &mut ValidationErrors,
    reminder_type: ReminderType,
    threshold: Option<i32>,
    frequency: Option<&str>,
) {
    match reminder_type {
        ReminderType::Expiry | ReminderType::LowStock => {
            if threshold.is_none_or(|t| t < 1) {
                errors.push("threshold", "Threshold must be at least 1");
            }
        }
        ReminderType::Dosage => {
            if frequency.is_none_or(|f| f.trim().is_empty()) {
                errors.push("frequency", "Frequency is required for dosage reminders");
            }
        }
    }
}

pub fn validate_new_reminder(req: &CreateReminderReq) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_reminder_fields(
        &mut errors,
        req.reminder_type,
        req.threshold,
        req.frequency.as_deref(),
    );
    errors.into_result()
}

/// Checks an update against the reminder's existing type, keeping unchanged fields.
pub fn validate_reminder_update(
    req: &UpdateReminderReq,
    reminder_type: ReminderType,
    current_threshold: Option<i32>,
    current_frequency: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_reminder_fields(
        &mut errors,
        reminder_type,
        req.threshold.or(current_threshold),
        req.frequency.as_deref().or(current_frequency),
    );
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn paracetamol() -> CreateMedicineReq {
        CreateMedicineReq {
            name: "Paracetamol 500mg".into(),
            description: "Sealed blister pack, 10 tablets".into(),
            quantity: 10,
            expiry_date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            condition: None,
            image_url: None,
            location: "City A".into(),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn accepts_a_complete_listing() {
        assert_eq!(validate_new_medicine(&paracetamol(), today()), Ok(()));
    }

    #[test]
    fn rejects_short_name_and_description() {
        let req = CreateMedicineReq {
            name: "Ab".into(),
            description: "too short".into(),
            ..paracetamol()
        };
        let errors = validate_new_medicine(&req, today()).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("description"));
        assert_eq!(errors.errors.len(), 2);
    }

    #[test]
    fn rejects_quantity_below_one() {
        let req = CreateMedicineReq {
            quantity: 0,
            ..paracetamol()
        };
        assert!(validate_new_medicine(&req, today()).unwrap_err().has("quantity"));
    }

    #[test]
    fn expiry_must_be_strictly_in_the_future() {
        let on_the_day = CreateMedicineReq {
            expiry_date: today(),
            ..paracetamol()
        };
        assert!(
            validate_new_medicine(&on_the_day, today())
                .unwrap_err()
                .has("expiry_date")
        );

        let tomorrow = CreateMedicineReq {
            expiry_date: today().succ_opt().unwrap(),
            ..paracetamol()
        };
        assert_eq!(validate_new_medicine(&tomorrow, today()), Ok(()));
    }

    #[test]
    fn image_url_must_be_http_when_present() {
        let empty = CreateMedicineReq {
            image_url: Some(String::new()),
            ..paracetamol()
        };
        assert_eq!(validate_new_medicine(&empty, today()), Ok(()));

        let bogus = CreateMedicineReq {
            image_url: Some("not a url".into()),
            ..paracetamol()
        };
        assert!(validate_new_medicine(&bogus, today()).unwrap_err().has("image_url"));

        let ftp = CreateMedicineReq {
            image_url: Some("ftp://files.example.com/a.jpg".into()),
            ..paracetamol()
        };
        assert!(validate_new_medicine(&ftp, today()).is_err());
    }

    #[test]
    fn coordinates_come_in_pairs_within_range() {
        let half = CreateMedicineReq {
            latitude: Some(10.0),
            ..paracetamol()
        };
        assert!(validate_new_medicine(&half, today()).is_err());

        let out_of_range = CreateMedicineReq {
            latitude: Some(91.0),
            longitude: Some(0.0),
            ..paracetamol()
        };
        assert!(
            validate_new_medicine(&out_of_range, today())
                .unwrap_err()
                .has("latitude")
        );
    }

    fn listed(latitude: Option<f64>, longitude: Option<f64>) -> MedicineEntity {
        let req = paracetamol();
        MedicineEntity {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            total_quantity: 0,
            expiry_date: req.expiry_date,
            condition: "new".into(),
            image_url: None,
            location: req.location,
            latitude,
            longitude,
            posted_by: Uuid::new_v4(),
            status: MedicineStatus::Available.as_str().into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn location_needs_two_visible_characters() {
        for location in ["A", "   ", " B "] {
            let req = CreateMedicineReq {
                location: location.into(),
                ..paracetamol()
            };
            let errors = validate_new_medicine(&req, today()).unwrap_err();
            assert_eq!(
                errors.errors,
                vec![FieldError {
                    field: "location".into(),
                    message: "Location must be at least 2 characters".into(),
                }]
            );
        }

        let two = CreateMedicineReq {
            location: "NY".into(),
            ..paracetamol()
        };
        assert_eq!(validate_new_medicine(&two, today()), Ok(()));

        let update = UpdateMedicineReq {
            location: Some("A".into()),
            ..Default::default()
        };
        assert!(
            validate_medicine_update(&update, &listed(None, None), today())
                .unwrap_err()
                .has("location")
        );
    }

    #[test]
    fn single_coordinate_update_pairs_with_the_stored_one() {
        let req = UpdateMedicineReq {
            latitude: Some(45.5),
            ..Default::default()
        };
        assert_eq!(
            validate_medicine_update(&req, &listed(Some(40.0), Some(-73.9)), today()),
            Ok(())
        );
        assert!(validate_medicine_update(&req, &listed(None, None), today()).is_err());

        let out_of_range = UpdateMedicineReq {
            longitude: Some(200.0),
            ..Default::default()
        };
        assert!(
            validate_medicine_update(&out_of_range, &listed(Some(40.0), Some(-73.9)), today())
                .unwrap_err()
                .has("longitude")
        );
    }

    #[test]
    fn update_checks_only_provided_fields() {
        assert_eq!(
            validate_medicine_update(&UpdateMedicineReq::default(), &listed(None, None), today()),
            Ok(())
        );

        let req = UpdateMedicineReq {
            name: Some("x".into()),
            status: Some(MedicineStatus::Claimed),
            ..Default::default()
        };
        let errors = validate_medicine_update(&req, &listed(None, None), today()).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("status"));
    }

    #[test]
    fn admins_cannot_self_register() {
        let req = RegisterUserReq {
            id: Uuid::new_v4(),
            email: "root@example.com".into(),
            role: UserRole::Admin,
            full_name: None,
        };
        assert!(validate_registration(&req).unwrap_err().has("role"));

        let req = RegisterUserReq {
            email: "no-at-sign".into(),
            role: UserRole::Donor,
            ..req
        };
        assert!(validate_registration(&req).unwrap_err().has("email"));
    }

    #[test]
    fn reminders_need_the_field_matching_their_type() {
        let expiry = CreateReminderReq {
            reminder_type: ReminderType::Expiry,
            threshold: Some(0),
            frequency: None,
        };
        assert!(validate_new_reminder(&expiry).unwrap_err().has("threshold"));

        let dosage = CreateReminderReq {
            reminder_type: ReminderType::Dosage,
            threshold: None,
            frequency: Some("Every 8 hours".into()),
        };
        assert_eq!(validate_new_reminder(&dosage), Ok(()));

        let update = UpdateReminderReq {
            threshold: None,
            frequency: Some("  ".into()),
        };
        assert!(
            validate_reminder_update(&update, ReminderType::Dosage, None, Some("Daily")).is_err()
        );
    }

    #[test]
    fn display_joins_messages() {
        let mut errors = ValidationErrors::default();
        errors.push("name", "first");
        errors.push("quantity", "second");
        assert_eq!(errors.to_string(), "first; second");
    }
}
