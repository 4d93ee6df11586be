use chrono::NaiveDate;

use crate::{
    domain::expiry::days_until_expiry,
    models::{MedicineEntity, ReminderEntity, ReminderType},
};

/// Stock counted against low-stock thresholds: the batch total once batches exist.
pub fn effective_stock(medicine: &MedicineEntity) -> i32 {
    if medicine.total_quantity > 0 {
        medicine.total_quantity
    } else {
        medicine.quantity
    }
}

/// Returns why `reminder` is due today, or `None` when it is not.
///
/// Dosage reminders describe a schedule rather than an alert and are never due.
pub fn due_reason(
    reminder: &ReminderEntity,
    medicine: &MedicineEntity,
    today: NaiveDate,
) -> Option<String> {
    let threshold = i64::from(reminder.threshold?);

    match reminder.reminder_type()? {
        ReminderType::Expiry => {
            let days = days_until_expiry(medicine.expiry_date, today);
            if days < 0 {
                Some(format!("{} expired {} days ago", medicine.name, -days))
            } else if days <= threshold {
                Some(format!("{} expires in {} days", medicine.name, days))
            } else {
                None
            }
        }
        ReminderType::LowStock => {
            let stock = effective_stock(medicine);
            (i64::from(stock) <= threshold)
                .then(|| format!("{} is down to {} units", medicine.name, stock))
        }
        ReminderType::Dosage => None,
    }
}
