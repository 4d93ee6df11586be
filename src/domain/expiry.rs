use chrono::NaiveDate;

use crate::{dto::MedicineView, models::MedicineEntity};

/// A medicine expiring today already counts as expired.
pub fn is_expired(expiry_date: NaiveDate, today: NaiveDate) -> bool {
    expiry_date <= today
}

pub fn days_until_expiry(expiry_date: NaiveDate, today: NaiveDate) -> i64 {
    (expiry_date - today).num_days()
}

/// Claimable means stored as available and not yet expired, whatever the stored status says.
pub fn is_claimable(medicine: &MedicineEntity, today: NaiveDate) -> bool {
    medicine.is_available() && !is_expired(medicine.expiry_date, today)
}

pub fn view(medicine: MedicineEntity, today: NaiveDate) -> MedicineView {
    MedicineView {
        expired: is_expired(medicine.expiry_date, today),
        days_until_expiry: days_until_expiry(medicine.expiry_date, today),
        claimable: is_claimable(&medicine, today),
        medicine,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::MedicineStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn medicine(expiry_date: NaiveDate, status: MedicineStatus) -> MedicineEntity {
        MedicineEntity {
            id: Uuid::new_v4(),
            name: "Amoxicillin".into(),
            description: "Unopened box of capsules".into(),
            quantity: 1,
            total_quantity: 0,
            expiry_date,
            condition: "new".into(),
            image_url: None,
            location: "City B".into(),
            latitude: None,
            longitude: None,
            posted_by: Uuid::new_v4(),
            status: status.as_str().into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive_of_today() {
        let today = date(2025, 3, 10);
        assert!(is_expired(date(2025, 3, 9), today));
        assert!(is_expired(today, today));
        assert!(!is_expired(date(2025, 3, 11), today));
    }

    #[test]
    fn days_until_expiry_can_be_negative() {
        let today = date(2025, 3, 10);
        assert_eq!(days_until_expiry(date(2025, 4, 9), today), 30);
        assert_eq!(days_until_expiry(date(2025, 3, 5), today), -5);
    }

    #[test]
    fn past_expiry_is_never_claimable_even_when_stored_available() {
        let today = date(2025, 3, 10);
        let stale = medicine(date(2024, 12, 31), MedicineStatus::Available);
        assert!(!is_claimable(&stale, today));

        let view = view(stale, today);
        assert!(view.expired);
        assert!(!view.claimable);
    }

    #[test]
    fn claimed_medicine_is_not_claimable() {
        let today = date(2025, 3, 10);
        assert!(!is_claimable(
            &medicine(date(2099, 1, 1), MedicineStatus::Claimed),
            today
        ));
        assert!(is_claimable(
            &medicine(date(2099, 1, 1), MedicineStatus::Available),
            today
        ));
    }
}
