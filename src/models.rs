use chrono::{DateTime, NaiveDate, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Declares a closed set of values persisted as `TEXT` columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "{} is not a valid {}",
                        other,
                        stringify!($name)
                    )),
                }
            }
        }
    };
}

text_enum!(
    /// Role stored in the application's own users table.
    UserRole {
        Donor => "donor",
        Claimer => "claimer",
        Admin => "admin",
    }
);

text_enum!(MedicineStatus {
    Available => "available",
    Claimed => "claimed",
    Expired => "expired",
});

text_enum!(
    /// Inserted as `pending` and never transitioned.
    ClaimStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

text_enum!(BatchCondition {
    New => "new",
    Used => "used",
    Expired => "expired",
});

text_enum!(
    /// Ordered from least to most severe.
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

text_enum!(ReminderType {
    Expiry => "expiry",
    LowStock => "low_stock",
    Dosage => "dosage",
});

text_enum!(NotificationType {
    Claim => "claim",
    Update => "update",
    Message => "message",
    Favorite => "favorite",
});

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
        }
    }
}

// Users

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    /// Unknown role strings are treated as having no role at all.
    pub fn role(&self) -> Option<UserRole> {
        self.role.parse().ok()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub full_name: Option<String>,
}

// Medicines

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::medicines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MedicineEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub total_quantity: i32,
    pub expiry_date: NaiveDate,
    pub condition: String,
    pub image_url: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub posted_by: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicineEntity {
    pub fn status(&self) -> Option<MedicineStatus> {
        self.status.parse().ok()
    }

    pub fn is_available(&self) -> bool {
        self.status() == Some(MedicineStatus::Available)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::medicines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateMedicineEntity {
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub condition: String,
    pub image_url: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub posted_by: Uuid,
    pub status: String,
}

#[derive(AsChangeset, Default, Debug, Clone)]
#[diesel(table_name = crate::schema::medicines)]
pub struct UpdateMedicineEntity {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub condition: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<String>,
}

// Claims

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::claims)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClaimEntity {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub claimer_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::claims)]
pub struct CreateClaimEntity {
    pub medicine_id: Uuid,
    pub claimer_id: Uuid,
    pub status: String,
}

// Batches

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::medicine_batches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BatchEntity {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub condition: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::medicine_batches)]
pub struct CreateBatchEntity {
    pub medicine_id: Uuid,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub condition: String,
}

#[derive(AsChangeset, Default, Debug, Clone)]
#[diesel(table_name = crate::schema::medicine_batches)]
pub struct UpdateBatchEntity {
    pub quantity: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub condition: Option<String>,
}

// Interactions

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::medicine_interactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InteractionEntity {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub interacts_with: String,
    pub severity: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl InteractionEntity {
    pub fn severity(&self) -> Severity {
        self.severity.parse().unwrap_or(Severity::Low)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::medicine_interactions)]
pub struct CreateInteractionEntity {
    pub medicine_id: Uuid,
    pub interacts_with: String,
    pub severity: String,
    pub description: String,
}

// Reminders

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::medicine_reminders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReminderEntity {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub user_id: Uuid,
    pub reminder_type: String,
    pub threshold: Option<i32>,
    pub frequency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderEntity {
    pub fn reminder_type(&self) -> Option<ReminderType> {
        self.reminder_type.parse().ok()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::medicine_reminders)]
pub struct CreateReminderEntity {
    pub medicine_id: Uuid,
    pub user_id: Uuid,
    pub reminder_type: String,
    pub threshold: Option<i32>,
    pub frequency: Option<String>,
}

#[derive(AsChangeset, Default, Debug, Clone)]
#[diesel(table_name = crate::schema::medicine_reminders)]
pub struct UpdateReminderEntity {
    pub threshold: Option<i32>,
    pub frequency: Option<String>,
}

// Favorites

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::favorites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FavoriteEntity {
    pub user_id: Uuid,
    pub medicine_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::favorites)]
pub struct CreateFavoriteEntity {
    pub user_id: Uuid,
    pub medicine_id: Uuid,
}

// Notifications

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub medicine_id: Option<Uuid>,
    pub claim_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::notifications)]
pub struct CreateNotificationEntity {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub medicine_id: Option<Uuid>,
    pub claim_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_enums_round_trip_through_their_column_text() {
        for status in MedicineStatus::ALL {
            assert_eq!(status.as_str().parse::<MedicineStatus>(), Ok(*status));
        }
        assert_eq!("low_stock".parse::<ReminderType>(), Ok(ReminderType::LowStock));
        assert!("archived".parse::<MedicineStatus>().is_err());
    }

    #[test]
    fn serde_uses_the_column_text() {
        let json = serde_json::to_string(&ReminderType::LowStock).unwrap();
        assert_eq!(json, "\"low_stock\"");
        let role: UserRole = serde_json::from_str("\"claimer\"").unwrap();
        assert_eq!(role, UserRole::Claimer);
    }

    #[test]
    fn severity_ranks_are_ordered() {
        assert!(Severity::High.rank() > Severity::Medium.rank());
        assert!(Severity::Medium.rank() > Severity::Low.rank());
    }
}
