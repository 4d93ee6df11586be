//! Client-side state containers.
//!
//! Each container changes only through its `apply` function, one action at a
//! time. Nothing here performs I/O.

use uuid::Uuid;

use crate::{
    dto::{MedicineView, NotificationList},
    models::{MedicineStatus, NotificationEntity, UserEntity},
};

// Medicines

#[derive(Debug, Clone, Default)]
pub struct MedicinesState {
    pub medicines: Vec<MedicineView>,
    /// Status the loaded list was filtered on, if any.
    pub filter: Option<MedicineStatus>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum MedicinesAction {
    Loading,
    Loaded {
        medicines: Vec<MedicineView>,
        filter: Option<MedicineStatus>,
    },
    Created(MedicineView),
    Updated(MedicineView),
    Claimed(Uuid),
    Deleted(Uuid),
    Failed(String),
}

impl MedicinesState {
    fn admits(&self, medicine: &MedicineView) -> bool {
        self.filter
            .is_none_or(|status| medicine.medicine.status == status.as_str())
    }

    pub fn apply(&mut self, action: MedicinesAction) {
        match action {
            MedicinesAction::Loading => {
                self.loading = true;
                self.error = None;
            }
            MedicinesAction::Loaded { medicines, filter } => {
                self.medicines = medicines;
                self.filter = filter;
                self.loading = false;
                self.error = None;
            }
            MedicinesAction::Created(medicine) => {
                if self.admits(&medicine) {
                    self.medicines.insert(0, medicine);
                }
            }
            MedicinesAction::Updated(medicine) => {
                let admitted = self.admits(&medicine);
                let position = self
                    .medicines
                    .iter()
                    .position(|m| m.medicine.id == medicine.medicine.id);
                match (position, admitted) {
                    (Some(i), true) => self.medicines[i] = medicine,
                    (Some(i), false) => {
                        self.medicines.remove(i);
                    }
                    (None, _) => {}
                }
            }
            MedicinesAction::Claimed(id) => {
                let drop_claimed = self.filter == Some(MedicineStatus::Available);
                if drop_claimed {
                    self.medicines.retain(|m| m.medicine.id != id);
                } else if let Some(view) = self.medicines.iter_mut().find(|m| m.medicine.id == id) {
                    view.medicine.status = MedicineStatus::Claimed.as_str().into();
                    view.claimable = false;
                }
            }
            MedicinesAction::Deleted(id) => {
                self.medicines.retain(|m| m.medicine.id != id);
            }
            MedicinesAction::Failed(error) => {
                self.loading = false;
                self.error = Some(error);
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&MedicineView> {
        self.medicines.iter().find(|m| m.medicine.id == id)
    }
}

// Favorites

#[derive(Debug, Clone, Default)]
pub struct FavoritesState {
    pub favorites: Vec<MedicineView>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum FavoritesAction {
    Loading,
    Loaded(Vec<MedicineView>),
    Added(MedicineView),
    Removed(Uuid),
    Failed(String),
}

impl FavoritesState {
    pub fn apply(&mut self, action: FavoritesAction) {
        match action {
            FavoritesAction::Loading => {
                self.loading = true;
                self.error = None;
            }
            FavoritesAction::Loaded(favorites) => {
                self.favorites = favorites;
                self.loading = false;
                self.error = None;
            }
            FavoritesAction::Added(medicine) => {
                if !self.is_favorite(medicine.medicine.id) {
                    self.favorites.insert(0, medicine);
                }
            }
            FavoritesAction::Removed(id) => {
                self.favorites.retain(|m| m.medicine.id != id);
            }
            FavoritesAction::Failed(error) => {
                self.loading = false;
                self.error = Some(error);
            }
        }
    }

    pub fn is_favorite(&self, medicine_id: Uuid) -> bool {
        self.favorites.iter().any(|m| m.medicine.id == medicine_id)
    }
}

// Notifications

#[derive(Debug, Clone, Default)]
pub struct NotificationsState {
    pub notifications: Vec<NotificationEntity>,
    pub unread_count: usize,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum NotificationsAction {
    Loading,
    Loaded(NotificationList),
    Added(NotificationEntity),
    MarkedRead(Uuid),
    AllRead,
    Failed(String),
}

impl NotificationsState {
    pub fn apply(&mut self, action: NotificationsAction) {
        match action {
            NotificationsAction::Loading => {
                self.loading = true;
                self.error = None;
            }
            NotificationsAction::Loaded(list) => {
                self.notifications = list.notifications;
                self.unread_count = list.unread_count;
                self.loading = false;
                self.error = None;
            }
            NotificationsAction::Added(notification) => {
                if self.notifications.iter().any(|n| n.id == notification.id) {
                    return;
                }
                if !notification.read {
                    self.unread_count += 1;
                }
                self.notifications.insert(0, notification);
            }
            NotificationsAction::MarkedRead(id) => {
                if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
                    if !n.read {
                        n.read = true;
                        self.unread_count = self.unread_count.saturating_sub(1);
                    }
                }
            }
            NotificationsAction::AllRead => {
                for n in &mut self.notifications {
                    n.read = true;
                }
                self.unread_count = 0;
            }
            NotificationsAction::Failed(error) => {
                self.loading = false;
                self.error = Some(error);
            }
        }
    }
}

// Session

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<UserEntity>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SessionAction {
    SignedIn(UserEntity),
    SignedOut,
    Failed(String),
}

impl SessionState {
    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::SignedIn(user) => {
                self.user = Some(user);
                self.error = None;
            }
            SessionAction::SignedOut => {
                self.user = None;
                self.error = None;
            }
            SessionAction::Failed(error) => self.error = Some(error),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::{domain::expiry, models::MedicineEntity};

    fn view(status: MedicineStatus) -> MedicineView {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let medicine = MedicineEntity {
            id: Uuid::new_v4(),
            name: "Ibuprofen".into(),
            description: "Half a box of 200mg tablets".into(),
            quantity: 8,
            total_quantity: 0,
            expiry_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            condition: "used".into(),
            image_url: None,
            location: "City C".into(),
            latitude: None,
            longitude: None,
            posted_by: Uuid::new_v4(),
            status: status.as_str().into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        expiry::view(medicine, today)
    }

    fn notification(read: bool) -> NotificationEntity {
        NotificationEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            notification_type: "claim".into(),
            title: "Medicine claimed".into(),
            message: "Your listing was claimed".into(),
            read,
            medicine_id: None,
            claim_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn claimed_medicine_leaves_an_available_list() {
        let first = view(MedicineStatus::Available);
        let second = view(MedicineStatus::Available);
        let mut state = MedicinesState::default();
        state.apply(MedicinesAction::Loaded {
            medicines: vec![first.clone(), second.clone()],
            filter: Some(MedicineStatus::Available),
        });

        state.apply(MedicinesAction::Claimed(first.medicine.id));

        assert!(state.get(first.medicine.id).is_none());
        assert!(state.get(second.medicine.id).is_some());
    }

    #[test]
    fn claimed_medicine_is_relabelled_in_an_unfiltered_list() {
        let medicine = view(MedicineStatus::Available);
        let mut state = MedicinesState::default();
        state.apply(MedicinesAction::Loaded {
            medicines: vec![medicine.clone()],
            filter: None,
        });

        state.apply(MedicinesAction::Claimed(medicine.medicine.id));

        let stored = state.get(medicine.medicine.id).unwrap();
        assert_eq!(stored.medicine.status, "claimed");
        assert!(!stored.claimable);
    }

    #[test]
    fn created_and_deleted_medicines() {
        let mut state = MedicinesState::default();
        state.apply(MedicinesAction::Loaded {
            medicines: vec![view(MedicineStatus::Available)],
            filter: Some(MedicineStatus::Available),
        });
        let created = view(MedicineStatus::Available);

        state.apply(MedicinesAction::Created(created.clone()));
        assert_eq!(state.medicines[0].medicine.id, created.medicine.id);

        state.apply(MedicinesAction::Created(view(MedicineStatus::Expired)));
        assert_eq!(state.medicines.len(), 2);

        state.apply(MedicinesAction::Deleted(created.medicine.id));
        assert_eq!(state.medicines.len(), 1);
    }

    #[test]
    fn failure_clears_loading_and_keeps_the_list() {
        let mut state = MedicinesState::default();
        state.apply(MedicinesAction::Loaded {
            medicines: vec![view(MedicineStatus::Available)],
            filter: None,
        });
        state.apply(MedicinesAction::Loading);
        state.apply(MedicinesAction::Failed("Request failed".into()));

        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Request failed"));
        assert_eq!(state.medicines.len(), 1);
    }

    #[test]
    fn favorites_never_hold_duplicates() {
        let medicine = view(MedicineStatus::Available);
        let mut state = FavoritesState::default();

        state.apply(FavoritesAction::Added(medicine.clone()));
        state.apply(FavoritesAction::Added(medicine.clone()));
        assert_eq!(state.favorites.len(), 1);
        assert!(state.is_favorite(medicine.medicine.id));

        state.apply(FavoritesAction::Removed(medicine.medicine.id));
        assert!(!state.is_favorite(medicine.medicine.id));
    }

    #[test]
    fn unread_count_never_goes_negative() {
        let unread = notification(false);
        let read = notification(true);
        let mut state = NotificationsState::default();
        state.apply(NotificationsAction::Loaded(NotificationList {
            notifications: vec![unread.clone(), read.clone()],
            unread_count: 1,
        }));

        state.apply(NotificationsAction::MarkedRead(unread.id));
        state.apply(NotificationsAction::MarkedRead(unread.id));
        state.apply(NotificationsAction::MarkedRead(read.id));
        assert_eq!(state.unread_count, 0);

        state.apply(NotificationsAction::Added(notification(false)));
        assert_eq!(state.unread_count, 1);
        state.apply(NotificationsAction::AllRead);
        assert_eq!(state.unread_count, 0);
        assert!(state.notifications.iter().all(|n| n.read));
    }

    #[test]
    fn session_signs_in_and_out() {
        let mut state = SessionState::default();
        state.apply(SessionAction::SignedIn(UserEntity {
            id: Uuid::new_v4(),
            email: "dana@example.com".into(),
            role: "donor".into(),
            full_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }));
        assert!(state.is_signed_in());

        state.apply(SessionAction::SignedOut);
        assert!(!state.is_signed_in());
    }
}
