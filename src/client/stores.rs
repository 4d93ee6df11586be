//! Remote calls paired with their state containers.
//!
//! Every operation performs the call, applies the outcome to the container and
//! hands the result back. Failures are recorded as a readable message in the
//! container and also returned.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    client::{
        ClientResult, MarketplaceClient,
        state::{
            FavoritesAction, FavoritesState, MedicinesAction, MedicinesState, NotificationsAction,
            NotificationsState, SessionAction, SessionState,
        },
    },
    domain::expiry,
    dto::{
        ClaimWithMedicine, CreateMedicineReq, MedicineQuery, MedicineView, RegisterUserReq,
        UpdateMedicineReq,
    },
    models::{MedicineEntity, MedicineStatus, UserEntity},
};

fn view(medicine: MedicineEntity) -> MedicineView {
    expiry::view(medicine, Utc::now().date_naive())
}

pub struct MedicinesStore {
    client: MarketplaceClient,
    state: MedicinesState,
}

impl MedicinesStore {
    pub fn new(client: MarketplaceClient) -> Self {
        Self {
            client,
            state: MedicinesState::default(),
        }
    }

    pub fn state(&self) -> &MedicinesState {
        &self.state
    }

    fn record<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            self.state.apply(MedicinesAction::Failed(err.to_string()));
        }
        result
    }

    /// Loads one page of listings matching `query`.
    pub async fn fetch(&mut self, query: MedicineQuery) -> ClientResult<()> {
        self.state.apply(MedicinesAction::Loading);
        let result = self.client.list_medicines(&query).await;
        let page = self.record(result)?;
        self.state.apply(MedicinesAction::Loaded {
            medicines: page.items,
            filter: query.status,
        });
        Ok(())
    }

    /// Loads the first page of listings that can still be claimed.
    pub async fn fetch_available(&mut self) -> ClientResult<()> {
        self.fetch(MedicineQuery {
            status: Some(MedicineStatus::Available),
            ..Default::default()
        })
        .await
    }

    pub async fn create(&mut self, req: &CreateMedicineReq) -> ClientResult<MedicineEntity> {
        let result = self.client.create_medicine(req).await;
        let medicine = self.record(result)?;
        self.state.apply(MedicinesAction::Created(view(medicine.clone())));
        Ok(medicine)
    }

    pub async fn update(&mut self, id: Uuid, req: &UpdateMedicineReq) -> ClientResult<MedicineEntity> {
        let result = self.client.update_medicine(id, req).await;
        let medicine = self.record(result)?;
        self.state.apply(MedicinesAction::Updated(view(medicine.clone())));
        Ok(medicine)
    }

    pub async fn claim(&mut self, id: Uuid) -> ClientResult<ClaimWithMedicine> {
        let result = self.client.claim_medicine(id).await;
        let claimed = self.record(result)?;
        self.state.apply(MedicinesAction::Claimed(id));
        Ok(claimed)
    }

    pub async fn delete(&mut self, id: Uuid) -> ClientResult<MedicineEntity> {
        let result = self.client.delete_medicine(id).await;
        let deleted = self.record(result)?;
        self.state.apply(MedicinesAction::Deleted(id));
        Ok(deleted)
    }
}

pub struct FavoritesStore {
    client: MarketplaceClient,
    state: FavoritesState,
}

impl FavoritesStore {
    pub fn new(client: MarketplaceClient) -> Self {
        Self {
            client,
            state: FavoritesState::default(),
        }
    }

    pub fn state(&self) -> &FavoritesState {
        &self.state
    }

    fn record<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            self.state.apply(FavoritesAction::Failed(err.to_string()));
        }
        result
    }

    pub async fn fetch(&mut self) -> ClientResult<()> {
        self.state.apply(FavoritesAction::Loading);
        let result = self.client.list_favorites().await;
        let favorites = self.record(result)?;
        self.state.apply(FavoritesAction::Loaded(favorites));
        Ok(())
    }

    pub async fn add(&mut self, medicine_id: Uuid) -> ClientResult<()> {
        let result = self.client.add_favorite(medicine_id).await;
        let medicine = self.record(result)?;
        self.state.apply(FavoritesAction::Added(view(medicine)));
        Ok(())
    }

    pub async fn remove(&mut self, medicine_id: Uuid) -> ClientResult<()> {
        let result = self.client.remove_favorite(medicine_id).await;
        self.record(result)?;
        self.state.apply(FavoritesAction::Removed(medicine_id));
        Ok(())
    }

    pub async fn toggle(&mut self, medicine_id: Uuid) -> ClientResult<()> {
        if self.state.is_favorite(medicine_id) {
            self.remove(medicine_id).await
        } else {
            self.add(medicine_id).await
        }
    }
}

pub struct NotificationsStore {
    client: MarketplaceClient,
    state: NotificationsState,
}

impl NotificationsStore {
    pub fn new(client: MarketplaceClient) -> Self {
        Self {
            client,
            state: NotificationsState::default(),
        }
    }

    pub fn state(&self) -> &NotificationsState {
        &self.state
    }

    fn record<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            self.state.apply(NotificationsAction::Failed(err.to_string()));
        }
        result
    }

    pub async fn fetch(&mut self) -> ClientResult<()> {
        self.state.apply(NotificationsAction::Loading);
        let result = self.client.list_notifications().await;
        let list = self.record(result)?;
        self.state.apply(NotificationsAction::Loaded(list));
        Ok(())
    }

    pub async fn mark_read(&mut self, id: Uuid) -> ClientResult<()> {
        let result = self.client.mark_notification_read(id).await;
        self.record(result)?;
        self.state.apply(NotificationsAction::MarkedRead(id));
        Ok(())
    }

    pub async fn mark_all_read(&mut self) -> ClientResult<()> {
        let result = self.client.mark_all_notifications_read().await;
        self.record(result)?;
        self.state.apply(NotificationsAction::AllRead);
        Ok(())
    }
}

/// Tracks who the client acts as. Sign-in itself happens at the identity
/// provider; this store only attaches the resulting identity.
pub struct SessionStore {
    client: MarketplaceClient,
    state: SessionState,
}

impl SessionStore {
    pub fn new(client: MarketplaceClient) -> Self {
        Self {
            client,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The client acting as the signed-in user, or anonymously when signed out.
    pub fn client(&self) -> &MarketplaceClient {
        &self.client
    }

    fn record<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            self.state.apply(SessionAction::Failed(err.to_string()));
        }
        result
    }

    /// Creates the profile for a freshly signed-up identity and signs in as it.
    pub async fn register(&mut self, req: &RegisterUserReq) -> ClientResult<UserEntity> {
        let result = self.client.anonymous().register(req).await;
        self.record(result)?;
        self.sign_in(req.id).await
    }

    /// Attaches `user_id` and loads its profile; the identity is dropped again if that fails.
    pub async fn sign_in(&mut self, user_id: Uuid) -> ClientResult<UserEntity> {
        let client = self.client.as_user(user_id);
        let result = client.me().await;
        let user = self.record(result)?;
        self.client = client;
        self.state.apply(SessionAction::SignedIn(user.clone()));
        Ok(user)
    }

    pub fn sign_out(&mut self) {
        self.client = self.client.anonymous();
        self.state.apply(SessionAction::SignedOut);
    }
}
