//! Typed HTTP client for the marketplace API, plus client-side state.
//!
//! [`MarketplaceClient`] wraps every endpoint. The containers in [`state`]
//! hold what a front end caches between calls, and the wrappers in [`stores`]
//! perform a call and then apply its outcome to a container.

pub mod state;
pub mod stores;

use reqwest::{Client, Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dto::{
        BatchChange, CheckInteractionsReq, ClaimWithMedicine, CreateBatchReq,
        CreateInteractionReq, CreateMedicineReq, CreateReminderReq, DueReminder, MedicineDetails,
        MedicineQuery, MedicineView, NotificationList, Page, RegisterUserReq, UpdateBatchReq,
        UpdateMedicineReq, UpdateReminderReq,
    },
    infra::{app_error::StdResponse, middleware::USER_ID_HEADER},
    models::{
        BatchEntity, ClaimEntity, InteractionEntity, MedicineEntity, NotificationEntity,
        ReminderEntity, UserEntity,
    },
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message} ({status})")]
    Api { status: u16, message: String },

    #[error("Response carried no data")]
    EmptyResponse,
}

impl ClientError {
    /// HTTP status of an API error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    http: Client,
    base_url: String,
    user_id: Option<Uuid>,
}

impl MarketplaceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            user_id: None,
        }
    }

    /// A copy of this client acting as `user_id`.
    pub fn as_user(&self, user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..self.clone()
        }
    }

    /// A copy of this client without an identity.
    pub fn anonymous(&self) -> Self {
        Self {
            user_id: None,
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.user_id {
            Some(id) => request.header(USER_ID_HEADER, id.to_string()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<StdResponse<serde_json::Value, String>>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: StdResponse<T, String> = response.json().await?;
        body.data.ok_or(ClientError::EmptyResponse)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::DELETE, path)).await
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, path).json(body)).await
    }

    pub async fn health(&self) -> ClientResult<String> {
        self.get("/health").await
    }

    // Users

    pub async fn register(&self, req: &RegisterUserReq) -> ClientResult<UserEntity> {
        self.with_body(Method::POST, "/users", req).await
    }

    pub async fn me(&self) -> ClientResult<UserEntity> {
        self.get("/users/me").await
    }

    pub async fn get_user(&self, id: Uuid) -> ClientResult<UserEntity> {
        self.get(&format!("/users/{id}")).await
    }

    // Medicines

    pub async fn list_medicines(&self, query: &MedicineQuery) -> ClientResult<Page<MedicineView>> {
        self.send(self.request(Method::GET, "/medicines").query(query))
            .await
    }

    pub async fn my_medicines(&self) -> ClientResult<Vec<MedicineView>> {
        self.get("/medicines/mine").await
    }

    pub async fn get_medicine(&self, id: Uuid) -> ClientResult<MedicineView> {
        self.get(&format!("/medicines/{id}")).await
    }

    pub async fn medicine_details(&self, id: Uuid) -> ClientResult<MedicineDetails> {
        self.get(&format!("/medicines/{id}/details")).await
    }

    pub async fn create_medicine(&self, req: &CreateMedicineReq) -> ClientResult<MedicineEntity> {
        self.with_body(Method::POST, "/medicines", req).await
    }

    pub async fn update_medicine(
        &self,
        id: Uuid,
        req: &UpdateMedicineReq,
    ) -> ClientResult<MedicineEntity> {
        self.with_body(Method::PATCH, &format!("/medicines/{id}"), req)
            .await
    }

    pub async fn delete_medicine(&self, id: Uuid) -> ClientResult<MedicineEntity> {
        self.delete(&format!("/medicines/{id}")).await
    }

    // Claims

    pub async fn claim_medicine(&self, id: Uuid) -> ClientResult<ClaimWithMedicine> {
        self.send(self.request(Method::POST, &format!("/medicines/{id}/claim")))
            .await
    }

    pub async fn medicine_claims(&self, id: Uuid) -> ClientResult<Vec<ClaimEntity>> {
        self.get(&format!("/medicines/{id}/claims")).await
    }

    pub async fn my_claims(&self) -> ClientResult<Vec<ClaimWithMedicine>> {
        self.get("/claims/mine").await
    }

    // Batches

    pub async fn list_batches(&self, medicine_id: Uuid) -> ClientResult<Vec<BatchEntity>> {
        self.get(&format!("/medicines/{medicine_id}/batches")).await
    }

    pub async fn add_batch(
        &self,
        medicine_id: Uuid,
        req: &CreateBatchReq,
    ) -> ClientResult<BatchChange> {
        self.with_body(Method::POST, &format!("/medicines/{medicine_id}/batches"), req)
            .await
    }

    pub async fn update_batch(&self, id: Uuid, req: &UpdateBatchReq) -> ClientResult<BatchChange> {
        self.with_body(Method::PATCH, &format!("/batches/{id}"), req)
            .await
    }

    pub async fn delete_batch(&self, id: Uuid) -> ClientResult<BatchChange> {
        self.delete(&format!("/batches/{id}")).await
    }

    // Interactions

    pub async fn list_interactions(&self, medicine_id: Uuid) -> ClientResult<Vec<InteractionEntity>> {
        self.get(&format!("/medicines/{medicine_id}/interactions"))
            .await
    }

    pub async fn add_interaction(
        &self,
        medicine_id: Uuid,
        req: &CreateInteractionReq,
    ) -> ClientResult<InteractionEntity> {
        self.with_body(
            Method::POST,
            &format!("/medicines/{medicine_id}/interactions"),
            req,
        )
        .await
    }

    pub async fn check_interactions(
        &self,
        medicine_id: Uuid,
        req: &CheckInteractionsReq,
    ) -> ClientResult<Vec<InteractionEntity>> {
        self.with_body(
            Method::POST,
            &format!("/medicines/{medicine_id}/interactions/check"),
            req,
        )
        .await
    }

    pub async fn delete_interaction(&self, id: Uuid) -> ClientResult<InteractionEntity> {
        self.delete(&format!("/interactions/{id}")).await
    }

    // Reminders

    pub async fn list_reminders(&self, medicine_id: Uuid) -> ClientResult<Vec<ReminderEntity>> {
        self.get(&format!("/medicines/{medicine_id}/reminders")).await
    }

    pub async fn add_reminder(
        &self,
        medicine_id: Uuid,
        req: &CreateReminderReq,
    ) -> ClientResult<ReminderEntity> {
        self.with_body(
            Method::POST,
            &format!("/medicines/{medicine_id}/reminders"),
            req,
        )
        .await
    }

    pub async fn update_reminder(
        &self,
        id: Uuid,
        req: &UpdateReminderReq,
    ) -> ClientResult<ReminderEntity> {
        self.with_body(Method::PATCH, &format!("/reminders/{id}"), req)
            .await
    }

    pub async fn delete_reminder(&self, id: Uuid) -> ClientResult<ReminderEntity> {
        self.delete(&format!("/reminders/{id}")).await
    }

    pub async fn due_reminders(&self) -> ClientResult<Vec<DueReminder>> {
        self.get("/reminders/due").await
    }

    // Favorites

    pub async fn list_favorites(&self) -> ClientResult<Vec<MedicineView>> {
        self.get("/favorites").await
    }

    pub async fn add_favorite(&self, medicine_id: Uuid) -> ClientResult<MedicineEntity> {
        self.send(self.request(Method::PUT, &format!("/favorites/{medicine_id}")))
            .await
    }

    pub async fn remove_favorite(&self, medicine_id: Uuid) -> ClientResult<bool> {
        self.delete(&format!("/favorites/{medicine_id}")).await
    }

    // Notifications

    pub async fn list_notifications(&self) -> ClientResult<NotificationList> {
        self.get("/notifications").await
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> ClientResult<NotificationEntity> {
        self.send(self.request(Method::PATCH, &format!("/notifications/{id}/read")))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<usize> {
        self.send(self.request(Method::PATCH, "/notifications/read-all"))
            .await
    }
}
