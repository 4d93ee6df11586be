use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use medshare::{
    api::images::NoopImageStorage,
    client::{
        ClientError, MarketplaceClient,
        stores::{FavoritesStore, MedicinesStore, NotificationsStore, SessionStore},
    },
    dto::{CreateBatchReq, CreateMedicineReq, MedicineQuery, RegisterUserReq, SortOrder},
    infra::app_state::AppState,
    models::{BatchCondition, MedicineStatus, UserRole},
    routes,
    store::MemoryStore,
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

fn state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), Arc::new(NoopImageStorage))
}

async fn spawn_app() -> MarketplaceClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::app(state());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MarketplaceClient::new(format!("http://{addr}"))
}

async fn sign_up(client: &MarketplaceClient, email: &str, role: UserRole) -> SessionStore {
    let mut session = SessionStore::new(client.clone());
    session
        .register(&RegisterUserReq {
            id: Uuid::new_v4(),
            email: email.into(),
            role,
            full_name: None,
        })
        .await
        .unwrap();
    session
}

fn paracetamol() -> CreateMedicineReq {
    CreateMedicineReq {
        name: "Paracetamol 500mg".into(),
        description: "Sealed blister pack of ten tablets".into(),
        quantity: 10,
        expiry_date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        condition: None,
        image_url: None,
        location: "City A".into(),
        latitude: None,
        longitude: None,
    }
}

#[tokio::test]
async fn claimed_medicine_disappears_from_the_available_list() {
    let client = spawn_app().await;
    let donor = sign_up(&client, "donor@example.com", UserRole::Donor).await;
    let claimer = sign_up(&client, "claimer@example.com", UserRole::Claimer).await;
    let other = sign_up(&client, "other@example.com", UserRole::Claimer).await;

    let mut donor_medicines = MedicinesStore::new(donor.client().clone());
    let medicine = donor_medicines.create(&paracetamol()).await.unwrap();

    let mut claimer_medicines = MedicinesStore::new(claimer.client().clone());
    claimer_medicines.fetch_available().await.unwrap();
    let listed = claimer_medicines.state().get(medicine.id).unwrap();
    assert!(listed.claimable);

    let claimed = claimer_medicines.claim(medicine.id).await.unwrap();
    assert_eq!(claimed.medicine.status, "claimed");
    assert_eq!(claimed.claim.status, "pending");
    assert!(claimer_medicines.state().get(medicine.id).is_none());

    let mut other_medicines = MedicinesStore::new(other.client().clone());
    other_medicines.fetch_available().await.unwrap();
    assert!(other_medicines.state().get(medicine.id).is_none());

    let err = other_medicines.claim(medicine.id).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert!(other_medicines.state().error.is_some());

    let mut inbox = NotificationsStore::new(donor.client().clone());
    inbox.fetch().await.unwrap();
    assert_eq!(inbox.state().unread_count, 1);
    inbox.mark_all_read().await.unwrap();
    assert_eq!(inbox.state().unread_count, 0);
}

#[tokio::test]
async fn concurrent_claims_leave_exactly_one_claim() {
    let client = spawn_app().await;
    let donor = sign_up(&client, "donor@example.com", UserRole::Donor).await;
    let medicine = donor.client().create_medicine(&paracetamol()).await.unwrap();

    let mut claimers = Vec::new();
    for i in 0..8 {
        claimers.push(sign_up(&client, &format!("claimer{i}@example.com"), UserRole::Claimer).await);
    }
    let attempts = futures::future::join_all(
        claimers
            .iter()
            .map(|session| session.client().claim_medicine(medicine.id)),
    )
    .await;

    let winners = attempts.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        attempts
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.status() == Some(409))
    );

    let claims = donor.client().medicine_claims(medicine.id).await.unwrap();
    assert_eq!(claims.len(), 1);
    let current = client.get_medicine(medicine.id).await.unwrap();
    assert_eq!(current.medicine.status, "claimed");
    assert!(!current.claimable);
}

#[tokio::test]
async fn deleted_medicine_is_gone_from_every_list() {
    let client = spawn_app().await;
    let donor = sign_up(&client, "donor@example.com", UserRole::Donor).await;
    let claimer = sign_up(&client, "claimer@example.com", UserRole::Claimer).await;

    let mut donor_medicines = MedicinesStore::new(donor.client().clone());
    let medicine = donor_medicines.create(&paracetamol()).await.unwrap();

    let mut favorites = FavoritesStore::new(claimer.client().clone());
    favorites.toggle(medicine.id).await.unwrap();
    assert!(favorites.state().is_favorite(medicine.id));

    donor_medicines.delete(medicine.id).await.unwrap();
    assert!(donor_medicines.state().get(medicine.id).is_none());

    let page = client.list_medicines(&MedicineQuery::default()).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(donor.client().my_medicines().await.unwrap().is_empty());
    favorites.fetch().await.unwrap();
    assert!(favorites.state().favorites.is_empty());

    let err = client.get_medicine(medicine.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn invalid_listing_is_rejected_with_field_errors() {
    let client = spawn_app().await;
    let donor = sign_up(&client, "donor@example.com", UserRole::Donor).await;

    let req = CreateMedicineReq {
        name: "Pa".into(),
        description: "short".into(),
        quantity: 0,
        expiry_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        ..paracetamol()
    };
    let err = donor.client().create_medicine(&req).await.unwrap_err();
    let ClientError::Api { status, message } = err else {
        panic!("expected an API error");
    };
    assert_eq!(status, 422);
    assert!(message.contains("Medication name must be at least 3 characters"));
    assert!(message.contains("Expiry date must be in the future"));
}

#[tokio::test]
async fn catalog_filters_sorts_and_pages() {
    let client = spawn_app().await;
    let donor = sign_up(&client, "donor@example.com", UserRole::Donor).await;
    for (name, location) in [
        ("Ibuprofen 200mg", "City A"),
        ("Amoxicillin 250mg", "City B"),
        ("Paracetamol 500mg", "City A"),
    ] {
        let req = CreateMedicineReq {
            name: name.into(),
            location: location.into(),
            ..paracetamol()
        };
        donor.client().create_medicine(&req).await.unwrap();
    }

    let in_city_a = client
        .list_medicines(&MedicineQuery {
            location: Some("city a".into()),
            sort: Some(SortOrder::Name),
            ..Default::default()
        })
        .await
        .unwrap();
    let names: Vec<&str> = in_city_a.items.iter().map(|m| m.medicine.name.as_str()).collect();
    assert_eq!(names, ["Ibuprofen 200mg", "Paracetamol 500mg"]);

    let second_page = client
        .list_medicines(&MedicineQuery {
            status: Some(MedicineStatus::Available),
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second_page.total, 3);
    assert_eq!(second_page.total_pages, 2);
    assert_eq!(second_page.items.len(), 1);
}

#[tokio::test]
async fn batches_update_the_medicine_total() {
    let client = spawn_app().await;
    let donor = sign_up(&client, "donor@example.com", UserRole::Donor).await;
    let medicine = donor.client().create_medicine(&paracetamol()).await.unwrap();

    let batch = |quantity| CreateBatchReq {
        quantity,
        expiry_date: NaiveDate::from_ymd_opt(2098, 6, 1).unwrap(),
        condition: BatchCondition::New,
    };
    donor.client().add_batch(medicine.id, &batch(4)).await.unwrap();
    let change = donor.client().add_batch(medicine.id, &batch(7)).await.unwrap();
    assert_eq!(change.total_quantity, 11);

    let details = client.medicine_details(medicine.id).await.unwrap();
    assert_eq!(details.medicine.medicine.total_quantity, 11);
    assert_eq!(details.batches.len(), 2);
}

#[tokio::test]
async fn identity_is_required_and_must_be_known() {
    let client = spawn_app().await;

    let err = client.me().await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let stranger = client.as_user(Uuid::new_v4());
    let err = stranger.list_medicines(&MedicineQuery::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let mut session = SessionStore::new(client.clone());
    let err = session.sign_in(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!session.state().is_signed_in());
    assert_eq!(session.client().user_id(), None);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = routes::app(state());

    let health = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let openapi = app
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(openapi.status(), StatusCode::OK);
}
