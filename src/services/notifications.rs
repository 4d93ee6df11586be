use uuid::Uuid;

use crate::{
    dto::NotificationList,
    infra::{app_error::AppError, middleware::CurrentUser},
    models::{CreateNotificationEntity, NotificationEntity},
    store::MarketplaceStore,
};

pub async fn list_notifications(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
) -> Result<NotificationList, AppError> {
    let notifications = store.list_notifications(user.id).await?;
    let unread_count = notifications.iter().filter(|n| !n.read).count();

    Ok(NotificationList {
        notifications,
        unread_count,
    })
}

pub async fn mark_read(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
    id: Uuid,
) -> Result<NotificationEntity, AppError> {
    store.mark_notification_read(id, user.id).await
}

pub async fn mark_all_read(
    store: &dyn MarketplaceStore,
    user: &CurrentUser,
) -> Result<usize, AppError> {
    store.mark_all_notifications_read(user.id).await
}

pub async fn create_notification(
    store: &dyn MarketplaceStore,
    notification: CreateNotificationEntity,
) -> Result<NotificationEntity, AppError> {
    store.create_notification(notification).await
}

/// Sends a notification as a side effect of another operation; failures are logged only.
pub async fn notify(store: &dyn MarketplaceStore, notification: CreateNotificationEntity) {
    let user_id = notification.user_id;
    if let Err(err) = create_notification(store, notification).await {
        tracing::warn!(%user_id, "Failed to create notification: {err}");
    }
}
