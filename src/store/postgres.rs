use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, PgTextExpressionMethods,
    QueryDsl, SelectableHelper, pg::Pg, sql_types::Text,
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl, pooled_connection::bb8};
use uuid::Uuid;

use crate::{
    domain::catalog::{Paging, non_blank},
    dto::{ClaimWithMedicine, MedicineQuery, Page, SortOrder},
    infra::{aliases::DbPool, app_error::AppError},
    models::{
        BatchEntity, ClaimEntity, ClaimStatus, CreateBatchEntity, CreateClaimEntity,
        CreateFavoriteEntity, CreateInteractionEntity, CreateMedicineEntity,
        CreateNotificationEntity, CreateReminderEntity, CreateUserEntity, InteractionEntity,
        MedicineEntity, MedicineStatus, NotificationEntity, ReminderEntity, UpdateBatchEntity,
        UpdateMedicineEntity, UpdateReminderEntity, UserEntity,
    },
    schema::{
        claims, favorites, medicine_batches, medicine_interactions, medicine_reminders,
        medicines, notifications, users,
    },
    store::{MarketplaceStore, StoreResult, claim_rejection, unavailable_rejection},
};

diesel::define_sql_function!(fn lower(x: Text) -> Text);

/// Postgres-backed store over a bb8 pool of async diesel connections.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StoreResult<bb8::PooledConnection<'_, AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")
            .map_err(AppError::from)
    }
}

/// Escapes `LIKE` metacharacters and wraps the term for substring matching.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn filtered_medicines(query: &MedicineQuery) -> medicines::BoxedQuery<'static, Pg> {
    let mut statement = medicines::table.into_boxed();

    if let Some(name) = non_blank(&query.name) {
        statement = statement.filter(medicines::name.ilike(like_pattern(name)));
    }
    if let Some(location) = non_blank(&query.location) {
        statement = statement.filter(medicines::location.ilike(like_pattern(location)));
    }
    if let Some(text) = non_blank(&query.q) {
        let pattern = like_pattern(text);
        statement = statement.filter(
            medicines::name
                .ilike(pattern.clone())
                .or(medicines::description.ilike(pattern)),
        );
    }
    if let Some(status) = query.status {
        statement = statement.filter(medicines::status.eq(status.as_str()));
    }

    statement
}

async fn find_medicine(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> StoreResult<Option<MedicineEntity>> {
    let medicine = medicines::table
        .find(id)
        .select(MedicineEntity::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(medicine)
}

/// Sets `total_quantity` to the sum of the medicine's batch quantities.
async fn recompute_total_quantity(
    conn: &mut AsyncPgConnection,
    medicine_id: Uuid,
) -> StoreResult<MedicineEntity> {
    let total: Option<i64> = medicine_batches::table
        .filter(medicine_batches::medicine_id.eq(medicine_id))
        .select(diesel::dsl::sum(medicine_batches::quantity))
        .get_result(conn)
        .await?;
    let total = i32::try_from(total.unwrap_or(0)).unwrap_or(i32::MAX);

    let medicine = diesel::update(medicines::table.find(medicine_id))
        .set((
            medicines::total_quantity.eq(total),
            medicines::updated_at.eq(diesel::dsl::now),
        ))
        .returning(MedicineEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(medicine)
}

#[async_trait]
impl MarketplaceStore for PgStore {
    async fn create_user(&self, user: CreateUserEntity) -> StoreResult<UserEntity> {
        let conn = &mut self.conn().await?;

        let user = diesel::insert_into(users::table)
            .values(user)
            .returning(UserEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserEntity>> {
        let conn = &mut self.conn().await?;

        let user = users::table
            .find(id)
            .select(UserEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(user)
    }

    async fn list_medicines(&self, query: &MedicineQuery) -> StoreResult<Page<MedicineEntity>> {
        let conn = &mut self.conn().await?;
        let paging = Paging::from_query(query);

        let total: i64 = filtered_medicines(query)
            .count()
            .get_result(conn)
            .await
            .context("Failed to count medicines")?;

        let statement = filtered_medicines(query);
        let statement = match query.sort.unwrap_or_default() {
            SortOrder::Newest => statement.order((medicines::created_at.desc(), medicines::id.asc())),
            SortOrder::Oldest => statement.order((medicines::created_at.asc(), medicines::id.asc())),
            SortOrder::Expiry => statement.order((medicines::expiry_date.asc(), medicines::id.asc())),
            SortOrder::Name => statement.order((lower(medicines::name).asc(), medicines::id.asc())),
        };

        let items: Vec<MedicineEntity> = statement
            .offset(i64::try_from(paging.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(paging.per_page))
            .select(MedicineEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get medicines")?;

        Ok(Page::new(items, paging, u64::try_from(total).unwrap_or(0)))
    }

    async fn list_user_medicines(&self, user_id: Uuid) -> StoreResult<Vec<MedicineEntity>> {
        let conn = &mut self.conn().await?;

        let medicines = medicines::table
            .filter(medicines::posted_by.eq(user_id))
            .order(medicines::created_at.desc())
            .select(MedicineEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get user medicines")?;

        Ok(medicines)
    }

    async fn get_medicine(&self, id: Uuid) -> StoreResult<MedicineEntity> {
        let conn = &mut self.conn().await?;
        find_medicine(conn, id).await?.ok_or(AppError::NotFound)
    }

    async fn create_medicine(&self, medicine: CreateMedicineEntity) -> StoreResult<MedicineEntity> {
        let conn = &mut self.conn().await?;

        let medicine = diesel::insert_into(medicines::table)
            .values(medicine)
            .returning(MedicineEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(medicine)
    }

    async fn update_available_medicine(
        &self,
        id: Uuid,
        changes: UpdateMedicineEntity,
    ) -> StoreResult<MedicineEntity> {
        let conn = &mut self.conn().await?;

        let updated = diesel::update(medicines::table.find(id))
            .filter(medicines::status.eq(MedicineStatus::Available.as_str()))
            .set((&changes, medicines::updated_at.eq(diesel::dsl::now)))
            .returning(MedicineEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        match updated {
            Some(medicine) => Ok(medicine),
            None => Err(unavailable_rejection(
                find_medicine(conn, id).await?.as_ref(),
                "edited",
            )),
        }
    }

    async fn delete_available_medicine(&self, id: Uuid) -> StoreResult<MedicineEntity> {
        let conn = &mut self.conn().await?;

        // Claims, batches, interactions, reminders and favorites cascade in the schema;
        // notifications keep their row with medicine_id and claim_id set to null.
        let deleted = diesel::delete(
            medicines::table
                .find(id)
                .filter(medicines::status.eq(MedicineStatus::Available.as_str())),
        )
        .returning(MedicineEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?;

        match deleted {
            Some(medicine) => Ok(medicine),
            None => Err(unavailable_rejection(
                find_medicine(conn, id).await?.as_ref(),
                "deleted",
            )),
        }
    }

    async fn claim_medicine(
        &self,
        medicine_id: Uuid,
        claimer_id: Uuid,
        today: NaiveDate,
    ) -> StoreResult<(ClaimEntity, MedicineEntity)> {
        let conn = &mut self.conn().await?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                // Row lock on the medicine serializes concurrent claimers; the
                // loser re-evaluates the predicate after the winner commits.
                let claimed = diesel::update(medicines::table.find(medicine_id))
                    .filter(medicines::status.eq(MedicineStatus::Available.as_str()))
                    .filter(medicines::expiry_date.gt(today))
                    .set((
                        medicines::status.eq(MedicineStatus::Claimed.as_str()),
                        medicines::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(MedicineEntity::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;

                let Some(medicine) = claimed else {
                    let current = find_medicine(conn, medicine_id).await?;
                    return Err(claim_rejection(current.as_ref(), today));
                };

                let claim = diesel::insert_into(claims::table)
                    .values(CreateClaimEntity {
                        medicine_id,
                        claimer_id,
                        status: ClaimStatus::Pending.as_str().into(),
                    })
                    .returning(ClaimEntity::as_returning())
                    .get_result(conn)
                    .await?;

                Ok::<(ClaimEntity, MedicineEntity), AppError>((claim, medicine))
            })
        })
        .await
    }

    async fn list_user_claims(&self, claimer_id: Uuid) -> StoreResult<Vec<ClaimWithMedicine>> {
        let conn = &mut self.conn().await?;

        let rows: Vec<(ClaimEntity, MedicineEntity)> = claims::table
            .inner_join(medicines::table)
            .filter(claims::claimer_id.eq(claimer_id))
            .order(claims::created_at.desc())
            .select((ClaimEntity::as_select(), MedicineEntity::as_select()))
            .load(conn)
            .await
            .context("Failed to get user claims")?;

        Ok(rows
            .into_iter()
            .map(|(claim, medicine)| ClaimWithMedicine { claim, medicine })
            .collect())
    }

    async fn list_medicine_claims(&self, medicine_id: Uuid) -> StoreResult<Vec<ClaimEntity>> {
        let conn = &mut self.conn().await?;

        let claims = claims::table
            .filter(claims::medicine_id.eq(medicine_id))
            .order(claims::created_at.asc())
            .select(ClaimEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get medicine claims")?;

        Ok(claims)
    }

    async fn list_batches(&self, medicine_id: Uuid) -> StoreResult<Vec<BatchEntity>> {
        let conn = &mut self.conn().await?;

        let batches = medicine_batches::table
            .filter(medicine_batches::medicine_id.eq(medicine_id))
            .order(medicine_batches::expiry_date.asc())
            .select(BatchEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get batches")?;

        Ok(batches)
    }

    async fn get_batch(&self, id: Uuid) -> StoreResult<BatchEntity> {
        let conn = &mut self.conn().await?;

        let batch = medicine_batches::table
            .find(id)
            .select(BatchEntity::as_select())
            .first(conn)
            .await?;

        Ok(batch)
    }

    async fn add_batch(
        &self,
        batch: CreateBatchEntity,
    ) -> StoreResult<(BatchEntity, MedicineEntity)> {
        let conn = &mut self.conn().await?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let batch: BatchEntity = diesel::insert_into(medicine_batches::table)
                    .values(batch)
                    .returning(BatchEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let medicine = recompute_total_quantity(conn, batch.medicine_id).await?;

                Ok::<(BatchEntity, MedicineEntity), AppError>((batch, medicine))
            })
        })
        .await
    }

    async fn update_batch(
        &self,
        id: Uuid,
        changes: UpdateBatchEntity,
    ) -> StoreResult<(BatchEntity, MedicineEntity)> {
        let conn = &mut self.conn().await?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let batch: BatchEntity = diesel::update(medicine_batches::table.find(id))
                    .set((&changes, medicine_batches::updated_at.eq(diesel::dsl::now)))
                    .returning(BatchEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let medicine = recompute_total_quantity(conn, batch.medicine_id).await?;

                Ok::<(BatchEntity, MedicineEntity), AppError>((batch, medicine))
            })
        })
        .await
    }

    async fn delete_batch(&self, id: Uuid) -> StoreResult<(BatchEntity, MedicineEntity)> {
        let conn = &mut self.conn().await?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let batch: BatchEntity = diesel::delete(medicine_batches::table.find(id))
                    .returning(BatchEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let medicine = recompute_total_quantity(conn, batch.medicine_id).await?;

                Ok::<(BatchEntity, MedicineEntity), AppError>((batch, medicine))
            })
        })
        .await
    }

    async fn list_interactions(&self, medicine_id: Uuid) -> StoreResult<Vec<InteractionEntity>> {
        let conn = &mut self.conn().await?;

        let interactions = medicine_interactions::table
            .filter(medicine_interactions::medicine_id.eq(medicine_id))
            .order(medicine_interactions::created_at.asc())
            .select(InteractionEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get interactions")?;

        Ok(interactions)
    }

    async fn get_interaction(&self, id: Uuid) -> StoreResult<InteractionEntity> {
        let conn = &mut self.conn().await?;

        let interaction = medicine_interactions::table
            .find(id)
            .select(InteractionEntity::as_select())
            .first(conn)
            .await?;

        Ok(interaction)
    }

    async fn add_interaction(
        &self,
        interaction: CreateInteractionEntity,
    ) -> StoreResult<InteractionEntity> {
        let conn = &mut self.conn().await?;

        let interaction = diesel::insert_into(medicine_interactions::table)
            .values(interaction)
            .returning(InteractionEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(interaction)
    }

    async fn delete_interaction(&self, id: Uuid) -> StoreResult<InteractionEntity> {
        let conn = &mut self.conn().await?;

        let interaction = diesel::delete(medicine_interactions::table.find(id))
            .returning(InteractionEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(interaction)
    }

    async fn list_medicine_reminders(&self, medicine_id: Uuid) -> StoreResult<Vec<ReminderEntity>> {
        let conn = &mut self.conn().await?;

        let reminders = medicine_reminders::table
            .filter(medicine_reminders::medicine_id.eq(medicine_id))
            .order(medicine_reminders::created_at.asc())
            .select(ReminderEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get reminders")?;

        Ok(reminders)
    }

    async fn list_user_reminders(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<(ReminderEntity, MedicineEntity)>> {
        let conn = &mut self.conn().await?;

        let rows = medicine_reminders::table
            .inner_join(medicines::table)
            .filter(medicine_reminders::user_id.eq(user_id))
            .order(medicine_reminders::created_at.asc())
            .select((ReminderEntity::as_select(), MedicineEntity::as_select()))
            .load(conn)
            .await
            .context("Failed to get user reminders")?;

        Ok(rows)
    }

    async fn get_reminder(&self, id: Uuid) -> StoreResult<ReminderEntity> {
        let conn = &mut self.conn().await?;

        let reminder = medicine_reminders::table
            .find(id)
            .select(ReminderEntity::as_select())
            .first(conn)
            .await?;

        Ok(reminder)
    }

    async fn add_reminder(&self, reminder: CreateReminderEntity) -> StoreResult<ReminderEntity> {
        let conn = &mut self.conn().await?;

        let reminder = diesel::insert_into(medicine_reminders::table)
            .values(reminder)
            .returning(ReminderEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(reminder)
    }

    async fn update_reminder(
        &self,
        id: Uuid,
        changes: UpdateReminderEntity,
    ) -> StoreResult<ReminderEntity> {
        let conn = &mut self.conn().await?;

        let reminder = diesel::update(medicine_reminders::table.find(id))
            .set((&changes, medicine_reminders::updated_at.eq(diesel::dsl::now)))
            .returning(ReminderEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(reminder)
    }

    async fn delete_reminder(&self, id: Uuid) -> StoreResult<ReminderEntity> {
        let conn = &mut self.conn().await?;

        let reminder = diesel::delete(medicine_reminders::table.find(id))
            .returning(ReminderEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(reminder)
    }

    async fn add_favorite(&self, user_id: Uuid, medicine_id: Uuid) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        diesel::insert_into(favorites::table)
            .values(CreateFavoriteEntity {
                user_id,
                medicine_id,
            })
            .on_conflict_do_nothing()
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, medicine_id: Uuid) -> StoreResult<bool> {
        let conn = &mut self.conn().await?;

        let removed = diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::medicine_id.eq(medicine_id)),
        )
        .execute(conn)
        .await
        .context("Failed to remove favorite")?;

        Ok(removed > 0)
    }

    async fn list_favorites(&self, user_id: Uuid) -> StoreResult<Vec<MedicineEntity>> {
        let conn = &mut self.conn().await?;

        let medicines = favorites::table
            .inner_join(medicines::table)
            .filter(favorites::user_id.eq(user_id))
            .order(favorites::created_at.desc())
            .select(MedicineEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get favorites")?;

        Ok(medicines)
    }

    async fn create_notification(
        &self,
        notification: CreateNotificationEntity,
    ) -> StoreResult<NotificationEntity> {
        let conn = &mut self.conn().await?;

        let notification = diesel::insert_into(notifications::table)
            .values(notification)
            .returning(NotificationEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<NotificationEntity>> {
        let conn = &mut self.conn().await?;

        let notifications = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::created_at.desc())
            .select(NotificationEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get notifications")?;

        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<NotificationEntity> {
        let conn = &mut self.conn().await?;

        let notification = diesel::update(
            notifications::table
                .find(id)
                .filter(notifications::user_id.eq(user_id)),
        )
        .set(notifications::read.eq(true))
        .returning(NotificationEntity::as_returning())
        .get_result(conn)
        .await?;

        Ok(notification)
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> StoreResult<usize> {
        let conn = &mut self.conn().await?;

        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::read.eq(false)),
        )
        .set(notifications::read.eq(true))
        .execute(conn)
        .await
        .context("Failed to mark notifications as read")?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use diesel_migrations::{EmbeddedMigrations, embed_migrations};
    use tokio::sync::OnceCell;

    use super::*;
    use crate::{
        infra::{config::DatabaseConfig, db},
        store::conformance,
    };

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    static MIGRATED: OnceCell<()> = OnceCell::const_new();

    /// Connects to the scratch database named by `DATABASE_URL`.
    ///
    /// Run with `cargo test -- --ignored` against a disposable Postgres.
    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        MIGRATED
            .get_or_init(|| async {
                db::run_migrations_blocking(MIGRATIONS, &url).await.unwrap();
            })
            .await;

        let pool = db::create_pool(&DatabaseConfig {
            url,
            max_connections: 10,
        })
        .await
        .unwrap();
        PgStore::new(pool)
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("para"), "%para%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn claim_flips_status_and_records_pending_claim() {
        conformance::claim_flips_status_and_records_one_pending_claim(&store().await).await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn failed_claims_are_classified() {
        conformance::claim_rejections_are_classified(&store().await).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "needs DATABASE_URL"]
    async fn concurrent_claims_have_exactly_one_winner() {
        conformance::concurrent_claims_have_exactly_one_winner(Arc::new(store().await)).await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn batch_writes_keep_total_quantity_in_sync() {
        conformance::batch_writes_keep_total_quantity_in_sync(&store().await).await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn deleting_a_medicine_cascades_and_detaches_notifications() {
        conformance::delete_cascades_and_detaches_notifications(&store().await).await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn search_is_case_insensitive_and_literal() {
        conformance::search_is_case_insensitive_and_literal(&store().await).await;
    }
}
