use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

use kiosk_core::{OrderId, OrderRecord, OrderSubmission, SlotDraft};

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

/// Column layout of `orders.payload`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPayload {
    slots: SlotDraft,
    summary: String,
}

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn create(&self, submission: OrderSubmission) -> Result<OrderId, RepositoryError> {
        let (slots, summary) = submission.into_parts();
        let payload = serde_json::to_string(&StoredPayload { slots, summary })
            .map_err(|error| RepositoryError::Decode(format!("encode order payload: {error}")))?;

        let result = sqlx::query("INSERT INTO orders (payload, created_at) VALUES (?, ?)")
            .bind(payload)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(OrderId(result.last_insert_rowid()))
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        let row = sqlx::query("SELECT id, payload, created_at FROM orders WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, payload, created_at FROM orders ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }
}

fn order_from_row(row: &SqliteRow) -> Result<OrderRecord, RepositoryError> {
    let id: i64 = row.try_get("id")?;
    let payload: String = row.try_get("payload")?;
    let created_at: String = row.try_get("created_at")?;

    let stored: StoredPayload = serde_json::from_str(&payload).map_err(|error| {
        RepositoryError::Decode(format!("invalid payload for order {id}: {error}"))
    })?;

    Ok(OrderRecord {
        id: OrderId(id),
        slots: stored.slots,
        summary: stored.summary,
        created_at: parse_timestamp("created_at", created_at)?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp in `{column}`: {e}")))
}

#[cfg(test)]
mod tests {
    use kiosk_core::{OrderId, OrderSubmission, Size, SlotDraft};

    use super::SqlOrderRepository;
    use crate::repositories::{OrderRepository, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn submission(main: &str) -> OrderSubmission {
        let slots = SlotDraft {
            main: Some(main.to_string()),
            size: Some(Size::Regular),
            bread: Some("위트".to_string()),
            cheese: Some("슈레드".to_string()),
            vegetables: vec!["양상추".to_string(), "토마토".to_string()],
            exclude: vec!["양파".to_string()],
            ..SlotDraft::default()
        };
        OrderSubmission::new(slots, format!("메인:{main}")).expect("complete submission")
    }

    #[tokio::test]
    async fn create_then_find_returns_stored_order() {
        let repo = SqlOrderRepository::new(setup().await);

        let id = repo.create(submission("슈림프")).await.expect("create");
        let record = repo.find_by_id(id).await.expect("find").expect("order exists");

        assert_eq!(record.id, id);
        assert_eq!(record.summary, "메인:슈림프");
        assert_eq!(record.slots.main.as_deref(), Some("슈림프"));
        assert_eq!(record.slots.size, Some(Size::Regular));
        assert_eq!(record.slots.exclude, vec!["양파".to_string()]);
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let repo = SqlOrderRepository::new(setup().await);
        assert!(repo.find_by_id(OrderId(404)).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_limited() {
        let repo = SqlOrderRepository::new(setup().await);
        let first = repo.create(submission("슈림프")).await.expect("first");
        let second = repo.create(submission("에그마요")).await.expect("second");
        let third = repo.create(submission("참치")).await.expect("third");

        let ids: Vec<OrderId> =
            repo.list_recent(20).await.expect("list").into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third, second, first]);

        let limited = repo.list_recent(2).await.expect("limited list");
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].slots.main.as_deref(), Some("참치"));

        assert!(repo.list_recent(0).await.expect("empty list").is_empty());
    }

    #[tokio::test]
    async fn corrupt_payload_surfaces_decode_error() {
        let pool = setup().await;
        sqlx::query("INSERT INTO orders (payload, created_at) VALUES ('not json', ?)")
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .expect("raw insert");

        let repo = SqlOrderRepository::new(pool);
        let error = repo.list_recent(5).await.expect_err("corrupt row");
        assert!(matches!(error, RepositoryError::Decode(ref message) if message.contains("order 1")));
    }
}
