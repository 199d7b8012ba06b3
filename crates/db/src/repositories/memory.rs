use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use kiosk_core::{OrderId, OrderRecord, OrderSubmission};

use super::{OrderRepository, RepositoryError};

/// Process-local store for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<BTreeMap<i64, OrderRecord>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, submission: OrderSubmission) -> Result<OrderId, RepositoryError> {
        let mut orders = self.orders.write().await;
        let id = OrderId(orders.keys().next_back().map_or(1, |last| last + 1));
        let (slots, summary) = submission.into_parts();
        orders.insert(id.0, OrderRecord { id, slots, summary, created_at: Utc::now() });
        Ok(id)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id.0).cloned())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<OrderRecord>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.values().rev().take(limit as usize).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use kiosk_core::{OrderId, OrderSubmission, Size, SlotDraft};

    use super::InMemoryOrderRepository;
    use crate::repositories::OrderRepository;

    fn submission(main: &str) -> OrderSubmission {
        let slots = SlotDraft {
            main: Some(main.to_string()),
            size: Some(Size::Large),
            bread: Some("허니오트".to_string()),
            cheese: Some("아메리칸".to_string()),
            ..SlotDraft::default()
        };
        OrderSubmission::new(slots, main).expect("complete submission")
    }

    #[tokio::test]
    async fn ids_are_sequential_and_listing_is_newest_first() {
        let repo = InMemoryOrderRepository::default();
        assert_eq!(repo.create(submission("슈림프")).await.expect("create"), OrderId(1));
        assert_eq!(repo.create(submission("참치")).await.expect("create"), OrderId(2));

        let recent = repo.list_recent(10).await.expect("list");
        let mains: Vec<_> = recent.iter().filter_map(|r| r.slots.main.as_deref()).collect();
        assert_eq!(mains, vec!["참치", "슈림프"]);

        let found = repo.find_by_id(OrderId(1)).await.expect("find").expect("exists");
        assert_eq!(found.summary, "슈림프");
        assert!(repo.find_by_id(OrderId(3)).await.expect("find").is_none());
    }
}
