use async_trait::async_trait;
use thiserror::Error;

use kiosk_core::{OrderId, OrderRecord, OrderSubmission};

pub mod memory;
pub mod order;

pub use memory::InMemoryOrderRepository;
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Append-only store of confirmed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, submission: OrderSubmission) -> Result<OrderId, RepositoryError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError>;

    /// Newest first. A limit of zero yields an empty list.
    async fn list_recent(&self, limit: u32) -> Result<Vec<OrderRecord>, RepositoryError>;
}
