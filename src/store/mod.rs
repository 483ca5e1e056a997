//! Entity store contract.
//!
//! The rest of the service only talks to this trait; the MongoDB-backed
//! implementation is used in production and the in-memory one in tests
//! and local development.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Category, Customer, Order, OrderStatus, Payment, PaymentStatus, Plat};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),
}

/// Partial update applied to an order row.
#[derive(Debug, Default, Clone)]
pub struct OrderPatch {
    pub statut: Option<OrderStatus>,
    pub cancel_reason: Option<String>,
    pub cancel_date: Option<DateTime<Utc>>,
}

/// Partial update applied to a payment row.
#[derive(Debug, Default, Clone)]
pub struct PaymentPatch {
    pub statut: Option<PaymentStatus>,
    pub transaction_number: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
}

/// Persistence seam for the ordering domain.
///
/// Update operations return the number of affected rows so callers can
/// tell a no-op apart from a write.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_customer(&self, customer_id: &str) -> Result<Option<Customer>, StoreError>;
    async fn find_plat(&self, plat_id: i64) -> Result<Option<Plat>, StoreError>;
    async fn find_category(&self, category_id: i64) -> Result<Option<Category>, StoreError>;

    async fn create_order(&self, order: &Order) -> Result<(), StoreError>;
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
    async fn update_order(&self, order_id: &str, patch: OrderPatch) -> Result<u64, StoreError>;
    /// Next value of the monotonic order sequence, starting at 1.
    async fn next_order_seq(&self) -> Result<u64, StoreError>;

    async fn create_payment(&self, payment: &Payment) -> Result<(), StoreError>;
    async fn find_payment(&self, pay_code: &str) -> Result<Option<Payment>, StoreError>;
    async fn list_payments(&self) -> Result<Vec<Payment>, StoreError>;
    async fn payments_for_order(&self, order_id: &str) -> Result<Vec<Payment>, StoreError>;
    async fn update_payment(&self, pay_code: &str, patch: PaymentPatch)
        -> Result<u64, StoreError>;
    /// Next value of the monotonic payment sequence, starting at 1.
    async fn next_payment_seq(&self) -> Result<u64, StoreError>;
}
