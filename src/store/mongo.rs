//! MongoDB-backed entity store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};

use super::{OrderPatch, PaymentPatch, Store, StoreError};
use crate::models::{Category, Customer, Order, Payment, Plat};

#[derive(Clone)]
pub struct MongoStore {
    customers: Collection<Customer>,
    plats: Collection<Plat>,
    categories: Collection<Category>,
    orders: Collection<Order>,
    payments: Collection<Payment>,
    counters: Collection<Document>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            customers: db.collection("customers"),
            plats: db.collection("plats"),
            categories: db.collection("categories"),
            orders: db.collection("orders"),
            payments: db.collection("payments"),
            counters: db.collection("counters"),
        }
    }

    /// Atomically increment and return the named sequence. Upserts the
    /// counter document on first use so fresh databases start at 1.
    async fn next_seq(&self, name: &str) -> Result<u64, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1i64 } }, options)
            .await?;

        let seq = counter
            .as_ref()
            .and_then(|d| d.get_i64("seq").ok())
            .unwrap_or(1);
        Ok(seq as u64)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn find_customer(&self, customer_id: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .customers
            .find_one(doc! { "_id": customer_id }, None)
            .await?)
    }

    async fn find_plat(&self, plat_id: i64) -> Result<Option<Plat>, StoreError> {
        Ok(self.plats.find_one(doc! { "_id": plat_id }, None).await?)
    }

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>, StoreError> {
        Ok(self
            .categories
            .find_one(doc! { "_id": category_id }, None)
            .await?)
    }

    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.insert_one(order, None).await?;
        Ok(())
    }

    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.find_one(doc! { "_id": order_id }, None).await?)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let cursor = self.orders.find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_order(&self, order_id: &str, patch: OrderPatch) -> Result<u64, StoreError> {
        let mut set = Document::new();
        if let Some(statut) = patch.statut {
            set.insert("statut", to_bson(&statut)?);
        }
        if let Some(reason) = patch.cancel_reason {
            set.insert("cancelReason", reason);
        }
        if let Some(date) = patch.cancel_date {
            set.insert("cancelDate", to_bson(&date)?);
        }
        if set.is_empty() {
            return Ok(0);
        }

        let result = self
            .orders
            .update_one(doc! { "_id": order_id }, doc! { "$set": set }, None)
            .await?;
        Ok(result.modified_count)
    }

    async fn next_order_seq(&self) -> Result<u64, StoreError> {
        self.next_seq("orders").await
    }

    async fn create_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        self.payments.insert_one(payment, None).await?;
        Ok(())
    }

    async fn find_payment(&self, pay_code: &str) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .payments
            .find_one(doc! { "_id": pay_code }, None)
            .await?)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, StoreError> {
        let cursor = self.payments.find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn payments_for_order(&self, order_id: &str) -> Result<Vec<Payment>, StoreError> {
        let cursor = self.payments.find(doc! { "orderId": order_id }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_payment(
        &self,
        pay_code: &str,
        patch: PaymentPatch,
    ) -> Result<u64, StoreError> {
        let mut set = Document::new();
        if let Some(statut) = patch.statut {
            set.insert("statut", to_bson(&statut)?);
        }
        if let Some(number) = patch.transaction_number {
            set.insert("transactionNumber", number);
        }
        if let Some(date) = patch.payment_date {
            set.insert("paymentDate", to_bson(&date)?);
        }
        if set.is_empty() {
            return Ok(0);
        }

        let result = self
            .payments
            .update_one(doc! { "_id": pay_code }, doc! { "$set": set }, None)
            .await?;
        Ok(result.modified_count)
    }

    async fn next_payment_seq(&self) -> Result<u64, StoreError> {
        self.next_seq("payments").await
    }
}
