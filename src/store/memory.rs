//! In-memory entity store, used by the test suite and for local runs
//! without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{OrderPatch, PaymentPatch, Store, StoreError};
use crate::models::{Category, Customer, Order, Payment, Plat};

#[derive(Default)]
struct Inner {
    customers: HashMap<String, Customer>,
    plats: HashMap<i64, Plat>,
    categories: HashMap<i64, Category>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    order_seq: AtomicU64,
    payment_seq: AtomicU64,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_customer(&self, customer: Customer) {
        self.lock()
            .customers
            .insert(customer.customer_id.clone(), customer);
    }

    pub fn seed_plat(&self, plat: Plat) {
        self.lock().plats.insert(plat.plat_id, plat);
    }

    pub fn seed_category(&self, category: Category) {
        self.lock().categories.insert(category.category_id, category);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_customer(&self, customer_id: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.lock().customers.get(customer_id).cloned())
    }

    async fn find_plat(&self, plat_id: i64) -> Result<Option<Plat>, StoreError> {
        Ok(self.lock().plats.get(&plat_id).cloned())
    }

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>, StoreError> {
        Ok(self.lock().categories.get(&category_id).cloned())
    }

    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        self.lock().orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.lock().orders.clone())
    }

    async fn update_order(&self, order_id: &str, patch: OrderPatch) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let Some(order) = inner.orders.iter_mut().find(|o| o.order_id == order_id) else {
            return Ok(0);
        };
        if let Some(statut) = patch.statut {
            order.statut = statut;
        }
        if let Some(reason) = patch.cancel_reason {
            order.cancel_reason = Some(reason);
        }
        if let Some(date) = patch.cancel_date {
            order.cancel_date = Some(date);
        }
        Ok(1)
    }

    async fn next_order_seq(&self) -> Result<u64, StoreError> {
        Ok(self.order_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn create_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        self.lock().payments.push(payment.clone());
        Ok(())
    }

    async fn find_payment(&self, pay_code: &str) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .lock()
            .payments
            .iter()
            .find(|p| p.pay_code == pay_code)
            .cloned())
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, StoreError> {
        Ok(self.lock().payments.clone())
    }

    async fn payments_for_order(&self, order_id: &str) -> Result<Vec<Payment>, StoreError> {
        Ok(self
            .lock()
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_payment(
        &self,
        pay_code: &str,
        patch: PaymentPatch,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let Some(payment) = inner.payments.iter_mut().find(|p| p.pay_code == pay_code) else {
            return Ok(0);
        };
        if let Some(statut) = patch.statut {
            payment.statut = statut;
        }
        if let Some(number) = patch.transaction_number {
            payment.transaction_number = Some(number);
        }
        if let Some(date) = patch.payment_date {
            payment.payment_date = Some(date);
        }
        Ok(1)
    }

    async fn next_payment_seq(&self) -> Result<u64, StoreError> {
        Ok(self.payment_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
