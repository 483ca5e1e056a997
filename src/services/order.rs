//! Order lifecycle: creation with full referential validation, enriched
//! reads, cancellation, per-customer listing and statistics.

use chrono::{Duration, Utc};
use std::sync::Arc;

use super::payment::PaymentService;
use crate::dtos::{
    CreateOrderRequest, CustomerOrdersQuery, CustomerOrdersResponse, InitiatePaymentRequest,
    OrderStatsQuery, OrderStatsResponse, PaginationMeta,
};
use crate::error::AppError;
use crate::models::{EnrichedOrder, Order, OrderStatus, PaymentStatus};
use crate::store::{OrderPatch, Store};

const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    payments: PaymentService,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, payments: PaymentService) -> Self {
        Self { store, payments }
    }

    /// Create an order.
    ///
    /// Dates, deadlines and the order id are derived server-side. When a
    /// payment method and phone are supplied the charge is initiated
    /// immediately; an initiation failure is logged and the order kept,
    /// so order creation never depends on the provider being reachable.
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<EnrichedOrder, AppError> {
        self.validate_order_data(&request).await?;

        let seq = self.store.next_order_seq().await?;
        let order_id = format!("ORD{seq:04}");

        let now = Utc::now();
        let order = Order {
            order_id: order_id.clone(),
            plat: request.plat,
            customer: request.customer.clone(),
            category: request.category,
            price: request.price,
            order_date: now.date_naive(),
            order_time: now.time(),
            payment_deadline: now + Duration::hours(24),
            delivery_date: now + Duration::hours(48),
            statut: OrderStatus::Unpaid,
            pay_method: request.pay_method,
            payment_phone: request.payment_phone.clone(),
            cancel_reason: None,
            cancel_date: None,
        };
        self.store.create_order(&order).await?;

        tracing::info!(order_id = %order_id, customer = %request.customer, "order created");

        if let (Some(method), Some(phone)) = (request.pay_method, request.payment_phone) {
            match self
                .payments
                .initiate_payment(InitiatePaymentRequest {
                    method,
                    amount: request.price,
                    phone,
                    order_id: order_id.clone(),
                })
                .await
            {
                Ok(receipt) => {
                    tracing::info!(
                        order_id = %order_id,
                        pay_code = %receipt.pay_code,
                        "payment initiated for order"
                    );
                }
                Err(err) => {
                    // The order stands even when initiation fails; the
                    // Failed payment row records the attempt.
                    tracing::warn!(
                        order_id = %order_id,
                        error = %err,
                        "payment initiation failed, order kept"
                    );
                }
            }
        }

        self.get_order_details(&order_id).await
    }

    /// Fetch an order joined with its customer, plat and category. An
    /// Unpaid order with a completed payment is repaired to Paid on the
    /// way out, so reads converge even if a reconciliation write to the
    /// order was lost.
    pub async fn get_order_details(&self, order_id: &str) -> Result<EnrichedOrder, AppError> {
        let mut order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Commande non trouvée".to_string()))?;

        if order.statut == OrderStatus::Unpaid {
            let payments = self.store.payments_for_order(order_id).await?;
            if payments
                .iter()
                .any(|p| p.statut == PaymentStatus::Completed)
            {
                self.store
                    .update_order(
                        order_id,
                        OrderPatch {
                            statut: Some(OrderStatus::Paid),
                            ..Default::default()
                        },
                    )
                    .await?;
                order.statut = OrderStatus::Paid;
                tracing::info!(order_id = %order_id, "order repaired to Paid from completed payment");
            }
        }

        let customer = self.store.find_customer(&order.customer).await?;
        let plat = self.store.find_plat(order.plat).await?;
        let category = self.store.find_category(order.category).await?;

        Ok(EnrichedOrder {
            order,
            customer_details: customer,
            plat_details: plat,
            category_details: category,
        })
    }

    /// Cancel an Unpaid order. Paid and already-cancelled orders are
    /// rejected; cancellation is deliberately not idempotent.
    pub async fn cancel_order(
        &self,
        order_id: &str,
        reason: Option<String>,
    ) -> Result<EnrichedOrder, AppError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Commande non trouvée".to_string()))?;

        match order.statut {
            OrderStatus::Paid => {
                return Err(AppError::InvalidState(
                    "Impossible d'annuler une commande déjà payée".to_string(),
                ))
            }
            OrderStatus::Cancelled => {
                return Err(AppError::InvalidState("Commande déjà annulée".to_string()))
            }
            OrderStatus::Unpaid => {}
        }

        let reason = reason.unwrap_or_else(|| "Cancelled by user".to_string());
        self.store
            .update_order(
                order_id,
                OrderPatch {
                    statut: Some(OrderStatus::Cancelled),
                    cancel_reason: Some(reason.clone()),
                    cancel_date: Some(Utc::now()),
                },
            )
            .await?;

        tracing::info!(order_id = %order_id, reason = %reason, "order cancelled");
        self.get_order_details(order_id).await
    }

    /// List a customer's orders with optional status filter and offset
    /// pagination. The total counts the whole filtered set, not the page.
    pub async fn get_customer_orders(
        &self,
        customer_id: &str,
        query: CustomerOrdersQuery,
    ) -> Result<CustomerOrdersResponse, AppError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);

        let all_orders = self.store.list_orders().await?;
        let matching: Vec<Order> = all_orders
            .into_iter()
            .filter(|o| o.customer == customer_id)
            .filter(|o| query.status.map_or(true, |s| o.statut == s))
            .collect();

        let total = matching.len() as u64;
        // u64 math: page and limit are client-supplied and can each be
        // u32::MAX, whose product overflows u32.
        let start = (page as u64 - 1) * limit as u64;
        let page_orders = matching
            .into_iter()
            .skip(usize::try_from(start).unwrap_or(usize::MAX))
            .take(limit as usize);

        let mut orders = Vec::new();
        for order in page_orders {
            orders.push(self.get_order_details(&order.order_id).await?.into());
        }

        Ok(CustomerOrdersResponse {
            orders,
            pagination: PaginationMeta {
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit as u64),
            },
        })
    }

    /// Aggregate order statistics over an optional inclusive date range
    /// and customer filter. Revenue counts Paid orders only.
    pub async fn get_order_stats(
        &self,
        query: OrderStatsQuery,
    ) -> Result<OrderStatsResponse, AppError> {
        let orders = self.store.list_orders().await?;

        let filtered: Vec<Order> = orders
            .into_iter()
            .filter(|o| {
                query
                    .customer_id
                    .as_deref()
                    .map_or(true, |c| o.customer == c)
            })
            .filter(|o| query.start_date.map_or(true, |s| o.order_date >= s))
            .filter(|o| query.end_date.map_or(true, |e| o.order_date <= e))
            .collect();

        let count = |status: OrderStatus| {
            filtered.iter().filter(|o| o.statut == status).count() as u64
        };
        let paid_orders = count(OrderStatus::Paid);
        let total_revenue: f64 = filtered
            .iter()
            .filter(|o| o.statut == OrderStatus::Paid)
            .map(|o| o.price)
            .sum();
        let average_order_value = if paid_orders > 0 {
            total_revenue / paid_orders as f64
        } else {
            0.0
        };

        Ok(OrderStatsResponse {
            total_orders: filtered.len() as u64,
            paid_orders,
            unpaid_orders: count(OrderStatus::Unpaid),
            cancelled_orders: count(OrderStatus::Cancelled),
            total_revenue,
            average_order_value,
        })
    }

    /// Referential checks behind order creation. The submitted price is
    /// a trust boundary: it must match the plat's current price exactly.
    async fn validate_order_data(&self, request: &CreateOrderRequest) -> Result<(), AppError> {
        if self
            .store
            .find_customer(&request.customer)
            .await?
            .is_none()
        {
            return Err(AppError::Validation("Client non trouvé".to_string()));
        }

        let plat = self
            .store
            .find_plat(request.plat)
            .await?
            .ok_or_else(|| AppError::Validation("Plat non trouvé".to_string()))?;
        if !plat.availability {
            return Err(AppError::Validation("Plat non disponible".to_string()));
        }

        if self
            .store
            .find_category(request.category)
            .await?
            .is_none()
        {
            return Err(AppError::Validation("Catégorie non trouvée".to_string()));
        }

        if request.price != plat.price {
            return Err(AppError::Validation("Prix incorrect".to_string()));
        }

        if request.pay_method.is_some() && request.payment_phone.is_none() {
            return Err(AppError::Validation(
                "Numéro de téléphone requis pour le paiement".to_string(),
            ));
        }

        Ok(())
    }
}
