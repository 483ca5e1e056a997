//! Request and response shapes of the HTTP surface.
//!
//! The wire format keeps the original API vocabulary: camelCase field
//! names, `ORD####`/`PAY####`/`CLD####` display identifiers and the
//! French business status values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::models::{
    Category, Customer, EnrichedOrder, OrderStatus, PayMethod, PaymentStatus, Plat,
};

fn validate_customer_id(value: &str) -> Result<(), ValidationError> {
    let digits = value.strip_prefix("CLD").unwrap_or("");
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("customer_id_format"))
    }
}

/// Ivorian phone numbers: `+225`/`00225` prefix or a leading `0`,
/// followed by 8 to 10 digits.
fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let rest = if let Some(r) = value.strip_prefix("+225") {
        r
    } else if let Some(r) = value.strip_prefix("00225") {
        r
    } else if value.starts_with('0') {
        &value[1..]
    } else {
        return Err(ValidationError::new("phone_format"));
    };
    if (8..=10).contains(&rest.len()) && rest.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_format"))
    }
}

/// Body of `POST /order`. Client-submitted dates and deadlines are
/// ignored; the server derives them from the creation instant.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(range(min = 1))]
    pub plat: i64,
    #[validate(custom(function = "validate_customer_id"))]
    pub customer: String,
    #[validate(range(min = 1))]
    pub category: i64,
    #[validate(range(min = 0.01))]
    pub price: f64,
    pub pay_method: Option<PayMethod>,
    #[validate(custom(function = "validate_phone"))]
    pub payment_phone: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrdersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_id: Option<String>,
}

/// Body of `POST /payments`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub method: PayMethod,
    #[validate(range(min = 0.01))]
    pub amount: f64,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    pub order_id: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub method: Option<PayMethod>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub customer_id: String,
    pub lastname: String,
    pub firstname: String,
    pub phone: String,
    pub email: String,
}

impl From<Customer> for CustomerDetails {
    fn from(c: Customer) -> Self {
        Self {
            customer_id: c.customer_id,
            lastname: c.lastname,
            firstname: c.firstname,
            phone: c.phone,
            email: c.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatDetails {
    pub plat_id: i64,
    pub plat_name: String,
    pub description: String,
    pub price: f64,
    pub image_path: String,
    pub availability: bool,
}

impl From<Plat> for PlatDetails {
    fn from(p: Plat) -> Self {
        Self {
            plat_id: p.plat_id,
            plat_name: p.plat_name,
            description: p.description,
            price: p.price,
            image_path: p.image_path,
            availability: p.availability,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetails {
    pub category_id: i64,
    pub category_name: String,
}

impl From<Category> for CategoryDetails {
    fn from(c: Category) -> Self {
        Self {
            category_id: c.category_id,
            category_name: c.category_name,
        }
    }
}

/// An order joined with its referenced entities, as returned by every
/// order endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub plat: i64,
    pub customer: String,
    pub category: i64,
    pub price: f64,
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    pub payment_deadline: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
    pub statut: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_method: Option<PayMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_date: Option<DateTime<Utc>>,
    pub customer_details: Option<CustomerDetails>,
    pub plat_details: Option<PlatDetails>,
    pub category_details: Option<CategoryDetails>,
}

impl From<EnrichedOrder> for OrderResponse {
    fn from(e: EnrichedOrder) -> Self {
        let order = e.order;
        Self {
            order_id: order.order_id,
            plat: order.plat,
            customer: order.customer,
            category: order.category,
            price: order.price,
            order_date: order.order_date,
            order_time: order.order_time,
            payment_deadline: order.payment_deadline,
            delivery_date: order.delivery_date,
            statut: order.statut,
            pay_method: order.pay_method,
            payment_phone: order.payment_phone,
            cancel_reason: order.cancel_reason,
            cancel_date: order.cancel_date,
            customer_details: e.customer_details.map(Into::into),
            plat_details: e.plat_details.map(Into::into),
            category_details: e.category_details.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct CustomerOrdersResponse {
    pub orders: Vec<OrderResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatsResponse {
    pub total_orders: u64,
    pub paid_orders: u64,
    pub unpaid_orders: u64,
    pub cancelled_orders: u64,
    pub total_revenue: f64,
    pub average_order_value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub pay_code: String,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub status: PaymentStatus,
    pub details: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAckResponse {
    pub success: bool,
    pub pay_code: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatsResponse {
    pub total_payments: u64,
    pub waiting_payments: u64,
    pub completed_payments: u64,
    pub failed_payments: u64,
    pub total_amount: f64,
    pub by_method: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_id_format_is_enforced() {
        assert!(validate_customer_id("CLD0001").is_ok());
        assert!(validate_customer_id("CLD1").is_err());
        assert!(validate_customer_id("ORD0001").is_err());
        assert!(validate_customer_id("CLD00A1").is_err());
    }

    #[test]
    fn phone_format_accepts_local_and_international_prefixes() {
        assert!(validate_phone("0700000000").is_ok());
        assert!(validate_phone("+22507000000").is_ok());
        assert!(validate_phone("0022507000000").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("07abc").is_err());
    }

    #[test]
    fn create_order_request_ignores_client_supplied_dates() {
        let request: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "plat": 1,
            "customer": "CLD0001",
            "category": 1,
            "price": 2500.0,
            "orderDate": "1999-01-01",
            "paymentDeadline": "1999-01-01T00:00:00Z",
            "deliveryDate": "1999-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(request.plat, 1);
        assert!(request.validate().is_ok());
    }
}
