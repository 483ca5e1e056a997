use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered customer. Customer ids follow the `CLD####` format.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub customer_id: String,
    pub lastname: String,
    pub firstname: String,
    pub phone: String,
    pub email: String,
}

/// A menu item (dish).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Plat {
    #[serde(rename = "_id")]
    pub plat_id: i64,
    pub plat_name: String,
    pub description: String,
    pub price: f64,
    pub image_path: String,
    pub availability: bool,
}

/// A menu category.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub category_id: i64,
    pub category_name: String,
}

/// A customer order. Order ids follow the `ORD####` format.
///
/// `order_date`, `order_time`, `payment_deadline` and `delivery_date` are
/// always derived from the creation instant on the server, never taken
/// from the client.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
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
}

/// A payment attempt against an order. Pay codes follow the `PAY####`
/// format; a retry creates a new row under a new pay code rather than
/// mutating the old one.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub pay_code: String,
    pub order_id: String,
    pub method: PayMethod,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_number: Option<String>,
    pub statut: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Unpaid,
    Paid,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Unpaid => write!(f, "Unpaid"),
            OrderStatus::Paid => write!(f, "Paid"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Canonical payment status. Every provider's own vocabulary is mapped
/// onto these three states; `Completed` is terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Waiting,
    Completed,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Waiting => write!(f, "Waiting"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Supported mobile money providers.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PayMethod {
    #[serde(rename = "MTN MoMo")]
    MtnMomo,
    #[serde(rename = "Orange Money")]
    OrangeMoney,
    Wave,
}

impl fmt::Display for PayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayMethod::MtnMomo => write!(f, "MTN MoMo"),
            PayMethod::OrangeMoney => write!(f, "Orange Money"),
            PayMethod::Wave => write!(f, "Wave"),
        }
    }
}

/// An order joined with the entities it references. A reference that no
/// longer resolves yields `None` in its slot instead of failing the read.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub customer_details: Option<Customer>,
    pub plat_details: Option<Plat>,
    pub category_details: Option<Category>,
}
