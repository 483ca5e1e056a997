//! Payment endpoints, including the provider webhook sink.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use validator::Validate;

use crate::{
    dtos::{
        InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatsQuery, PaymentStatsResponse,
        PaymentStatusResponse, WebhookAckResponse,
    },
    error::AppError,
    AppState,
};

pub async fn initiate_payment(
    State(state): State<AppState>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<InitiatePaymentResponse>), AppError> {
    payload.validate()?;

    let receipt = state.payments.initiate_payment(payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_payment_status(
    State(state): State<AppState>,
    Path(pay_code): Path<String>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let status = state.payments.check_payment_status(&pay_code).await?;
    Ok(Json(status))
}

pub async fn retry_payment(
    State(state): State<AppState>,
    Path(pay_code): Path<String>,
) -> Result<(StatusCode, Json<InitiatePaymentResponse>), AppError> {
    let receipt = state.payments.retry_payment(&pay_code).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Provider notification sink. The provider name travels in the path;
/// the payload shape is provider-specific and parsed by the gateway.
pub async fn payment_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<WebhookAckResponse>, AppError> {
    let ack = state.payments.handle_webhook(&provider, &payload).await?;
    Ok(Json(ack))
}

pub async fn get_payment_stats(
    State(state): State<AppState>,
    Query(query): Query<PaymentStatsQuery>,
) -> Result<Json<PaymentStatsResponse>, AppError> {
    let stats = state.payments.get_payment_stats(query).await?;
    Ok(Json(stats))
}
