//! Order endpoints. Handlers stay thin: validate the payload, delegate
//! to the order service, shape the response.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    dtos::{
        CancelOrderRequest, CreateOrderRequest, CustomerOrdersQuery, CustomerOrdersResponse,
        OrderResponse, OrderStatsQuery, OrderStatsResponse,
    },
    error::AppError,
    AppState,
};

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    payload.validate()?;

    let enriched = state.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(enriched.into())))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let enriched = state.orders.get_order_details(&order_id).await?;
    Ok(Json(enriched.into()))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    payload: Option<Json<CancelOrderRequest>>,
) -> Result<Json<OrderResponse>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let enriched = state.orders.cancel_order(&order_id, reason).await?;
    Ok(Json(enriched.into()))
}

pub async fn get_customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<CustomerOrdersQuery>,
) -> Result<Json<CustomerOrdersResponse>, AppError> {
    let page = state.orders.get_customer_orders(&customer_id, query).await?;
    Ok(Json(page))
}

pub async fn get_order_stats(
    State(state): State<AppState>,
    Query(query): Query<OrderStatsQuery>,
) -> Result<Json<OrderStatsResponse>, AppError> {
    let stats = state.orders.get_order_stats(query).await?;
    Ok(Json(stats))
}
