use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::providers::ProviderError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Business-rule violation (mismatched price, unavailable plat, ...).
    #[error("{0}")]
    Validation(String),

    /// Malformed request payload caught by the validator derive.
    #[error("Validation error: {0}")]
    RequestValidation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    /// Transition rejected by the order/payment state machine.
    #[error("{0}")]
    InvalidState(String),

    /// Webhook payload without a resolvable pay code.
    #[error("{0}")]
    MissingReference(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingReference => {
                AppError::MissingReference("Code de paiement manquant dans le webhook".to_string())
            }
            ProviderError::UnknownWebhookProvider(name) => {
                AppError::Validation(format!("Fournisseur de webhook non reconnu: {name}"))
            }
            other => AppError::PaymentProvider(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::RequestValidation(err) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(err.to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::MissingReference(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::PaymentProvider(err) => {
                tracing::error!(error = %err, "payment provider call failed");
                (StatusCode::BAD_GATEWAY, err.to_string(), None)
            }
            // Persistence and internal failures are logged with full detail
            // but never leak it in the response body.
            AppError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
