//! Mobile money provider clients.
//!
//! Three providers sit behind [`PaymentGateway`]: MTN MoMo, Orange Money
//! and Wave. Each client maps its provider's status vocabulary onto the
//! canonical [`PaymentStatus`] and exposes the same three capabilities:
//! initiate a charge, check a transaction status, parse a webhook.

pub mod mtn;
pub mod orange;
pub mod wave;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::config::{CallbackConfig, ProvidersConfig};
use crate::models::{PayMethod, PaymentStatus};

pub use mtn::MtnClient;
pub use orange::OrangeClient;
pub use wave::WaveClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Api {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{provider} returned an unexpected payload: {source}")]
    MalformedResponse {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown webhook provider: {0}")]
    UnknownWebhookProvider(String),

    #[error("webhook payload carries no payment reference")]
    MissingReference,
}

/// Result of a charge initiation.
#[derive(Debug, Clone)]
pub struct InitiationOutcome {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub message: String,
    /// Checkout URL for providers that redirect the payer to a web page.
    pub payment_url: Option<String>,
}

/// Result of a status poll.
#[derive(Debug, Clone)]
pub struct StatusOutcome {
    pub status: PaymentStatus,
    pub details: Value,
}

/// Normalized content of an inbound provider webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookNotice {
    pub pay_code: String,
    pub status: PaymentStatus,
    pub transaction_number: Option<String>,
}

/// Dispatches payment operations to the provider matching the method.
/// Credentials come from [`ProvidersConfig`] at construction time.
#[derive(Clone)]
pub struct PaymentGateway {
    mtn: MtnClient,
    orange: OrangeClient,
    wave: WaveClient,
}

impl PaymentGateway {
    pub fn new(providers: &ProvidersConfig, callbacks: &CallbackConfig) -> Self {
        let client = Client::new();
        Self {
            mtn: MtnClient::new(client.clone(), providers.mtn.clone()),
            orange: OrangeClient::new(client.clone(), providers.orange.clone(), callbacks.clone()),
            wave: WaveClient::new(client, providers.wave.clone(), callbacks.clone()),
        }
    }

    pub async fn initiate(
        &self,
        method: PayMethod,
        pay_code: &str,
        amount: f64,
        phone: &str,
    ) -> Result<InitiationOutcome, ProviderError> {
        match method {
            PayMethod::MtnMomo => self.mtn.request_to_pay(pay_code, amount, phone).await,
            PayMethod::OrangeMoney => self.orange.web_payment(pay_code, amount).await,
            PayMethod::Wave => self.wave.create_session(pay_code, amount, phone).await,
        }
    }

    /// Poll the provider for a transaction's current status. Provider
    /// failures are reported as a `Failed` outcome with the error in the
    /// details, never as an error.
    pub async fn check_status(&self, method: PayMethod, transaction_id: &str) -> StatusOutcome {
        match method {
            PayMethod::MtnMomo => self.mtn.payment_status(transaction_id).await,
            PayMethod::OrangeMoney => self.orange.transaction_status(transaction_id).await,
            PayMethod::Wave => self.wave.session_status(transaction_id).await,
        }
    }

    /// Extract `(payCode, status)` from an inbound webhook. Webhooks are
    /// binary: the provider's success token maps to `Completed`,
    /// everything else to `Failed`.
    pub fn parse_webhook(
        &self,
        provider: &str,
        payload: &Value,
    ) -> Result<WebhookNotice, ProviderError> {
        let (pay_code, status) = match provider {
            "mtn" => (
                payload.get("externalId").and_then(Value::as_str),
                mtn::webhook_status(payload),
            ),
            "orange" => (
                payload.get("order_id").and_then(Value::as_str),
                orange::webhook_status(payload),
            ),
            "wave" => (
                payload
                    .get("metadata")
                    .and_then(|m| m.get("order_id"))
                    .and_then(Value::as_str),
                wave::webhook_status(payload),
            ),
            other => return Err(ProviderError::UnknownWebhookProvider(other.to_string())),
        };

        let pay_code = pay_code.ok_or(ProviderError::MissingReference)?;
        let transaction_number = payload
            .get("transactionId")
            .or_else(|| payload.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(WebhookNotice {
            pay_code: pay_code.to_string(),
            status,
            transaction_number,
        })
    }
}
