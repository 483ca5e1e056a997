//! Wave checkout sessions client.

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{InitiationOutcome, ProviderError, StatusOutcome};
use crate::config::{CallbackConfig, WaveConfig};
use crate::models::PaymentStatus;

const PROVIDER: &str = "Wave";

#[derive(Clone)]
pub struct WaveClient {
    client: Client,
    config: WaveConfig,
    callbacks: CallbackConfig,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    #[serde(default)]
    wave_launch_url: Option<String>,
}

impl WaveClient {
    pub fn new(client: Client, config: WaveConfig, callbacks: CallbackConfig) -> Self {
        Self {
            client,
            config,
            callbacks,
        }
    }

    /// Open a checkout session. The pay code travels in the session
    /// metadata and comes back on the webhook.
    pub async fn create_session(
        &self,
        pay_code: &str,
        amount: f64,
        phone: &str,
    ) -> Result<InitiationOutcome, ProviderError> {
        let url = format!("{}/checkout/sessions", self.config.api_url);
        let body = json!({
            "amount": amount.to_string(),
            "currency": "XOF",
            "error_url": format!("{}/payment/error", self.callbacks.frontend_url),
            "success_url": format!("{}/payment/success", self.callbacks.frontend_url),
            "metadata": {
                "order_id": pay_code,
                "customer_phone": phone
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!(status = %status, body = %text, "Wave session creation rejected");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status,
                body: text,
            });
        }

        let session: CheckoutSession =
            serde_json::from_str(&text).map_err(|source| ProviderError::MalformedResponse {
                provider: PROVIDER,
                source,
            })?;

        tracing::info!(pay_code = %pay_code, session_id = %session.id, "Wave checkout session created");
        Ok(InitiationOutcome {
            transaction_id: session.id,
            status: PaymentStatus::Waiting,
            message: "Paiement initié avec succès".to_string(),
            payment_url: session.wave_launch_url,
        })
    }

    /// Poll a checkout session. Transport or API failures degrade to a
    /// `Failed` outcome carrying the error in the details.
    pub async fn session_status(&self, transaction_id: &str) -> StatusOutcome {
        match self.fetch_status(transaction_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, transaction_id = %transaction_id, "Wave status check failed");
                StatusOutcome {
                    status: PaymentStatus::Failed,
                    details: json!({ "error": err.to_string() }),
                }
            }
        }
    }

    async fn fetch_status(&self, transaction_id: &str) -> Result<StatusOutcome, ProviderError> {
        let url = format!("{}/checkout/sessions/{}", self.config.api_url, transaction_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let details: Value =
            serde_json::from_str(&body).map_err(|source| ProviderError::MalformedResponse {
                provider: PROVIDER,
                source,
            })?;
        let raw = details.get("status").and_then(Value::as_str).unwrap_or("");

        Ok(StatusOutcome {
            status: map_status(raw),
            details,
        })
    }
}

pub(super) fn webhook_status(payload: &Value) -> PaymentStatus {
    match payload.get("status").and_then(Value::as_str) {
        Some("complete") => PaymentStatus::Completed,
        _ => PaymentStatus::Failed,
    }
}

fn map_status(raw: &str) -> PaymentStatus {
    match raw {
        "complete" => PaymentStatus::Completed,
        "cancelled" | "failed" => PaymentStatus::Failed,
        _ => PaymentStatus::Waiting,
    }
}
