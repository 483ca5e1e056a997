//! Orange Money WebPayment client.

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{InitiationOutcome, ProviderError, StatusOutcome};
use crate::config::{CallbackConfig, OrangeConfig};
use crate::models::PaymentStatus;

const PROVIDER: &str = "Orange Money";

#[derive(Clone)]
pub struct OrangeClient {
    client: Client,
    config: OrangeConfig,
    callbacks: CallbackConfig,
}

#[derive(Debug, Deserialize)]
struct WebPaymentResponse {
    pay_token: String,
    #[serde(default)]
    payment_url: Option<String>,
}

impl OrangeClient {
    pub fn new(client: Client, config: OrangeConfig, callbacks: CallbackConfig) -> Self {
        Self {
            client,
            config,
            callbacks,
        }
    }

    /// Open a web payment session. The returned `pay_token` is the
    /// transaction reference for later status checks.
    pub async fn web_payment(
        &self,
        pay_code: &str,
        amount: f64,
    ) -> Result<InitiationOutcome, ProviderError> {
        let url = format!(
            "{}/orange-money-webpay/dev/v1/webpayment",
            self.config.api_url
        );
        let body = json!({
            "merchant_key": self.config.merchant_id,
            "currency": "XOF",
            "order_id": pay_code,
            "amount": amount,
            "return_url": format!("{}/payment/success", self.callbacks.frontend_url),
            "cancel_url": format!("{}/payment/error", self.callbacks.frontend_url),
            "notif_url": format!("{}/payments/webhook/orange", self.callbacks.backend_url),
            "lang": "fr",
            "reference": pay_code
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
            tracing::error!(status = %status, body = %text, "Orange Money web payment rejected");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status,
                body: text,
            });
        }

        let payment: WebPaymentResponse =
            serde_json::from_str(&text).map_err(|source| ProviderError::MalformedResponse {
                provider: PROVIDER,
                source,
            })?;

        tracing::info!(pay_code = %pay_code, pay_token = %payment.pay_token, "Orange Money web payment opened");
        Ok(InitiationOutcome {
            transaction_id: payment.pay_token,
            status: PaymentStatus::Waiting,
            message: "Paiement initié avec succès".to_string(),
            payment_url: payment.payment_url,
        })
    }

    /// Poll a transaction. Transport or API failures degrade to a
    /// `Failed` outcome carrying the error in the details.
    pub async fn transaction_status(&self, transaction_id: &str) -> StatusOutcome {
        match self.fetch_status(transaction_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, transaction_id = %transaction_id, "Orange Money status check failed");
                StatusOutcome {
                    status: PaymentStatus::Failed,
                    details: json!({ "error": err.to_string() }),
                }
            }
        }
    }

    async fn fetch_status(&self, transaction_id: &str) -> Result<StatusOutcome, ProviderError> {
        let url = format!(
            "{}/orange-money-webpay/dev/v1/transactionstatus",
            self.config.api_url
        );

        let response = self
            .client
            .get(&url)
            .query(&[("order_id", transaction_id), ("pay_token", transaction_id)])
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
        Some("SUCCESS") => PaymentStatus::Completed,
        _ => PaymentStatus::Failed,
    }
}

fn map_status(raw: &str) -> PaymentStatus {
    match raw {
        "SUCCESS" => PaymentStatus::Completed,
        "FAILED" => PaymentStatus::Failed,
        _ => PaymentStatus::Waiting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_vocabulary_maps_to_canonical_states() {
        assert_eq!(map_status("SUCCESS"), PaymentStatus::Completed);
        assert_eq!(map_status("FAILED"), PaymentStatus::Failed);
        assert_eq!(map_status("INITIATED"), PaymentStatus::Waiting);
    }
}
