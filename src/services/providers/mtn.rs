//! MTN Mobile Money client (Collections API).

use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use super::{InitiationOutcome, ProviderError, StatusOutcome};
use crate::config::MtnConfig;
use crate::models::PaymentStatus;

const PROVIDER: &str = "MTN MoMo";

#[derive(Clone)]
pub struct MtnClient {
    client: Client,
    config: MtnConfig,
}

impl MtnClient {
    pub fn new(client: Client, config: MtnConfig) -> Self {
        Self { client, config }
    }

    /// Submit a request-to-pay. MTN answers 202 with an empty body; the
    /// pay code doubles as the transaction reference.
    pub async fn request_to_pay(
        &self,
        pay_code: &str,
        amount: f64,
        phone: &str,
    ) -> Result<InitiationOutcome, ProviderError> {
        let url = format!("{}/collection/v1_0/requesttopay", self.config.api_url);
        let body = json!({
            "amount": amount.to_string(),
            "currency": "XOF",
            "externalId": pay_code,
            "payer": {
                "partyIdType": "MSISDN",
                "partyId": phone
            },
            "payerMessage": "Paiement commande PeerFood",
            "payeeNote": format!("Commande {pay_code}")
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .header("X-Reference-Id", pay_code)
            .header("X-Target-Environment", &self.config.environment)
            .header(
                "Ocp-Apim-Subscription-Key",
                self.config.subscription_key.expose_secret(),
            )
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "MTN MoMo request-to-pay rejected");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status,
                body,
            });
        }

        tracing::info!(pay_code = %pay_code, "MTN MoMo request-to-pay accepted");
        Ok(InitiationOutcome {
            transaction_id: pay_code.to_string(),
            status: PaymentStatus::Waiting,
            message: "Paiement initié avec succès".to_string(),
            payment_url: None,
        })
    }

    /// Poll a request-to-pay. Transport or API failures degrade to a
    /// `Failed` outcome carrying the error in the details.
    pub async fn payment_status(&self, transaction_id: &str) -> StatusOutcome {
        match self.fetch_status(transaction_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, transaction_id = %transaction_id, "MTN MoMo status check failed");
                StatusOutcome {
                    status: PaymentStatus::Failed,
                    details: json!({ "error": err.to_string() }),
                }
            }
        }
    }

    async fn fetch_status(&self, transaction_id: &str) -> Result<StatusOutcome, ProviderError> {
        let url = format!(
            "{}/collection/v1_0/requesttopay/{}",
            self.config.api_url, transaction_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .header("X-Target-Environment", &self.config.environment)
            .header(
                "Ocp-Apim-Subscription-Key",
                self.config.subscription_key.expose_secret(),
            )
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
        Some("SUCCESSFUL") => PaymentStatus::Completed,
        _ => PaymentStatus::Failed,
    }
}

fn map_status(raw: &str) -> PaymentStatus {
    match raw {
        "SUCCESSFUL" => PaymentStatus::Completed,
        "FAILED" => PaymentStatus::Failed,
        _ => PaymentStatus::Waiting,
    }
}
