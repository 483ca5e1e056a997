//! Payment lifecycle: charge initiation, status polling, webhook
//! reconciliation and retries.
//!
//! Reconciliation is idempotent: `Completed` is a terminal payment state
//! that neither the poll path nor the webhook path will ever downgrade,
//! so applying either path twice, or both in any order, converges to the
//! same final state.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::providers::PaymentGateway;
use crate::dtos::{
    InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatsQuery, PaymentStatsResponse,
    PaymentStatusResponse, WebhookAckResponse,
};
use crate::error::AppError;
use crate::models::{OrderStatus, PayMethod, Payment, PaymentStatus};
use crate::store::{OrderPatch, PaymentPatch, Store};

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn Store>,
    gateway: PaymentGateway,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>, gateway: PaymentGateway) -> Self {
        Self { store, gateway }
    }

    /// Initiate a mobile money charge.
    ///
    /// The payment row is persisted as `Waiting` before the provider is
    /// called, so a provider failure still leaves an auditable attempt
    /// record; the row is flipped to `Failed` when the call errors.
    pub async fn initiate_payment(
        &self,
        request: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, AppError> {
        let seq = self.store.next_payment_seq().await?;
        let pay_code = format!("PAY{seq:04}");

        let payment = Payment {
            pay_code: pay_code.clone(),
            order_id: request.order_id.clone(),
            method: request.method,
            amount: request.amount,
            transaction_number: None,
            statut: PaymentStatus::Waiting,
            payment_date: None,
        };
        self.store.create_payment(&payment).await?;

        tracing::info!(
            pay_code = %pay_code,
            order_id = %request.order_id,
            method = %request.method,
            amount = request.amount,
            "initiating payment"
        );

        let outcome = match self
            .gateway
            .initiate(request.method, &pay_code, request.amount, &request.phone)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                // Keep the attempt on record before surfacing the failure.
                self.store
                    .update_payment(
                        &pay_code,
                        PaymentPatch {
                            statut: Some(PaymentStatus::Failed),
                            ..Default::default()
                        },
                    )
                    .await?;
                return Err(err.into());
            }
        };

        self.store
            .update_payment(
                &pay_code,
                PaymentPatch {
                    statut: Some(outcome.status),
                    transaction_number: Some(outcome.transaction_id.clone()),
                    payment_date: (outcome.status == PaymentStatus::Completed)
                        .then(Utc::now),
                },
            )
            .await?;
        if outcome.status == PaymentStatus::Completed {
            self.mark_order_paid(&request.order_id).await?;
        }

        Ok(InitiatePaymentResponse {
            pay_code,
            transaction_id: outcome.transaction_id,
            status: outcome.status,
            message: outcome.message,
            payment_url: outcome.payment_url,
        })
    }

    /// Poll the provider for a payment's status and persist any change.
    /// A stored `Completed` status is returned as-is without a provider
    /// round trip.
    pub async fn check_payment_status(
        &self,
        pay_code: &str,
    ) -> Result<PaymentStatusResponse, AppError> {
        let payment = self
            .store
            .find_payment(pay_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Paiement non trouvé".to_string()))?;

        if payment.statut == PaymentStatus::Completed {
            return Ok(PaymentStatusResponse {
                status: PaymentStatus::Completed,
                details: serde_json::json!({ "payCode": pay_code, "statut": "Completed" }),
            });
        }

        let transaction_id = payment
            .transaction_number
            .as_deref()
            .unwrap_or(&payment.pay_code);
        let outcome = self.gateway.check_status(payment.method, transaction_id).await;

        if outcome.status != payment.statut {
            self.store
                .update_payment(
                    pay_code,
                    PaymentPatch {
                        statut: Some(outcome.status),
                        payment_date: (outcome.status == PaymentStatus::Completed)
                            .then(Utc::now),
                        ..Default::default()
                    },
                )
                .await?;

            if outcome.status == PaymentStatus::Completed {
                self.mark_order_paid(&payment.order_id).await?;
            }

            tracing::info!(
                pay_code = %pay_code,
                from = %payment.statut,
                to = %outcome.status,
                "payment status updated from poll"
            );
        }

        Ok(PaymentStatusResponse {
            status: outcome.status,
            details: outcome.details,
        })
    }

    /// Apply an inbound provider webhook to the payment and its order.
    /// Replays of a completed payment acknowledge without writing.
    pub async fn handle_webhook(
        &self,
        provider: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookAckResponse, AppError> {
        let notice = self.gateway.parse_webhook(provider, payload)?;

        tracing::info!(
            provider = %provider,
            pay_code = %notice.pay_code,
            status = %notice.status,
            "webhook received"
        );

        let payment = self
            .store
            .find_payment(&notice.pay_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Paiement non trouvé".to_string()))?;

        if payment.statut == PaymentStatus::Completed {
            return Ok(WebhookAckResponse {
                success: true,
                pay_code: notice.pay_code,
                status: PaymentStatus::Completed,
            });
        }

        self.store
            .update_payment(
                &notice.pay_code,
                PaymentPatch {
                    statut: Some(notice.status),
                    transaction_number: notice.transaction_number.clone(),
                    payment_date: (notice.status == PaymentStatus::Completed).then(Utc::now),
                },
            )
            .await?;

        if notice.status == PaymentStatus::Completed {
            self.mark_order_paid(&payment.order_id).await?;
        }

        tracing::info!(
            pay_code = %notice.pay_code,
            status = %notice.status,
            "payment updated from webhook"
        );

        Ok(WebhookAckResponse {
            success: true,
            pay_code: notice.pay_code,
            status: notice.status,
        })
    }

    /// Re-initiate a payment that never completed, under a fresh pay
    /// code. The old row is kept as audit trail.
    pub async fn retry_payment(
        &self,
        pay_code: &str,
    ) -> Result<InitiatePaymentResponse, AppError> {
        let payment = self
            .store
            .find_payment(pay_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Paiement non trouvé".to_string()))?;

        if payment.statut == PaymentStatus::Completed {
            return Err(AppError::InvalidState(
                "Le paiement a déjà été complété".to_string(),
            ));
        }

        let order = self
            .store
            .find_order(&payment.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Commande associée non trouvée".to_string()))?;
        let phone = order.payment_phone.ok_or_else(|| {
            AppError::Validation("Numéro de téléphone de paiement manquant".to_string())
        })?;

        self.initiate_payment(InitiatePaymentRequest {
            method: payment.method,
            amount: payment.amount,
            phone,
            order_id: payment.order_id,
        })
        .await
    }

    /// Aggregate payment statistics. When a date range is given, only
    /// payments with a `payment_date` inside it are counted.
    pub async fn get_payment_stats(
        &self,
        query: PaymentStatsQuery,
    ) -> Result<PaymentStatsResponse, AppError> {
        let payments = self.store.list_payments().await?;

        let filtered: Vec<Payment> = payments
            .into_iter()
            .filter(|p| query.method.map_or(true, |m| p.method == m))
            .filter(|p| match (query.start_date, query.end_date) {
                (None, None) => true,
                (start, end) => p.payment_date.map_or(false, |d| {
                    let day = d.date_naive();
                    start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
                }),
            })
            .collect();

        let mut by_method: BTreeMap<String, u64> = BTreeMap::new();
        for method in [PayMethod::MtnMomo, PayMethod::OrangeMoney, PayMethod::Wave] {
            by_method.insert(method.to_string(), 0);
        }
        for payment in &filtered {
            *by_method.entry(payment.method.to_string()).or_insert(0) += 1;
        }

        let count = |status: PaymentStatus| {
            filtered.iter().filter(|p| p.statut == status).count() as u64
        };

        Ok(PaymentStatsResponse {
            total_payments: filtered.len() as u64,
            waiting_payments: count(PaymentStatus::Waiting),
            completed_payments: count(PaymentStatus::Completed),
            failed_payments: count(PaymentStatus::Failed),
            total_amount: filtered
                .iter()
                .filter(|p| p.statut == PaymentStatus::Completed)
                .map(|p| p.amount)
                .sum(),
            by_method,
        })
    }

    async fn mark_order_paid(&self, order_id: &str) -> Result<(), AppError> {
        self.store
            .update_order(
                order_id,
                OrderPatch {
                    statut: Some(OrderStatus::Paid),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(order_id = %order_id, "order marked as paid");
        Ok(())
    }
}
