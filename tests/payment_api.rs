mod common;

use common::{TestApp, PLAT_PRICE, TEST_PHONE};
use ordering_service::store::Store;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wave_session_body() -> serde_json::Value {
    serde_json::json!({
        "id": "cs_123",
        "wave_launch_url": "https://pay.wave.com/c/cs_123"
    })
}

async fn mount_wave_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wave_session_body()))
        .mount(server)
        .await;
}

async fn initiate_wave_payment(app: &TestApp, order_id: &str) -> serde_json::Value {
    let response = app
        .client
        .post(format!("{}/payments", app.address))
        .json(&serde_json::json!({
            "method": "Wave",
            "amount": PLAT_PRICE,
            "phone": TEST_PHONE,
            "orderId": order_id
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Invalid payment response")
}

#[tokio::test]
async fn wave_initiation_records_a_waiting_payment() {
    let provider = MockServer::start().await;
    mount_wave_session(&provider).await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let order = app.create_order().await;
    let payment = initiate_wave_payment(&app, order["orderId"].as_str().unwrap()).await;

    assert!(payment["payCode"].as_str().unwrap().starts_with("PAY"));
    assert_eq!(payment["transactionId"], "cs_123");
    assert_eq!(payment["status"], "Waiting");
    assert_eq!(payment["paymentUrl"], "https://pay.wave.com/c/cs_123");
}

#[tokio::test]
async fn webhook_completes_payment_and_marks_order_paid() {
    let provider = MockServer::start().await;
    mount_wave_session(&provider).await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let order = app.create_order().await;
    let order_id = order["orderId"].as_str().unwrap();
    let payment = initiate_wave_payment(&app, order_id).await;
    let pay_code = payment["payCode"].as_str().unwrap();

    let response = app
        .client
        .post(format!("{}/payments/webhook/wave", app.address))
        .json(&serde_json::json!({
            "status": "complete",
            "id": "txn_001",
            "metadata": { "order_id": pay_code }
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let ack: serde_json::Value = response.json().await.unwrap();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["payCode"], pay_code);
    assert_eq!(ack["status"], "Completed");

    let refreshed: serde_json::Value = app
        .client
        .get(format!("{}/order/{}", app.address, order_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(refreshed["statut"], "Paid");
}

#[tokio::test]
async fn webhook_replay_is_idempotent() {
    let provider = MockServer::start().await;
    mount_wave_session(&provider).await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let order = app.create_order().await;
    let payment = initiate_wave_payment(&app, order["orderId"].as_str().unwrap()).await;
    let pay_code = payment["payCode"].as_str().unwrap();

    let webhook = serde_json::json!({
        "status": "complete",
        "id": "txn_001",
        "metadata": { "order_id": pay_code }
    });

    for _ in 0..2 {
        let response = app
            .client
            .post(format!("{}/payments/webhook/wave", app.address))
            .json(&webhook)
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_success());
        let ack: serde_json::Value = response.json().await.unwrap();
        assert_eq!(ack["status"], "Completed");
    }

    // A late failure notification never downgrades the payment.
    let late_failure = app
        .client
        .post(format!("{}/payments/webhook/wave", app.address))
        .json(&serde_json::json!({
            "status": "failed",
            "metadata": { "order_id": pay_code }
        }))
        .send()
        .await
        .unwrap();
    assert!(late_failure.status().is_success());
    let ack: serde_json::Value = late_failure.json().await.unwrap();
    assert_eq!(ack["status"], "Completed");
}

#[tokio::test]
async fn status_poll_converges_with_the_provider() {
    let provider = MockServer::start().await;
    mount_wave_session(&provider).await;
    Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": "cs_123", "status": "complete" })),
        )
        .mount(&provider)
        .await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let order = app.create_order().await;
    let order_id = order["orderId"].as_str().unwrap();
    let payment = initiate_wave_payment(&app, order_id).await;
    let pay_code = payment["payCode"].as_str().unwrap();

    let response = app
        .client
        .get(format!("{}/payments/{}/status", app.address, pay_code))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let status: serde_json::Value = response.json().await.unwrap();
    assert_eq!(status["status"], "Completed");

    let refreshed: serde_json::Value = app
        .client
        .get(format!("{}/order/{}", app.address, order_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(refreshed["statut"], "Paid");
}

#[tokio::test]
async fn webhook_without_reference_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/payments/webhook/wave", app.address))
        .json(&serde_json::json!({ "status": "complete" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["error"], "Code de paiement manquant dans le webhook");
}

#[tokio::test]
async fn webhook_from_unknown_provider_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/payments/webhook/paypal", app.address))
        .json(&serde_json::json!({ "status": "complete" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn mtn_initiation_uses_the_pay_code_as_reference() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/collection/v1_0/requesttopay$"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&provider)
        .await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let order = app.create_order().await;
    let response = app
        .client
        .post(format!("{}/payments", app.address))
        .json(&serde_json::json!({
            "method": "MTN MoMo",
            "amount": PLAT_PRICE,
            "phone": TEST_PHONE,
            "orderId": order["orderId"]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let payment: serde_json::Value = response.json().await.unwrap();
    let pay_code = payment["payCode"].as_str().unwrap();
    assert_eq!(payment["transactionId"], pay_code);
    assert_eq!(payment["status"], "Waiting");
}

#[tokio::test]
async fn provider_failure_keeps_the_order_and_records_the_attempt() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&provider)
        .await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let mut body = app.order_body(PLAT_PRICE);
    body["payMethod"] = serde_json::json!("Wave");
    body["paymentPhone"] = serde_json::json!(TEST_PHONE);

    let response = app
        .client
        .post(format!("{}/order", app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let order: serde_json::Value = response.json().await.unwrap();
    assert_eq!(order["statut"], "Unpaid");

    let payments = app
        .store
        .payments_for_order(order["orderId"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(
        payments[0].statut,
        ordering_service::models::PaymentStatus::Failed
    );
}

#[tokio::test]
async fn retry_after_failure_issues_a_fresh_pay_code() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&provider)
        .await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let mut body = app.order_body(PLAT_PRICE);
    body["payMethod"] = serde_json::json!("Wave");
    body["paymentPhone"] = serde_json::json!(TEST_PHONE);
    let order: serde_json::Value = app
        .client
        .post(format!("{}/order", app.address))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["orderId"].as_str().unwrap();

    let failed = app.store.payments_for_order(order_id).await.unwrap();
    let failed_code = failed[0].pay_code.clone();

    // Provider comes back up.
    provider.reset().await;
    mount_wave_session(&provider).await;

    let response = app
        .client
        .post(format!("{}/payments/{}/retry", app.address, failed_code))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let retried: serde_json::Value = response.json().await.unwrap();
    let new_code = retried["payCode"].as_str().unwrap();
    assert_ne!(new_code, failed_code);
    assert_eq!(retried["status"], "Waiting");

    // The failed attempt stays on record next to the new one.
    let rows = app.store.payments_for_order(order_id).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn retry_of_a_completed_payment_conflicts() {
    let provider = MockServer::start().await;
    mount_wave_session(&provider).await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let order = app.create_order().await;
    let payment = initiate_wave_payment(&app, order["orderId"].as_str().unwrap()).await;
    let pay_code = payment["payCode"].as_str().unwrap();

    app.client
        .post(format!("{}/payments/webhook/wave", app.address))
        .json(&serde_json::json!({
            "status": "complete",
            "id": "txn_001",
            "metadata": { "order_id": pay_code }
        }))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .post(format!("{}/payments/{}/retry", app.address, pay_code))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 409);
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["error"], "Le paiement a déjà été complété");
}

#[tokio::test]
async fn payment_stats_break_down_by_status_and_method() {
    let provider = MockServer::start().await;
    mount_wave_session(&provider).await;
    let app = TestApp::spawn_with_provider_url(&provider.uri()).await;

    let order = app.create_order().await;
    let payment = initiate_wave_payment(&app, order["orderId"].as_str().unwrap()).await;
    let pay_code = payment["payCode"].as_str().unwrap();

    app.client
        .post(format!("{}/payments/webhook/wave", app.address))
        .json(&serde_json::json!({
            "status": "complete",
            "id": "txn_001",
            "metadata": { "order_id": pay_code }
        }))
        .send()
        .await
        .unwrap();

    let second_order = app.create_order().await;
    initiate_wave_payment(&app, second_order["orderId"].as_str().unwrap()).await;

    let response = app
        .client
        .get(format!("{}/payments/stats", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let stats: serde_json::Value = response.json().await.unwrap();
    assert_eq!(stats["totalPayments"], 2);
    assert_eq!(stats["completedPayments"], 1);
    assert_eq!(stats["waitingPayments"], 1);
    assert_eq!(stats["failedPayments"], 0);
    assert_eq!(stats["byMethod"]["Wave"], 2);
    assert_eq!(stats["byMethod"]["MTN MoMo"], 0);
}

#[tokio::test]
async fn unknown_payment_status_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/payments/PAY9999/status", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["error"], "Paiement non trouvé");
}
