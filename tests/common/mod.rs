//! Shared harness for the HTTP integration tests.
//!
//! Each test spawns the real application on an ephemeral port, backed by
//! an in-memory store seeded with a known customer, plat and category.
//! Provider endpoints point at a caller-supplied base URL (a wiremock
//! server in the payment tests, a closed port otherwise).

#![allow(dead_code)]

use ordering_service::config::{
    CallbackConfig, Config, DatabaseConfig, MtnConfig, OrangeConfig, ProvidersConfig,
    ServerConfig, WaveConfig,
};
use ordering_service::models::{Category, Customer, Plat};
use ordering_service::store::MemoryStore;
use ordering_service::Application;
use secrecy::Secret;
use std::sync::Arc;

pub const TEST_CUSTOMER: &str = "CLD0001";
pub const TEST_PHONE: &str = "0700000000";
pub const PLAT_PRICE: f64 = 2500.0;

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        // Closed port: any provider call from these tests fails fast.
        Self::spawn_with_provider_url("http://127.0.0.1:9").await
    }

    pub async fn spawn_with_provider_url(provider_url: &str) -> Self {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new("mongodb://localhost:27017".to_string()),
                db_name: "ordering_test".to_string(),
            },
            providers: ProvidersConfig {
                mtn: MtnConfig {
                    api_url: provider_url.to_string(),
                    api_key: Secret::new("test-mtn-key".to_string()),
                    subscription_key: Secret::new("test-subscription-key".to_string()),
                    environment: "sandbox".to_string(),
                },
                orange: OrangeConfig {
                    api_url: provider_url.to_string(),
                    api_key: Secret::new("test-orange-key".to_string()),
                    merchant_id: "test-merchant".to_string(),
                },
                wave: WaveConfig {
                    api_url: provider_url.to_string(),
                    api_key: Secret::new("test-wave-key".to_string()),
                },
            },
            callbacks: CallbackConfig {
                frontend_url: "http://localhost:5173".to_string(),
                backend_url: "http://localhost:3000".to_string(),
            },
            service_name: "ordering-service-test".to_string(),
        };

        let store = Arc::new(MemoryStore::default());
        store.seed_customer(Customer {
            customer_id: TEST_CUSTOMER.to_string(),
            lastname: "Kouassi".to_string(),
            firstname: "Awa".to_string(),
            phone: TEST_PHONE.to_string(),
            email: "awa@example.com".to_string(),
        });
        store.seed_plat(Plat {
            plat_id: 1,
            plat_name: "Attiéké poisson".to_string(),
            description: "Attiéké avec poisson braisé".to_string(),
            price: PLAT_PRICE,
            image_path: "https://example.com/attieke.jpg".to_string(),
            availability: true,
        });
        store.seed_plat(Plat {
            plat_id: 2,
            plat_name: "Garba".to_string(),
            description: "Attiéké thon frit".to_string(),
            price: 1000.0,
            image_path: "https://example.com/garba.jpg".to_string(),
            availability: false,
        });
        store.seed_category(Category {
            category_id: 1,
            category_name: "Plats chauds".to_string(),
        });

        let app = Application::with_store(config, store.clone())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        Self {
            address,
            store,
            client: reqwest::Client::new(),
        }
    }

    pub fn order_body(&self, price: f64) -> serde_json::Value {
        serde_json::json!({
            "plat": 1,
            "customer": TEST_CUSTOMER,
            "category": 1,
            "price": price
        })
    }

    pub async fn create_order(&self) -> serde_json::Value {
        let response = self
            .client
            .post(format!("{}/order", self.address))
            .json(&self.order_body(PLAT_PRICE))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Invalid order response")
    }
}
