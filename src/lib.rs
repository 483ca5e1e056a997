pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use axum::{
    routing::{get, patch, post},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use services::{OrderService, PaymentGateway, PaymentService};
use store::{MongoStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub orders: OrderService,
    pub payments: PaymentService,
}

pub fn build_state(config: Config, store: Arc<dyn Store>) -> AppState {
    let gateway = PaymentGateway::new(&config.providers, &config.callbacks);
    let payments = PaymentService::new(store.clone(), gateway);
    let orders = OrderService::new(store.clone(), payments.clone());

    AppState {
        config,
        store,
        orders,
        payments,
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/order", post(handlers::orders::create_order))
        .route("/order/stats", get(handlers::orders::get_order_stats))
        .route(
            "/order/customer/:customer_id",
            get(handlers::orders::get_customer_orders),
        )
        .route("/order/:id", get(handlers::orders::get_order))
        .route("/order/:id/cancel", patch(handlers::orders::cancel_order))
        .route("/payments", post(handlers::payments::initiate_payment))
        .route("/payments/stats", get(handlers::payments::get_payment_stats))
        .route(
            "/payments/:pay_code/status",
            get(handlers::payments::get_payment_status),
        )
        .route(
            "/payments/:pay_code/retry",
            post(handlers::payments::retry_payment),
        )
        .route(
            "/payments/webhook/:provider",
            post(handlers::payments::payment_webhook),
        )
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: tokio::net::TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret()).await?;
        client_options.app_name = Some("ordering-service".to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database.db_name);
        let store = Arc::new(MongoStore::new(&db));

        Self::with_store(config, store).await
    }

    /// Bind the listener with an arbitrary store. Port 0 is honored, so
    /// tests can bind an ephemeral port and read it back via [`port`].
    ///
    /// [`port`]: Application::port
    pub async fn with_store(config: Config, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        let state = build_state(config, store);
        let router = app_router(state);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
