use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub providers: ProvidersConfig,
    pub callbacks: CallbackConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

/// Credentials and endpoints for the three mobile money providers.
/// Injected into the payment gateway at construction; provider clients
/// never read the environment themselves.
#[derive(Deserialize, Clone, Debug)]
pub struct ProvidersConfig {
    pub mtn: MtnConfig,
    pub orange: OrangeConfig,
    pub wave: WaveConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct MtnConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub subscription_key: Secret<String>,
    pub environment: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct OrangeConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub merchant_id: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct WaveConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
}

/// Redirect and notification URLs handed to providers that drive a
/// browser checkout (Orange, Wave).
#[derive(Deserialize, Clone, Debug)]
pub struct CallbackConfig {
    pub frontend_url: String,
    pub backend_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("ORDERING_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ORDERING_SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let db_url = env::var("ORDERING_DATABASE_URL")
            .map_err(|_| anyhow!("ORDERING_DATABASE_URL must be set"))?;
        let db_name =
            env::var("ORDERING_DATABASE_NAME").unwrap_or_else(|_| "ordering_db".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            providers: ProvidersConfig {
                mtn: MtnConfig {
                    api_url: env::var("MTN_MOMO_API_URL")
                        .unwrap_or_else(|_| "https://sandbox.momodeveloper.mtn.com".to_string()),
                    api_key: Secret::new(env::var("MTN_MOMO_API_KEY").unwrap_or_default()),
                    subscription_key: Secret::new(
                        env::var("MTN_MOMO_SUBSCRIPTION_KEY").unwrap_or_default(),
                    ),
                    environment: env::var("MTN_ENVIRONMENT")
                        .unwrap_or_else(|_| "sandbox".to_string()),
                },
                orange: OrangeConfig {
                    api_url: env::var("ORANGE_MONEY_API_URL")
                        .unwrap_or_else(|_| "https://api.orange.com".to_string()),
                    api_key: Secret::new(env::var("ORANGE_MONEY_API_KEY").unwrap_or_default()),
                    merchant_id: env::var("ORANGE_MONEY_MERCHANT_ID").unwrap_or_default(),
                },
                wave: WaveConfig {
                    api_url: env::var("WAVE_API_URL")
                        .unwrap_or_else(|_| "https://api.wave.com/v1".to_string()),
                    api_key: Secret::new(env::var("WAVE_API_KEY").unwrap_or_default()),
                },
            },
            callbacks: CallbackConfig {
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string()),
                backend_url: env::var("BACKEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
            service_name: "ordering-service".to_string(),
        })
    }
}
