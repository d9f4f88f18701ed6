use std::{net::SocketAddr, time::Duration};

use anyhow::{anyhow, Context};
use fintrack_core::constants::DEFAULT_BALANCE_TIMEOUT_MS;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3003";
const DEFAULT_DB_PATH: &str = "./db/goals.db";

/// Log output format of the server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub transaction_service_url: String,
    pub balance_timeout: Duration,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub consumer_concurrency: usize,
    pub consumer_poll_interval: Duration,
    pub consumer_max_attempts: u32,
    pub consumer_lease: Duration,
    pub log_format: LogFormat,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {}='{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Reads the configuration from the environment, honouring a `.env` file.
    ///
    /// `TRANSACTION_SERVICE_URL` is required; everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = env_or("FT_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)
            .parse()
            .context("Invalid FT_LISTEN_ADDR")?;
        let transaction_service_url = std::env::var("TRANSACTION_SERVICE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("TRANSACTION_SERVICE_URL must be set"))?;
        let cors_allow = env_or("FT_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let log_format = match env_or("FT_LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => return Err(anyhow!("Invalid FT_LOG_FORMAT '{}': expected text or json", other)),
        };
        let consumer_concurrency: usize = parse_env("FT_CONSUMER_CONCURRENCY", 8)?;
        if consumer_concurrency == 0 {
            return Err(anyhow!("FT_CONSUMER_CONCURRENCY must be at least 1"));
        }

        Ok(Self {
            listen_addr,
            db_path: env_or("FT_DB_PATH", DEFAULT_DB_PATH),
            transaction_service_url,
            balance_timeout: Duration::from_millis(parse_env("FT_BALANCE_TIMEOUT_MS", DEFAULT_BALANCE_TIMEOUT_MS)?),
            cors_allow,
            request_timeout: Duration::from_millis(parse_env("FT_REQUEST_TIMEOUT_MS", 30_000)?),
            consumer_concurrency,
            consumer_poll_interval: Duration::from_millis(parse_env("FT_CONSUMER_POLL_MS", 1_000)?),
            consumer_max_attempts: parse_env("FT_CONSUMER_MAX_ATTEMPTS", 5)?,
            consumer_lease: Duration::from_millis(parse_env("FT_CONSUMER_LEASE_MS", 30_000)?),
            log_format,
        })
    }

    /// Defaults for everything but the two values a deployment must choose.
    pub fn with_defaults(db_path: impl Into<String>, transaction_service_url: impl Into<String>) -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3003)),
            db_path: db_path.into(),
            transaction_service_url: transaction_service_url.into(),
            balance_timeout: Duration::from_millis(DEFAULT_BALANCE_TIMEOUT_MS),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            consumer_concurrency: 8,
            consumer_poll_interval: Duration::from_millis(1_000),
            consumer_max_attempts: 5,
            consumer_lease: Duration::from_millis(30_000),
            log_format: LogFormat::Text,
        }
    }
}
