use std::time::Duration;

use anyhow::Context;

use crate::api_client::DEFAULT_TIMEOUT;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub db_connection_string: String,
    pub push_token: Option<String>,
    pub time_zone: String,
    pub request_timeout: Duration,
}

const DEFAULT_DB_CONNECTION_STRING: &str = "sqlite://book_discovery.sqlite?mode=rwc";
const DEFAULT_TIME_ZONE: &str = "UTC";

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_base_url = lookup("API_BASE_URL").unwrap_or_default();
        let api_key = lookup("API_KEY").unwrap_or_default();
        let db_connection_string =
            lookup("DB_CONNECTION_STRING").unwrap_or(DEFAULT_DB_CONNECTION_STRING.into());
        let push_token = lookup("PUSH_TOKEN").filter(|t| !t.is_empty());
        let time_zone = lookup("TIME_ZONE").unwrap_or(DEFAULT_TIME_ZONE.into());
        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .with_context(|| format!("Invalid REQUEST_TIMEOUT_SECS: {}", secs))?,
            ),
            None => DEFAULT_TIMEOUT,
        };
        Ok(Config {
            api_base_url,
            api_key,
            db_connection_string,
            push_token,
            time_zone,
            request_timeout,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.is_empty() {
            return Err("API_BASE_URL is missing".into());
        }
        if self.api_key.is_empty() {
            return Err("API_KEY is missing".into());
        }
        if self.request_timeout.is_zero() {
            return Err("REQUEST_TIMEOUT_SECS must be positive".into());
        }
        Ok(())
    }
}
