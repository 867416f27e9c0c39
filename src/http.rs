//! Shared HTTP client construction
//!
//! All providers go through a `reqwest` client wrapped in retry middleware
//! for transient failures (connect errors, 5xx, 429).

use anyhow::Result;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

use crate::error::AssistantError;

pub const USER_AGENT: &str = concat!("travel-assistant/", env!("CARGO_PKG_VERSION"));

/// Build a client with a request timeout and bounded transient retries
pub fn build_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AssistantError::api(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Strip query parameters so keys never end up in logs
#[must_use]
pub fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
