//! OpenAI client construction for the optional OpenAI embedding provider.

use crate::error::{Result, SvarError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create an OpenAI client with the default timeout.
///
/// The API key is read from `OPENAI_API_KEY`.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    if std::env::var("OPENAI_API_KEY").map(|k| k.is_empty()).unwrap_or(true) {
        return Err(SvarError::EmbeddingUnavailable(
            "OPENAI_API_KEY environment variable not set".to_string(),
        ));
    }

    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}
