//! Account activity webhook support.
//!
//! This module answers the platform's challenge-response checks (CRC) and
//! registers the service's webhook URL with the account activity API.

use base64::Engine;
use hmac::{Hmac, Mac};
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::TwitterConfig;
use crate::twitter::send_signed_form;

type HmacSha256 = Hmac<Sha256>;

/// Path the webhook is served under, relative to the origin.
pub const WEBHOOK_PATH: &str = "/webhook/twitter";

/// A webhook as returned by the registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookId {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub created_timestamp: Option<String>,
}

/// Computes the response token for a CRC request.
///
/// The token is `sha256=` followed by the base64-encoded HMAC-SHA256 of
/// `crc_token`, keyed with the consumer secret.
///
/// # Example
///
/// ```rust
/// use statusline::create_challenge_response;
///
/// let token = create_challenge_response("challenge", "consumer_secret").unwrap();
/// assert!(token.starts_with("sha256="));
/// ```
pub fn create_challenge_response(
    crc_token: &str,
    consumer_secret: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut mac = HmacSha256::new_from_slice(consumer_secret.as_bytes())
        .map_err(|e| format!("Invalid CRC key: {}", e))?;
    mac.update(crc_token.as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(format!(
        "sha256={}",
        base64::engine::general_purpose::STANDARD.encode(digest)
    ))
}

/// Parses the registration endpoint's response body.
pub(crate) fn parse_webhook_id(
    response_text: &str,
) -> Result<WebhookId, Box<dyn std::error::Error + Send + Sync>> {
    Ok(serde_json::from_str(response_text)?)
}

/// Registers `{origin}/webhook/twitter` with the account activity API.
///
/// # Parameters
///
/// - `config`: Credentials and webhook environment
/// - `origin`: Public base URL of this service
///
/// # Returns
///
/// - `Ok(WebhookId)`: The registered webhook
/// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If the request fails or the response cannot be parsed
pub async fn register_webhook(
    config: &TwitterConfig,
    origin: &str,
) -> Result<WebhookId, Box<dyn std::error::Error + Send + Sync>> {
    let endpoint = config.webhook_registration_endpoint();
    let webhook_url = format!("{}{}", origin.trim_end_matches('/'), WEBHOOK_PATH);
    info!("Registering webhook {} at {}", webhook_url, endpoint);

    let client = Client::builder().timeout(config.request_timeout).build()?;
    let params = vec![("url".to_string(), webhook_url)];

    let response_text = send_signed_form(
        &client,
        &config.credentials,
        &endpoint,
        &params,
        "register_webhook",
    )
    .await?;

    let webhook = parse_webhook_id(&response_text)?;
    info!("Webhook registered with id {}", webhook.id);
    Ok(webhook)
}

/// Writes the registered webhook as JSON to `path`.
pub fn store_webhook_id(
    path: &str,
    webhook: &WebhookId,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let json = serde_json::to_string_pretty(webhook)?;
    std::fs::write(path, json).map_err(|e| {
        error!("Failed to write webhook id to {}: {}", path, e);
        format!("Failed to write webhook id to {}: {}", path, e)
    })?;
    info!("Stored webhook id {} in {}", webhook.id, path);
    Ok(())
}
