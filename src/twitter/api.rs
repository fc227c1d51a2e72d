//! Core Twitter API utilities.
//!
//! This module contains the transport used to post statuses and the low-level
//! helper for sending OAuth 1.0a signed form requests to the Twitter API.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;

use crate::config::TwitterConfig;
use crate::oauth::{build_oauth1_header, OAuthCredentials};

use super::tweets::TweetParams;

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_chars`: Maximum number of characters before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_chars: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_chars {
        let truncated: String = sanitized.chars().take(max_chars).collect();
        format!("{}... [truncated, {} total bytes]", truncated, text.len())
    } else {
        sanitized
    }
}

/// Posts a single status and returns the id the platform assigned to it.
///
/// Implementations treat any transport error, non-success status or
/// response without an id as an error.
#[async_trait]
pub trait PostTransport: Send + Sync {
    async fn post_status(
        &self,
        params: &TweetParams,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Extracts the new status id from a `statuses/update` response body.
pub(crate) fn extract_status_id(
    response_text: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let json_response: serde_json::Value = serde_json::from_str(response_text)?;
    json_response
        .get("id_str")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| "Status update response did not include id_str".into())
}

/// Sends an OAuth 1.0a signed, form-encoded POST request.
///
/// The parameters are signed and sent as the request body, so the signature
/// always covers exactly what goes over the wire.
///
/// # Parameters
///
/// - `client`: The HTTP client to send with
/// - `credentials`: OAuth 1.0a credentials used for signing
/// - `url`: The endpoint URL
/// - `params`: Form parameters
/// - `operation_name`: Human-readable name for the operation (for logging)
///
/// # Returns
///
/// - `Ok(String)`: The API response body on success
/// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If signing or the request fails, or the API returns an error status
pub(crate) async fn send_signed_form(
    client: &Client,
    credentials: &OAuthCredentials,
    url: &str,
    params: &[(String, String)],
    operation_name: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    debug!("Making signed request for operation: {}", operation_name);

    let auth_header = build_oauth1_header(credentials, "POST", url, params)?;
    let body = serde_urlencoded::to_string(params)?;

    debug!("Request URL: {}", url);
    debug!("Request headers: Authorization: OAuth [REDACTED], Content-Type: application/x-www-form-urlencoded");

    let response = client
        .post(url)
        .header("Authorization", auth_header)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    debug!(
        "Received response with status: {} for operation: {}",
        status, operation_name
    );

    let response_text = response.text().await?;
    if status.is_success() {
        debug!(
            "Response summary for '{}': {} bytes received",
            operation_name,
            response_text.len()
        );
        return Ok(response_text);
    }

    debug!(
        "Error response for '{}': {}",
        operation_name,
        sanitize_for_logging(&response_text, 200)
    );
    Err(format!(
        "Twitter API error for operation '{}' ({})",
        operation_name, status
    )
    .into())
}

/// HTTP transport posting to the v1.1 `statuses/update` endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    credentials: OAuthCredentials,
}

impl HttpTransport {
    /// Creates a transport from the loaded configuration.
    ///
    /// Requests that take longer than the configured timeout fail, which the
    /// dispatcher treats like any other failed post.
    pub fn new(config: &TwitterConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        info!(
            "Status transport ready for {} (timeout {:?})",
            config.status_update_endpoint, config.request_timeout
        );

        Ok(Self {
            client,
            endpoint: config.status_update_endpoint.clone(),
            credentials: config.credentials.clone(),
        })
    }
}

#[async_trait]
impl PostTransport for HttpTransport {
    async fn post_status(
        &self,
        params: &TweetParams,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let pairs = params.form_pairs();
        let response_text = send_signed_form(
            &self.client,
            &self.credentials,
            &self.endpoint,
            &pairs,
            "post_status",
        )
        .await?;

        extract_status_id(&response_text)
    }
}
