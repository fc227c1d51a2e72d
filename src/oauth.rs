//! OAuth 1.0a request signing for the Twitter/X v1.1 API.
//!
//! This module builds the `Authorization` header for user-context requests
//! signed with HMAC-SHA1, as required by the status update and account
//! activity endpoints.

use std::fmt;

use base64::Engine;
use hmac::{Hmac, Mac};
use log::debug;
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Consumer and access-token credentials of the posting account.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &mask_secret(&self.consumer_key))
            .field("consumer_secret", &"[REDACTED]")
            .field("token", &mask_secret(&self.token))
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Masks a secret for logging, keeping at most the first and last 8 characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let prefix: String = chars.iter().take(8).collect();

    if chars.len() > 16 {
        let suffix: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        format!("{}...", prefix)
    }
}

/// Percent-encodes a value as RFC 3986 requires for OAuth.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Generates a random nonce of 32 hex characters.
fn generate_nonce() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| format!("Failed to generate nonce: {}", e))?;
    Ok(hex::encode(bytes))
}

/// Splits a request URL into its base string form and its query parameters.
fn normalize_url(
    url: &str,
) -> Result<(String, Vec<(String, String)>), Box<dyn std::error::Error + Send + Sync>> {
    let parsed = Url::parse(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| format!("URL has no host: {}", url))?;

    let mut base = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        base.push_str(&format!(":{}", port));
    }
    base.push_str(parsed.path());

    let query = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok((base, query))
}

/// Builds the signature base string: `METHOD&enc(url)&enc(params)`.
///
/// Parameters are encoded, then sorted by key and value.
pub(crate) fn signature_base_string(
    method: &str,
    base_url: &str,
    params: &[(String, String)],
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&parameter_string)
    )
}

fn sign(
    base_string: &str,
    credentials: &OAuthCredentials,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let signing_key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| format!("Invalid signing key: {}", e))?;
    mac.update(base_string.as_bytes());

    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Builds the OAuth 1.0a header with a fixed nonce and timestamp.
pub(crate) fn build_oauth1_header_with(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    params: &[(String, String)],
    nonce: &str,
    timestamp: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let (base_url, query) = normalize_url(url)?;

    let mut oauth_params = vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.token.clone()),
        ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend(params.iter().cloned());
    // Query parameters already passed in `params` must not be counted twice.
    for pair in query {
        if !params.contains(&pair) {
            all_params.push(pair);
        }
    }

    let base_string = signature_base_string(method, &base_url, &all_params);
    debug!("OAuth signature base string built ({} bytes)", base_string.len());

    let signature = sign(&base_string, credentials)?;
    oauth_params.push(("oauth_signature".to_string(), signature));
    oauth_params.sort();

    let header_params = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", header_params))
}

/// Builds the Authorization header for an OAuth 1.0a signed request.
///
/// Must be called once per request with exactly the form (or query)
/// parameters that will be sent, since they are part of the signature.
///
/// # Parameters
///
/// - `credentials`: Consumer and access-token credentials
/// - `method`: HTTP method, e.g. `POST`
/// - `url`: Full request URL
/// - `params`: Request parameters included in the signature
///
/// # Returns
///
/// A header value of the form `OAuth oauth_consumer_key="...", ...`.
///
/// # Example
///
/// ```rust
/// use statusline::{build_oauth1_header, OAuthCredentials};
///
/// let credentials = OAuthCredentials {
///     consumer_key: "key".to_string(),
///     consumer_secret: "secret".to_string(),
///     token: "token".to_string(),
///     token_secret: "token_secret".to_string(),
/// };
/// let params = vec![("status".to_string(), "Hello".to_string())];
/// let header = build_oauth1_header(
///     &credentials,
///     "POST",
///     "https://api.twitter.com/1.1/statuses/update.json",
///     &params,
/// )
/// .unwrap();
/// assert!(header.starts_with("OAuth "));
/// ```
pub fn build_oauth1_header(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let nonce = generate_nonce()?;
    let timestamp = chrono::Utc::now().timestamp().to_string();
    build_oauth1_header_with(credentials, method, url, params, &nonce, &timestamp)
}
