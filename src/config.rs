//! Configuration module for the statusline service.
//!
//! This module contains configuration structures and environment variable
//! handling for the Twitter/X API integration and the status dispatcher.

use log::{debug, error, info, warn};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::oauth::{mask_secret, OAuthCredentials};
use crate::twitter::{ChainPolicy, DEFAULT_MAX_REQUESTS, DEFAULT_PERIOD};

/// Default endpoint for status updates.
pub const DEFAULT_STATUS_UPDATE_ENDPOINT: &str = "https://api.twitter.com/1.1/statuses/update.json";

/// Default account activity environment name.
pub const DEFAULT_WEBHOOK_ENV: &str = "dev";

/// Default per-request timeout for status posts.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads a required secret, logging only its masked form.
fn required_secret<F>(lookup: &F, name: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => {
            info!("Found {} environment variable with length: {}", name, value.len());
            debug!("{} (masked): {}", name, mask_secret(&value));
            Ok(value)
        }
        Some(_) => {
            error!("{} is empty", name);
            Err(format!("{} cannot be empty", name).into())
        }
        None => {
            error!("Make sure {} environment variable is set", name);
            Err(format!("Missing {} environment variable", name).into())
        }
    }
}

/// Reads an optional value, falling back to `default` when it is unset or
/// cannot be parsed.
fn parsed_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => {
                info!("Using {}={}", name, value);
                value
            }
            Err(_) => {
                warn!("Ignoring invalid {}='{}', using default {}", name, raw, default);
                default
            }
        },
        None => default,
    }
}

/// Configuration struct for Twitter/X API credentials and endpoints.
///
/// This struct holds the OAuth 1.0a user-context credentials used to sign
/// every request, plus the endpoints the service talks to.
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    /// Consumer and access-token credentials
    pub credentials: OAuthCredentials,
    /// Endpoint that status updates are posted to
    pub status_update_endpoint: String,
    /// Account activity environment the webhook is registered in
    pub webhook_env: String,
    /// Timeout for each outbound request
    pub request_timeout: Duration,
}

impl TwitterConfig {
    /// Creates a new `TwitterConfig` instance by loading credentials from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `xapi_api_key`: Consumer (API) key
    /// - `xapi_api_key_secret`: Consumer (API) key secret
    /// - `xapi_access_token`: Access token of the posting account
    /// - `xapi_access_token_secret`: Access token secret of the posting account
    ///
    /// # Optional Environment Variables
    ///
    /// - `STATUS_UPDATE_ENDPOINT`: Status update URL (defaults to the v1.1 endpoint)
    /// - `WEBHOOK_ENV`: Account activity environment name (defaults to `dev`)
    /// - `STATUS_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds (defaults to 30)
    ///
    /// # Returns
    ///
    /// - `Ok(TwitterConfig)`: If all required variables are present
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If a required variable is missing or empty
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use statusline::TwitterConfig;
    ///
    /// let config = TwitterConfig::from_env().unwrap();
    /// println!("Posting to {}", config.status_update_endpoint);
    /// ```
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Loading Twitter configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = OAuthCredentials {
            consumer_key: required_secret(&lookup, "xapi_api_key")?,
            consumer_secret: required_secret(&lookup, "xapi_api_key_secret")?,
            token: required_secret(&lookup, "xapi_access_token")?,
            token_secret: required_secret(&lookup, "xapi_access_token_secret")?,
        };

        let status_update_endpoint = lookup("STATUS_UPDATE_ENDPOINT")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS_UPDATE_ENDPOINT.to_string());

        let webhook_env = lookup("WEBHOOK_ENV")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_ENV.to_string());

        let timeout_secs = parsed_or(
            &lookup,
            "STATUS_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        );

        let config = TwitterConfig {
            credentials,
            status_update_endpoint,
            webhook_env,
            request_timeout: Duration::from_secs(timeout_secs),
        };

        info!("Twitter configuration loaded successfully");
        Ok(config)
    }

    /// Returns the account activity webhook registration URL.
    pub fn webhook_registration_endpoint(&self) -> String {
        format!(
            "https://api.twitter.com/1.1/account_activity/all/{}/webhooks.json",
            self.webhook_env
        )
    }
}

/// Settings of the status dispatcher and its outbound rate limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Posts allowed per rate window
    pub rate_limit_max: usize,
    /// Length of the rate window
    pub rate_limit_period: Duration,
    /// What to do with a thread after one of its posts fails
    pub chain_policy: ChainPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: DEFAULT_MAX_REQUESTS,
            rate_limit_period: DEFAULT_PERIOD,
            chain_policy: ChainPolicy::default(),
        }
    }
}

impl DispatchConfig {
    /// Loads dispatcher settings from environment variables.
    ///
    /// # Optional Environment Variables
    ///
    /// - `STATUS_RATE_LIMIT_MAX`: Posts per window (defaults to 300)
    /// - `STATUS_RATE_LIMIT_PERIOD_SECS`: Window length in seconds (defaults to 10800)
    /// - `STATUS_CHAIN_POLICY`: `continue` or `abort` (defaults to `continue`)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the settings through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            rate_limit_max: parsed_or(&lookup, "STATUS_RATE_LIMIT_MAX", defaults.rate_limit_max),
            rate_limit_period: Duration::from_secs(parsed_or(
                &lookup,
                "STATUS_RATE_LIMIT_PERIOD_SECS",
                defaults.rate_limit_period.as_secs(),
            )),
            chain_policy: parsed_or(&lookup, "STATUS_CHAIN_POLICY", defaults.chain_policy),
        };

        if config.chain_policy == ChainPolicy::Continue {
            debug!("Failed posts will not stop the rest of a thread");
        }
        config
    }
}

/// Gets the server port from environment variables or returns the default.
///
/// This function reads the `PORT` environment variable and parses it as a u16.
/// If the environment variable is not set, it defaults to 3000.
///
/// # Panics
///
/// This function will panic if the `PORT` environment variable is set to a value
/// that cannot be parsed as a valid port number.
///
/// # Example
///
/// ```rust
/// use statusline::get_server_port;
///
/// std::env::remove_var("PORT");
/// assert_eq!(get_server_port(), 3000);
/// ```
pub fn get_server_port() -> u16 {
    env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .expect("PORT must be a valid number")
}

/// Gets the public origin the webhook is served from, e.g. `https://bot.example.com`.
///
/// Returns `None` when `ORIGIN` is unset, in which case webhook registration is skipped.
pub fn get_origin() -> Option<String> {
    env::var("ORIGIN")
        .ok()
        .map(|origin| origin.trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
}

/// Gets the path the registered webhook id is written to (`WEBHOOK_ID_PATH`,
/// defaults to `webhook_id.json`).
pub fn get_webhook_id_path() -> String {
    env::var("WEBHOOK_ID_PATH").unwrap_or_else(|_| "webhook_id.json".to_string())
}
