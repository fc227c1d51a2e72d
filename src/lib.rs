//! # Statusline Library
//!
//! A Rust service library that posts status updates to Twitter/X on behalf of
//! an application. Text too long for a single status is split into a thread
//! of replies, posted strictly in order through a shared outbound rate
//! limiter. The service also answers the platform's webhook
//! challenge-response checks.
//!
//! ## Features
//!
//! - Greedy splitting by the platform's weighted-length rule
//! - Sequential thread dispatch with a configurable failure policy
//! - Fixed-window outbound rate limiting (300 posts per 3 hours by default)
//! - OAuth 1.0a request signing
//! - Webhook CRC responses and registration
//! - Structured logging
//!
//! ## Configuration
//!
//! The following environment variables are required:
//! - `xapi_api_key`, `xapi_api_key_secret`: Consumer credentials
//! - `xapi_access_token`, `xapi_access_token_secret`: Posting account credentials
//! - `PORT`: Server port (defaults to 3000)
//!
//! ## API Endpoints
//!
//! - `GET /health`: Returns service health status
//! - `GET /webhook/twitter`: Answers CRC checks
//! - `POST /webhook/twitter`: Acknowledges account activity deliveries
//! - `POST /status`: Queues a new status
//! - `POST /status/reply`: Queues a reply

pub mod config;
pub mod events;
pub mod handlers;
pub mod oauth;
pub mod twitter;
pub mod webhook;

// Re-export commonly used types and functions
pub use config::{get_origin, get_server_port, get_webhook_id_path, DispatchConfig, TwitterConfig};
pub use events::{spawn_status_listener, StatusBus, StatusCreateEvent, StatusEvent, StatusReplyEvent};
pub use handlers::{app_router, AppState};
pub use oauth::{build_oauth1_header, OAuthCredentials};
pub use twitter::{
    split_status, ChainPolicy, HttpTransport, PostOutcome, PostTransport, RateLimiter,
    StatusDispatcher, ThreadReport, WeightedLengthRule,
};
pub use webhook::{create_challenge_response, register_webhook, store_webhook_id, WebhookId};
