//! Twitter/X API integration module.
//!
//! This module contains the status posting pipeline: splitting text into
//! thread segments, rate limiting outbound posts, and dispatching them in
//! order through an OAuth 1.0a signed transport.

mod api;
mod dispatcher;
mod rate_limit;
mod splitter;
mod tweets;

// Re-export public API
pub use api::{HttpTransport, PostTransport};
pub use dispatcher::{ChainPolicy, PostOutcome, StatusDispatcher, ThreadReport};
pub use rate_limit::{RateLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_PERIOD};
pub use splitter::{
    split_status, SplitError, ValidityRule, WeightRange, WeightedLengthRule, MAX_WEIGHTED_LENGTH,
    TRANSFORMED_URL_LENGTH,
};
pub use tweets::TweetParams;

// Crate-internal re-exports (used by tests and other modules)
#[allow(unused_imports)]
pub(crate) use api::{extract_status_id, sanitize_for_logging, send_signed_form};
