//! Status dispatching and thread building.
//!
//! The dispatcher splits text into segments and posts them one at a time,
//! each through the shared rate limiter. In a thread every segment after the
//! first replies to the id the platform returned for the previous one, so a
//! segment is never posted before the previous response is known.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::events::{StatusCreateEvent, StatusEvent, StatusReplyEvent};

use super::api::{sanitize_for_logging, PostTransport};
use super::rate_limit::RateLimiter;
use super::splitter::{split_status, SplitError, ValidityRule, WeightedLengthRule};
use super::tweets::TweetParams;

const LOG_TEXT_CHARS: usize = 80;

/// Result of a single post attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// The post succeeded and the platform assigned this id.
    Posted(String),
    /// The post failed. There is no id to reply to.
    Failed(String),
    /// The post was never attempted because the chain was aborted.
    Skipped,
}

impl PostOutcome {
    /// Returns the assigned id, if the post succeeded.
    pub fn id(&self) -> Option<&str> {
        match self {
            PostOutcome::Posted(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PostOutcome::Failed(_))
    }
}

/// What to do with the rest of a thread after one of its posts fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainPolicy {
    /// Keep posting; the next segment has no reply target.
    #[default]
    Continue,
    /// Skip every remaining segment.
    Abort,
}

impl FromStr for ChainPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(ChainPolicy::Continue),
            "abort" => Ok(ChainPolicy::Abort),
            other => Err(format!("unknown chain policy '{}'", other)),
        }
    }
}

impl fmt::Display for ChainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainPolicy::Continue => write!(f, "continue"),
            ChainPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Per-segment outcomes of one send operation, in posting order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadReport {
    pub outcomes: Vec<PostOutcome>,
}

impl ThreadReport {
    /// Ids of the posts that succeeded, in order.
    pub fn posted_ids(&self) -> Vec<&str> {
        self.outcomes.iter().filter_map(PostOutcome::id).collect()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// `true` when every segment was posted.
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, PostOutcome::Posted(_)))
    }
}

/// Posts statuses and threads through a [`PostTransport`].
pub struct StatusDispatcher<T> {
    transport: Arc<T>,
    limiter: Arc<RateLimiter>,
    rule: Arc<dyn ValidityRule>,
    policy: ChainPolicy,
}

impl<T: PostTransport> StatusDispatcher<T> {
    /// Creates a dispatcher using the platform length rule and the
    /// `Continue` chain policy.
    pub fn new(transport: Arc<T>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            transport,
            limiter,
            rule: Arc::new(WeightedLengthRule::default()),
            policy: ChainPolicy::default(),
        }
    }

    /// Replaces the validity rule used for splitting.
    pub fn with_rule(mut self, rule: Arc<dyn ValidityRule>) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_policy(mut self, policy: ChainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ChainPolicy {
        self.policy
    }

    /// Handles a "new status" trigger.
    pub async fn on_post(&self, event: StatusCreateEvent) -> Result<ThreadReport, SplitError> {
        info!(
            "Sending tweet: {}",
            sanitize_for_logging(&event.text, LOG_TEXT_CHARS)
        );
        self.send_or_thread(&event.text, None).await
    }

    /// Handles a "new reply" trigger.
    pub async fn on_reply(&self, event: StatusReplyEvent) -> Result<ThreadReport, SplitError> {
        info!(
            "Replying to {}: {}",
            event.user,
            sanitize_for_logging(&event.text, LOG_TEXT_CHARS)
        );
        self.send_or_thread(&event.text, Some(&event.in_reply_to_tweet_id))
            .await
    }

    /// Routes an event to [`on_post`](Self::on_post) or [`on_reply`](Self::on_reply).
    pub async fn handle_event(&self, event: StatusEvent) -> Result<ThreadReport, SplitError> {
        match event {
            StatusEvent::Tweet(event) => self.on_post(event).await,
            StatusEvent::Reply(event) => self.on_reply(event).await,
        }
    }

    /// Posts `text` as a single status, or as a thread when it does not fit.
    ///
    /// With a `parent`, the first segment replies to it and reply metadata is
    /// enabled on every post. Without one, the first segment starts a new
    /// thread. Each later segment replies to the previous segment's id.
    ///
    /// # Returns
    ///
    /// - `Ok(ThreadReport)`: One outcome per segment (empty for empty text)
    /// - `Err(SplitError)`: If the text could not be split; nothing is posted
    pub async fn send_or_thread(
        &self,
        text: &str,
        parent: Option<&str>,
    ) -> Result<ThreadReport, SplitError> {
        let segments = split_status(self.rule.as_ref(), text)?;

        match segments.len() {
            0 => {
                info!("Nothing to send for empty text");
                return Ok(ThreadReport::default());
            }
            1 => info!("This tweet is valid, making a single tweet"),
            n => warn!("This tweet isn't valid, making a thread of {} tweets", n),
        }

        Ok(self.make_thread(parent.map(str::to_string), &segments).await)
    }

    async fn make_thread(&self, parent: Option<String>, segments: &[String]) -> ThreadReport {
        let mut report = ThreadReport::default();
        let is_reply = parent.is_some();
        let mut reply_to = parent;

        for (index, segment) in segments.iter().enumerate() {
            let params = if index == 0 && !is_reply {
                TweetParams::new(segment.as_str())
            } else {
                TweetParams::reply(segment.as_str(), reply_to.take())
            };

            let outcome = self.send_tweet(params).await;
            reply_to = outcome.id().map(str::to_string);
            let failed = outcome.is_failed();
            report.outcomes.push(outcome);

            let remaining = segments.len() - index - 1;
            if failed && remaining > 0 {
                match self.policy {
                    // send_tweet has already logged the error itself
                    ChainPolicy::Continue => {
                        debug!(
                            "Posting tweet {}/{} without a reply target",
                            index + 2,
                            segments.len()
                        );
                    }
                    ChainPolicy::Abort => {
                        warn!(
                            "Skipping the remaining {} of {} segments",
                            remaining,
                            segments.len()
                        );
                        report
                            .outcomes
                            .extend(std::iter::repeat(PostOutcome::Skipped).take(remaining));
                        break;
                    }
                }
            }
        }

        report
    }

    async fn send_tweet(&self, params: TweetParams) -> PostOutcome {
        self.limiter.acquire().await;

        let status = sanitize_for_logging(&params.status, LOG_TEXT_CHARS);
        match self.transport.post_status(&params).await {
            Ok(id) => {
                info!("Tweet sent ({}): {}", id, status);
                PostOutcome::Posted(id)
            }
            Err(e) => {
                error!("Failed to send tweet '{}': {}", status, e);
                PostOutcome::Failed(e.to_string())
            }
        }
    }
}
