//! Status events and the channel that delivers them to the dispatcher.
//!
//! HTTP handlers (or any other producer) publish [`StatusEvent`]s on a
//! [`StatusBus`]. A single listener task owns the receiving end and hands
//! each event to the dispatcher in its own task, so independent triggers run
//! concurrently while each thread is still posted in order.

use std::sync::Arc;

use log::{error, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::twitter::{PostTransport, SplitError, StatusDispatcher, ThreadReport};

/// A new status should be posted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusCreateEvent {
    pub text: String,
}

/// A reply to an existing status should be posted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReplyEvent {
    pub text: String,
    pub in_reply_to_tweet_id: String,
    /// Who is being replied to. Only used for logging.
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Tweet(StatusCreateEvent),
    Reply(StatusReplyEvent),
}

/// Sending side of the status event channel.
#[derive(Debug, Clone)]
pub struct StatusBus {
    sender: mpsc::UnboundedSender<StatusEvent>,
}

impl StatusBus {
    /// Creates a bus and the receiver to pass to [`spawn_status_listener`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Publishes an event without waiting for it to be handled.
    ///
    /// # Errors
    ///
    /// Fails only when the listener has shut down.
    pub fn publish(&self, event: StatusEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sender
            .send(event)
            .map_err(|_| "Status listener is no longer running".into())
    }
}

/// Subscribes `dispatcher` to the event channel.
///
/// The returned task runs until every [`StatusBus`] clone has been dropped
/// and all in-flight events have been handled. Failures are logged, never
/// propagated: triggers are fire-and-forget.
pub fn spawn_status_listener<T>(
    dispatcher: Arc<StatusDispatcher<T>>,
    mut receiver: mpsc::UnboundedReceiver<StatusEvent>,
) -> JoinHandle<()>
where
    T: PostTransport + 'static,
{
    tokio::spawn(async move {
        info!("Status listener started");
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Some(event) => {
                        let dispatcher = Arc::clone(&dispatcher);
                        in_flight.spawn(async move { dispatcher.handle_event(event).await });
                    }
                    None => break,
                },
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_outcome(result);
                }
            }
        }

        while let Some(result) = in_flight.join_next().await {
            log_outcome(result);
        }
        info!("Status listener stopped");
    })
}

fn log_outcome(result: Result<Result<ThreadReport, SplitError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(report)) if report.is_complete() => {
            info!("Status event handled: {} tweets posted", report.outcomes.len());
        }
        Ok(Ok(report)) => {
            warn!(
                "Status event handled with {} failed of {} tweets",
                report.failures(),
                report.outcomes.len()
            );
        }
        Ok(Err(e)) => error!("Failed to split status text: {}", e),
        Err(e) => error!("Status event task panicked or was cancelled: {}", e),
    }
}
