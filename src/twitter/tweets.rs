//! Status update parameters.
//!
//! This module contains the message sent for each posted segment, in the
//! form-parameter shape of the v1.1 `statuses/update` endpoint.

/// Parameters of one status update request.
///
/// Built by the dispatcher for a single segment and dropped once the post
/// attempt has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetParams {
    /// The status text.
    pub status: String,
    /// Id of the status this one replies to.
    pub in_reply_to_status_id: Option<String>,
    /// Whether the platform should fill in the @mentions of the reply chain.
    pub auto_populate_reply_metadata: bool,
}

impl TweetParams {
    /// Creates parameters for a status that replies to nothing.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            in_reply_to_status_id: None,
            auto_populate_reply_metadata: false,
        }
    }

    /// Creates parameters for a reply with reply metadata enabled.
    ///
    /// `in_reply_to` may be `None` when the previous post of a thread failed.
    pub fn reply(status: impl Into<String>, in_reply_to: Option<String>) -> Self {
        Self {
            status: status.into(),
            in_reply_to_status_id: in_reply_to,
            auto_populate_reply_metadata: true,
        }
    }

    /// Returns the form parameters exactly as they are sent and signed.
    ///
    /// Unset fields are left out rather than sent empty.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("status".to_string(), self.status.clone())];

        if let Some(id) = &self.in_reply_to_status_id {
            pairs.push(("in_reply_to_status_id".to_string(), id.clone()));
        }
        if self.auto_populate_reply_metadata {
            pairs.push((
                "auto_populate_reply_metadata".to_string(),
                "true".to_string(),
            ));
        }

        pairs
    }
}
