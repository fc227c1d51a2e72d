//! Status Posting Script
//!
//! Posts a status (or a thread, when the text is too long for one status)
//! using the credentials from the environment.
//!
//! ```text
//! echo "Hello world" | cargo run --bin post_status
//! cargo run --bin post_status -- 1234567890 < reply.txt
//! ```
//!
//! The optional argument is the id of the status to reply to.

use std::io::{self, Read};
use std::sync::Arc;

use statusline::{
    split_status, DispatchConfig, HttpTransport, PostOutcome, RateLimiter, StatusDispatcher,
    TwitterConfig, WeightedLengthRule,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    println!("🐦 Status Posting Tool");
    println!("======================");

    let reply_to = std::env::args().nth(1).filter(|id| !id.trim().is_empty());

    println!("📝 Reading status text from stdin (end with Ctrl-D)...");
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    let text = text.trim_end_matches('\n');

    if text.trim().is_empty() {
        println!("❌ Status text cannot be empty!");
        return Err("Status text is required".into());
    }

    let rule = WeightedLengthRule::default();
    let segments = split_status(&rule, text)?;
    println!(
        "📏 Weighted length: {} ({} tweet{})",
        rule.weighted_length(text),
        segments.len(),
        if segments.len() == 1 { "" } else { "s" }
    );
    if let Some(id) = &reply_to {
        println!("↪️  Replying to status {}", id);
    }

    let config = TwitterConfig::from_env()?;
    let dispatch = DispatchConfig::from_env();
    let dispatcher = StatusDispatcher::new(
        Arc::new(HttpTransport::new(&config)?),
        Arc::new(RateLimiter::new(
            dispatch.rate_limit_max,
            dispatch.rate_limit_period,
        )),
    )
    .with_policy(dispatch.chain_policy);

    println!("\n🚀 Posting...");
    let report = dispatcher.send_or_thread(text, reply_to.as_deref()).await?;

    for (index, outcome) in report.outcomes.iter().enumerate() {
        match outcome {
            PostOutcome::Posted(id) => println!("✅ [{}] posted as {}", index + 1, id),
            PostOutcome::Failed(error) => println!("❌ [{}] failed: {}", index + 1, error),
            PostOutcome::Skipped => println!("⏭️  [{}] skipped", index + 1),
        }
    }

    if report.is_complete() {
        println!("\n🎉 Success! {} tweet(s) posted.", report.outcomes.len());
        Ok(())
    } else {
        println!(
            "\n💥 {} of {} tweet(s) failed.",
            report.failures(),
            report.outcomes.len()
        );
        Err("Some tweets could not be posted".into())
    }
}
