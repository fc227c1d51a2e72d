//! Webhook Registration Script
//!
//! Registers `{ORIGIN}/webhook/twitter` with the account activity API and
//! stores the returned webhook id. The service must already be reachable at
//! `ORIGIN`, since the platform sends a CRC check during registration.

use statusline::{get_origin, get_webhook_id_path, register_webhook, store_webhook_id, TwitterConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    println!("🔗 Webhook Registration Tool");
    println!("============================");

    let Some(origin) = get_origin() else {
        println!("❌ ORIGIN environment variable is not set!");
        return Err("ORIGIN is required".into());
    };

    let config = TwitterConfig::from_env()?;
    println!("🌍 Environment: {}", config.webhook_env);
    println!("📍 Endpoint: {}", config.webhook_registration_endpoint());

    match register_webhook(&config, &origin).await {
        Ok(webhook) => {
            println!("✅ Webhook registered!");
            println!("🆔 Id: {}", webhook.id);
            println!("🔗 URL: {}", webhook.url);

            let path = get_webhook_id_path();
            store_webhook_id(&path, &webhook)?;
            println!("💾 Stored in {}", path);
            Ok(())
        }
        Err(e) => {
            println!("\n💥 Failed to register webhook: {}", e);
            Err(e)
        }
    }
}
