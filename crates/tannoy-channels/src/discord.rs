//! Discord sender — webhook POST with one embed per notification.

use tannoy_core::config::DiscordChannelConfig;
use tannoy_core::error::{Result, TannoyError};
use tannoy_core::types::{DeliveryRequest, Priority};

pub struct DiscordSender {
    config: DiscordChannelConfig,
    client: reqwest::Client,
}

impl DiscordSender {
    pub fn new(config: DiscordChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub async fn send(&self, request: &DeliveryRequest) -> Result<()> {
        let resp = self
            .client
            .post(&self.config.webhook_url)
            .json(&build_payload(request))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| TannoyError::Channel(format!("Discord send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Discord notification sent: {}", request.title);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(TannoyError::Channel(format!(
                "Discord webhook error {status}: {body}"
            )))
        }
    }
}

fn build_payload(request: &DeliveryRequest) -> serde_json::Value {
    serde_json::json!({
        "embeds": [{
            "title": request.title,
            "description": request.message,
            "color": priority_color(request.priority),
            "footer": {
                "text": format!(
                    "{} • {}",
                    request.data.rule_name,
                    request.data.timestamp.format("%H:%M:%S UTC")
                )
            }
        }]
    })
}

fn priority_color(priority: Priority) -> u32 {
    match priority {
        Priority::Urgent => 0xFF0000, // Red
        Priority::High => 0xFF8800,   // Orange
        Priority::Medium => 0x00AAFF, // Blue
        Priority::Low => 0x888888,    // Gray
    }
}
