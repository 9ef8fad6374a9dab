//! Slack sender — incoming-webhook POST with a colored attachment.

use tannoy_core::config::SlackChannelConfig;
use tannoy_core::error::{Result, TannoyError};
use tannoy_core::types::{DeliveryRequest, Priority};

pub struct SlackSender {
    config: SlackChannelConfig,
    client: reqwest::Client,
}

impl SlackSender {
    pub fn new(config: SlackChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub async fn send(&self, request: &DeliveryRequest) -> Result<()> {
        let resp = self
            .client
            .post(&self.config.webhook_url)
            .json(&build_payload(request, self.config.channel.as_deref()))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| TannoyError::Channel(format!("Slack send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Slack notification sent: {}", request.title);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(TannoyError::Channel(format!(
                "Slack webhook error {status}: {body}"
            )))
        }
    }
}

fn build_payload(request: &DeliveryRequest, default_channel: Option<&str>) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "text": request.title,
        "attachments": [{
            "color": priority_color(request.priority),
            "title": request.title,
            "text": request.message,
            "footer": format!(
                "{} • {}",
                request.data.rule_name,
                request.data.timestamp.format("%H:%M:%S UTC")
            )
        }]
    });

    // Action override first, then the configured default channel.
    let channel = request
        .channels
        .first()
        .map(String::as_str)
        .or(default_channel);
    if let Some(channel) = channel {
        payload["channel"] = serde_json::json!(channel);
    }
    payload
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Urgent => "danger",
        Priority::High => "warning",
        Priority::Medium => "good",
        Priority::Low => "#888888",
    }
}
