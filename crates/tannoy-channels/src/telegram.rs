//! Telegram sender — one Bot API `sendMessage` call per notification.

use tannoy_core::config::TelegramChannelConfig;
use tannoy_core::error::{Result, TannoyError};
use tannoy_core::types::{DeliveryRequest, Priority};

pub struct TelegramSender {
    config: TelegramChannelConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    pub fn new(config: TelegramChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub async fn send(&self, request: &DeliveryRequest) -> Result<()> {
        // Rule actions may name a target chat; otherwise the configured
        // notification chat receives it.
        let chat_id = request
            .channels
            .first()
            .cloned()
            .unwrap_or_else(|| self.config.chat_id.clone());

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        );
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": format_message(request),
                "parse_mode": "Markdown"
            }))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| TannoyError::Channel(format!("Telegram send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Telegram notification sent: {}", request.title);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(TannoyError::Channel(format!(
                "Telegram API error {status}: {body}"
            )))
        }
    }
}

fn format_message(request: &DeliveryRequest) -> String {
    format!(
        "{} *{}*\n\n{}\n\n_{} • {}_",
        priority_emoji(request.priority),
        escape_markdown(&request.title),
        escape_markdown(&request.message),
        escape_markdown(&request.data.rule_name),
        request.data.timestamp.format("%H:%M:%S UTC")
    )
}

fn priority_emoji(priority: Priority) -> &'static str {
    match priority {
        Priority::Urgent => "🚨",
        Priority::High => "⚠️",
        Priority::Medium => "📢",
        Priority::Low => "ℹ️",
    }
}

/// Escape Telegram MarkdownV1 special characters.
fn escape_markdown(s: &str) -> String {
    s.replace('_', "\\_")
        .replace('*', "\\*")
        .replace('[', "\\[")
        .replace('`', "\\`")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tannoy_core::types::{ChannelKind, DeliveryMeta};

    fn request(priority: Priority) -> DeliveryRequest {
        DeliveryRequest {
            kind: "notification".into(),
            title: "Invoice overdue".into(),
            message: "Invoice INV_7 for Acme is 3 day(s) overdue".into(),
            priority,
            platforms: vec![ChannelKind::Telegram],
            channels: vec![],
            data: DeliveryMeta {
                rule_id: "r-1".into(),
                rule_name: "Overdue invoices".into(),
                event_type: "system".into(),
                timestamp: Utc::now(),
            },
        }
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b *c* [d] `e`"), "a\\_b \\*c\\* \\[d] \\`e\\`");
    }

    #[test]
    fn test_priority_emoji() {
        assert_eq!(priority_emoji(Priority::Urgent), "🚨");
        assert_eq!(priority_emoji(Priority::Low), "ℹ️");
    }

    #[test]
    fn test_format_message_escapes_body() {
        let text = format_message(&request(Priority::High));
        assert!(text.starts_with("⚠️ *Invoice overdue*"));
        assert!(text.contains("INV\\_7"));
        assert!(text.contains("Overdue invoices"));
    }
}
