//! Channel router — the production `Delivery` implementation.
//!
//! Holds one sender per configured platform and walks a request's
//! already-expanded platform list. Per-platform failures don't stop the
//! remaining sends; the request as a whole fails if any platform did.

use async_trait::async_trait;

use tannoy_core::config::ChannelConfig;
use tannoy_core::error::{Result, TannoyError};
use tannoy_core::traits::Delivery;
use tannoy_core::types::{ChannelKind, DeliveryRequest};

use crate::discord::DiscordSender;
use crate::slack::SlackSender;
use crate::telegram::TelegramSender;

#[derive(Default)]
pub struct ChannelRouter {
    telegram: Option<TelegramSender>,
    discord: Option<DiscordSender>,
    slack: Option<SlackSender>,
}

impl ChannelRouter {
    /// Build from channel config. Disabled or incomplete sections are
    /// skipped, not errors — a deployment may run with any subset.
    pub fn from_config(config: &ChannelConfig) -> Self {
        let telegram = config
            .telegram
            .as_ref()
            .filter(|c| c.enabled && !c.bot_token.is_empty())
            .map(|c| TelegramSender::new(c.clone()));
        let discord = config
            .discord
            .as_ref()
            .filter(|c| c.enabled && !c.webhook_url.is_empty())
            .map(|c| DiscordSender::new(c.clone()));
        let slack = config
            .slack
            .as_ref()
            .filter(|c| c.enabled && !c.webhook_url.is_empty())
            .map(|c| SlackSender::new(c.clone()));

        let router = Self {
            telegram,
            discord,
            slack,
        };
        tracing::info!("📡 Delivery channels configured: {:?}", router.configured());
        router
    }

    /// Which concrete channels this router can reach.
    pub fn configured(&self) -> Vec<ChannelKind> {
        let mut kinds = Vec::new();
        if self.telegram.is_some() {
            kinds.push(ChannelKind::Telegram);
        }
        if self.discord.is_some() {
            kinds.push(ChannelKind::Discord);
        }
        if self.slack.is_some() {
            kinds.push(ChannelKind::Slack);
        }
        kinds
    }

    async fn send_one(&self, kind: ChannelKind, request: &DeliveryRequest) -> Result<()> {
        match kind {
            ChannelKind::Telegram => match &self.telegram {
                Some(sender) => sender.send(request).await,
                None => Err(TannoyError::Channel("telegram not configured".into())),
            },
            ChannelKind::Discord => match &self.discord {
                Some(sender) => sender.send(request).await,
                None => Err(TannoyError::Channel("discord not configured".into())),
            },
            ChannelKind::Slack => match &self.slack {
                Some(sender) => sender.send(request).await,
                None => Err(TannoyError::Channel("slack not configured".into())),
            },
        }
    }
}

#[async_trait]
impl Delivery for ChannelRouter {
    async fn deliver(&self, request: &DeliveryRequest) -> Result<()> {
        let mut failures = Vec::new();
        for kind in &request.platforms {
            if let Err(e) = self.send_one(*kind, request).await {
                tracing::warn!("Delivery via {kind} failed: {e}");
                failures.push(format!("{kind}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TannoyError::Channel(failures.join("; ")))
        }
    }
}
