//! Wire types crossing the engine → delivery boundary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A concrete delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Telegram,
    Discord,
    Slack,
}

impl ChannelKind {
    /// Every concrete channel, in fan-out order.
    pub const ALL: [ChannelKind; 3] = [
        ChannelKind::Telegram,
        ChannelKind::Discord,
        ChannelKind::Slack,
    ];
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Discord => "discord",
            ChannelKind::Slack => "slack",
        };
        write!(f, "{name}")
    }
}

/// Notification priority, least to most urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// One outbound notification handed to the delivery boundary.
///
/// Built by the engine per rule action; the `platforms` list is already
/// expanded (an "all" action arrives as three entries), so channel
/// implementations never branch on wildcards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Payload discriminator, always "notification".
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub platforms: Vec<ChannelKind>,
    /// Optional platform-specific targets (chat id, #channel, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    pub data: DeliveryMeta,
}

/// Provenance block attached to every outbound notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryMeta {
    pub rule_id: String,
    pub rule_name: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
}
