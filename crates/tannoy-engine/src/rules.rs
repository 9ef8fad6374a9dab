//! Rule model — trigger, actions, filters, and throttle config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tannoy_core::types::{ChannelKind, Priority};

use crate::condition::Condition;
use crate::events::{EventKind, NotificationEvent};

/// A configured notification rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRule {
    #[serde(default = "new_rule_id")]
    pub id: String,
    pub name: String,
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub trigger: RuleTrigger,
    pub actions: Vec<RuleAction>,
    #[serde(default)]
    pub filters: RuleFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<ThrottleConfig>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_rule_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn bool_true() -> bool {
    true
}

impl NotificationRule {
    pub fn new(name: &str, trigger: RuleTrigger, actions: Vec<RuleAction>) -> Self {
        Self {
            id: new_rule_id(),
            name: name.to_string(),
            enabled: true,
            trigger,
            actions,
            filters: RuleFilters::default(),
            throttle: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_filters(mut self, filters: RuleFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = Some(throttle);
        self
    }
}

/// What must hold for a rule to be considered for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTrigger {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Condition source, e.g. `"severity >= 4"`. Empty always matches.
    #[serde(default)]
    pub condition: String,
    /// Static payload templates may reference; event fields win on
    /// key collisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Compiled form of `condition`. Rebuilt on add/update/load; the
    /// default (never matches) covers rules that skipped compilation.
    #[serde(skip)]
    pub(crate) compiled: Condition,
}

impl RuleTrigger {
    pub fn new(kind: EventKind, condition: &str) -> Self {
        Self {
            kind,
            condition: condition.to_string(),
            data: None,
            compiled: Condition::parse(condition),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Recompile the condition from its source text.
    pub fn compile(&mut self) {
        self.compiled = Condition::parse(&self.condition);
    }

    /// Does this trigger fire for the event?
    pub fn matches(&self, event: &NotificationEvent) -> bool {
        self.kind == event.kind && self.compiled.matches(&event.data)
    }
}

/// One outbound action of a matched rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAction {
    pub platform: Platform,
    /// Template id resolved at dispatch time.
    pub template: String,
    /// Platform-specific target (chat id, #channel); falls back to the
    /// channel's configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    /// Seconds to wait before sending. 0 = immediate.
    #[serde(default)]
    pub delay_secs: u64,
}

impl RuleAction {
    pub fn new(platform: Platform, template: &str) -> Self {
        Self {
            platform,
            template: template.to_string(),
            channel: None,
            priority: Priority::default(),
            delay_secs: 0,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_delay(mut self, delay_secs: u64) -> Self {
        self.delay_secs = delay_secs;
        self
    }
}

/// Where an action delivers. `All` fans out to every concrete channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Discord,
    Slack,
    All,
}

impl Platform {
    /// Fixed expansion to concrete channels, resolved once at dispatch.
    pub fn channels(&self) -> &'static [ChannelKind] {
        match self {
            Platform::Telegram => &[ChannelKind::Telegram],
            Platform::Discord => &[ChannelKind::Discord],
            Platform::Slack => &[ChannelKind::Slack],
            Platform::All => &ChannelKind::ALL,
        }
    }
}

/// Secondary gate applied after a trigger matches.
///
/// Every category is optional; an absent category passes. Times are
/// local wall-clock, weekdays use 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFilters {
    /// Inclusive window start, "HH:MM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Inclusive window end, "HH:MM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekdays: Option<Vec<u8>>,
    /// Any-of keywords matched case-insensitively against the
    /// serialized event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Recipients must hold one of these roles. Enforced by the
    /// directory service downstream; carried here so rules round-trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<String>>,
}

/// Per-rule rate limit. Both windows are optional and independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_day: Option<u32>,
}

impl ThrottleConfig {
    pub fn per_hour(max: u32) -> Self {
        Self {
            enabled: true,
            max_per_hour: Some(max),
            max_per_day: None,
        }
    }

    pub fn per_day(max: u32) -> Self {
        Self {
            enabled: true,
            max_per_hour: None,
            max_per_day: Some(max),
        }
    }
}
