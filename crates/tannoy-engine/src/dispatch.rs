//! Action dispatch — turning a matched rule's actions into outbound
//! delivery requests.
//!
//! Building a request is pure: template resolution, the static-data
//! overlay, and platform expansion all happen here so the engine and
//! the delayed-task path share one code path. Sending is a single call
//! through the delivery boundary; failures are reported, not retried.

use std::sync::Arc;

use serde_json::Value;
use tannoy_core::error::Result;
use tannoy_core::traits::Delivery;
use tannoy_core::types::{DeliveryMeta, DeliveryRequest};

use crate::events::NotificationEvent;
use crate::rules::{NotificationRule, RuleAction};
use crate::templates::{self, TemplateResolver};

/// Builds and sends delivery requests. Cheap to clone into tasks.
#[derive(Clone)]
pub struct ActionDispatcher {
    delivery: Arc<dyn Delivery>,
    templates: Arc<dyn TemplateResolver>,
}

impl ActionDispatcher {
    pub fn new(delivery: Arc<dyn Delivery>, templates: Arc<dyn TemplateResolver>) -> Self {
        Self {
            delivery,
            templates,
        }
    }

    /// Build the outbound request for one action of a matched rule.
    pub fn build_request(
        &self,
        rule: &NotificationRule,
        action: &RuleAction,
        event: &NotificationEvent,
    ) -> DeliveryRequest {
        let context = render_context(rule, event);
        let rendered = self
            .templates
            .render(&action.template, &context)
            .unwrap_or_else(|| {
                tracing::debug!(
                    "Template '{}' unknown, using fallback rendering",
                    action.template
                );
                templates::fallback(&rule.name, &event.kind.to_string(), &event.data)
            });

        DeliveryRequest {
            kind: "notification".to_string(),
            title: rendered.title,
            message: rendered.message,
            priority: action.priority,
            platforms: action.platform.channels().to_vec(),
            channels: action.channel.clone().into_iter().collect(),
            data: DeliveryMeta {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                event_type: event.kind.to_string(),
                timestamp: event.timestamp,
            },
        }
    }

    /// Send one request through the delivery boundary.
    pub async fn send(&self, request: &DeliveryRequest) -> Result<()> {
        self.delivery.deliver(request).await
    }
}

/// Template context: the event's source, then the trigger's static
/// data, then the event payload — later layers win key by key, so
/// events override rule-level defaults.
fn render_context(rule: &NotificationRule, event: &NotificationEvent) -> Value {
    let mut merged = serde_json::Map::new();
    merged.insert("source".to_string(), Value::String(event.source.clone()));
    if let Some(Value::Object(map)) = &rule.trigger.data {
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }
    if let Some(map) = event.data.as_object() {
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::rules::{Platform, RuleTrigger};
    use crate::templates::BuiltinTemplates;
    use async_trait::async_trait;
    use tannoy_core::types::{ChannelKind, Priority};

    struct NullDelivery;

    #[async_trait]
    impl Delivery for NullDelivery {
        async fn deliver(&self, _request: &DeliveryRequest) -> Result<()> {
            Ok(())
        }
    }

    fn dispatcher() -> ActionDispatcher {
        ActionDispatcher::new(Arc::new(NullDelivery), Arc::new(BuiltinTemplates))
    }

    fn escalation_rule() -> NotificationRule {
        NotificationRule::new(
            "Ticket escalations",
            RuleTrigger::new(EventKind::User, "severity >= 3")
                .with_data(serde_json::json!({"severity": "unknown", "team": "support"})),
            vec![
                RuleAction::new(Platform::All, "ticket_escalated").with_priority(Priority::Urgent),
            ],
        )
    }

    #[test]
    fn test_build_request_expands_platforms_and_renders() {
        let rule = escalation_rule();
        let event = NotificationEvent::user(
            "u-1",
            "escalate",
            serde_json::json!({"ticket_id": "T-7", "severity": 4}),
        );

        let request = dispatcher().build_request(&rule, &rule.actions[0], &event);

        assert_eq!(request.kind, "notification");
        assert_eq!(request.priority, Priority::Urgent);
        assert_eq!(
            request.platforms,
            vec![ChannelKind::Telegram, ChannelKind::Discord, ChannelKind::Slack]
        );
        // Event data overrode the trigger's static "severity".
        assert_eq!(request.message, "Ticket T-7 escalated to severity 4");
        assert_eq!(request.data.rule_id, rule.id);
        assert_eq!(request.data.event_type, "user");
        assert_eq!(request.data.timestamp, event.timestamp);
    }

    #[test]
    fn test_build_request_falls_back_on_unknown_template() {
        let mut rule = escalation_rule();
        rule.actions[0].template = "not_in_catalog".to_string();
        let event =
            NotificationEvent::user("u-1", "escalate", serde_json::json!({"ticket_id": "T-7"}));

        let request = dispatcher().build_request(&rule, &rule.actions[0], &event);

        assert_eq!(request.title, "Ticket escalations");
        assert!(request.message.contains("user event:"));
        assert!(request.message.contains("T-7"));
    }

    #[test]
    fn test_event_source_is_available_to_templates() {
        let rule = NotificationRule::new(
            "Disk alerts",
            RuleTrigger::new(EventKind::System, ""),
            vec![RuleAction::new(Platform::Telegram, "system_alert")],
        );
        let event = NotificationEvent::system(
            "monitor",
            serde_json::json!({"message": "disk full", "severity": 5}),
        );

        let request = dispatcher().build_request(&rule, &rule.actions[0], &event);
        assert_eq!(request.message, "monitor reported: disk full (severity 5)");
    }

    #[test]
    fn test_channel_override_rides_along() {
        let mut rule = escalation_rule();
        rule.actions[0].channel = Some("#escalations".to_string());
        let event = NotificationEvent::user("u-1", "escalate", serde_json::json!({}));

        let request = dispatcher().build_request(&rule, &rule.actions[0], &event);
        assert_eq!(request.channels, vec!["#escalations".to_string()]);
    }
}
