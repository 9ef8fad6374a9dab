//! Event model — what producers hand to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tannoy_core::types::Priority;

/// Which part of the platform an event comes from. Rule triggers match
/// on this before any condition is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Platform internals: monitors, health checks, integrations.
    System,
    /// Workflow lifecycle: approvals, completions, escalations.
    Workflow,
    /// Direct user activity: tickets, comments, assignments.
    User,
    /// Fired by cron or scheduled jobs.
    Schedule,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::System => "system",
            EventKind::Workflow => "workflow",
            EventKind::User => "user",
            EventKind::Schedule => "schedule",
        };
        write!(f, "{name}")
    }
}

/// An event submitted for rule matching. Immutable once queued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Producing subsystem: "monitor", "billing", "helpdesk", ...
    pub source: String,
    /// Freeform payload read by conditions, filters, and templates.
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Producer's own urgency hint; rule actions decide the outbound
    /// priority, so this is carried for observability only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl NotificationEvent {
    pub fn new(kind: EventKind, source: &str, data: serde_json::Value) -> Self {
        Self {
            kind,
            source: source.to_string(),
            data,
            timestamp: Utc::now(),
            user_id: None,
            priority: None,
        }
    }

    /// System event from a monitor or integration.
    pub fn system(source: &str, data: serde_json::Value) -> Self {
        Self::new(EventKind::System, source, data)
    }

    /// Workflow lifecycle event.
    pub fn workflow(workflow: &str, status: &str) -> Self {
        Self::new(
            EventKind::Workflow,
            "workflow",
            serde_json::json!({"workflow": workflow, "status": status}),
        )
    }

    /// User activity event.
    pub fn user(user_id: &str, action: &str, data: serde_json::Value) -> Self {
        let mut event = Self::new(EventKind::User, "user", data);
        if let serde_json::Value::Object(map) = &mut event.data {
            map.insert("action".to_string(), serde_json::json!(action));
        }
        event.user_id = Some(user_id.to_string());
        event
    }

    /// Scheduled-job event.
    pub fn schedule(job: &str) -> Self {
        Self::new(
            EventKind::Schedule,
            "scheduler",
            serde_json::json!({"job": job}),
        )
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_constructors() {
        let event = NotificationEvent::system("monitor", serde_json::json!({"severity": 5}));
        assert_eq!(event.kind, EventKind::System);
        assert_eq!(event.source, "monitor");
        assert_eq!(event.data["severity"], 5);

        let event = NotificationEvent::user("u-7", "ticket_created", serde_json::json!({"ticket_id": "T-1"}));
        assert_eq!(event.user_id.as_deref(), Some("u-7"));
        assert_eq!(event.data["action"], "ticket_created");
    }

    #[test]
    fn test_event_wire_shape() {
        let json = r#"{"type": "workflow", "source": "billing", "data": {"status": "failed"}}"#;
        let event: NotificationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::Workflow);
        assert_eq!(event.data["status"], "failed");
        // Missing timestamp defaults to receipt time.
        assert!(event.timestamp <= Utc::now());
    }
}
