//! REST API route handlers.
//!
//! Every handler answers `{"ok": bool, ...}` — failures carry an
//! `error` string instead of a non-200 status, so dashboards can treat
//! all responses uniformly.

use axum::{Json, extract::State};
use std::sync::Arc;

use tannoy_engine::{NotificationEvent, NotificationRule};

use super::server::AppState;

// ---- Health ----

/// Service health and an engine snapshot.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();
    Json(serde_json::json!({
        "ok": true,
        "service": "tannoy-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.as_secs(),
        "rules": state.engine.rule_count().await,
        "pending_events": state.engine.pending_events().await,
        "channels": state.channels.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
    }))
}

// ---- Events ----

/// Ingest an event. The engine picks it up on its next tick.
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let event: NotificationEvent = match serde_json::from_value(body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Rejected malformed event: {e}");
            return Json(serde_json::json!({"ok": false, "error": e.to_string()}));
        }
    };
    state.engine.add_event(event).await;
    Json(serde_json::json!({
        "ok": true,
        "pending": state.engine.pending_events().await,
    }))
}

// ---- Rules ----

/// List all notification rules.
pub async fn list_rules(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let rules = state.engine.rules().await;
    Json(serde_json::json!({"ok": true, "rules": rules, "count": rules.len()}))
}

/// Create a rule. Omitted fields (id, enabled, filters, ...) take
/// their defaults.
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let rule: NotificationRule = match serde_json::from_value(body) {
        Ok(rule) => rule,
        Err(e) => return Json(serde_json::json!({"ok": false, "error": e.to_string()})),
    };
    let id = rule.id.clone();
    state.engine.add_rule(rule).await;
    Json(serde_json::json!({"ok": true, "id": id}))
}

/// Replace a rule. The path id wins over any id in the body.
pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let mut rule: NotificationRule = match serde_json::from_value(body) {
        Ok(rule) => rule,
        Err(e) => return Json(serde_json::json!({"ok": false, "error": e.to_string()})),
    };
    rule.id = id;
    if state.engine.update_rule(rule).await {
        Json(serde_json::json!({"ok": true}))
    } else {
        Json(serde_json::json!({"ok": false, "error": "rule not found"}))
    }
}

/// Delete a rule.
pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Json<serde_json::Value> {
    let removed = state.engine.remove_rule(&id).await;
    Json(serde_json::json!({"ok": removed}))
}

/// Enable or disable a rule without replacing it.
pub async fn toggle_rule(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(id): axum::extract::Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let Some(enabled) = body["enabled"].as_bool() else {
        return Json(serde_json::json!({"ok": false, "error": "'enabled' boolean is required"}));
    };
    if state.engine.set_enabled(&id, enabled).await {
        Json(serde_json::json!({"ok": true, "enabled": enabled}))
    } else {
        Json(serde_json::json!({"ok": false, "error": "rule not found"}))
    }
}

// ---- Stats & history ----

/// Per-rule and aggregate dispatch statistics.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "global": state.engine.global_stats().await,
        "rules": state.engine.rule_stats().await,
    }))
}

/// Most recent dispatches, oldest first.
pub async fn recent_notifications(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let history = state.engine.recent_dispatches(50).await;
    Json(serde_json::json!({
        "ok": true,
        "notifications": history,
        "count": history.len(),
    }))
}
