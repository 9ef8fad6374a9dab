//! Notification engine — the drain loop and everything it gates.
//!
//! One engine instance owns the rule set, the event queue, throttle
//! state, and stats. Producers enqueue events from any task; a single
//! periodic drain takes the whole batch and walks each event through
//! trigger match → filters → throttle → actions. Rules are processed
//! independently: one rule's failure never blocks another's dispatch.
//!
//! Locking discipline: state lives behind tokio sync primitives, and
//! matched rules are cloned out of the read lock before any dispatch
//! await, so no lock is held across IO.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, Utc};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinSet;

use tannoy_core::traits::Delivery;
use tannoy_core::types::DeliveryRequest;

use crate::dispatch::ActionDispatcher;
use crate::events::NotificationEvent;
use crate::filters;
use crate::persistence::{DocumentStore, RULES_KEY, STATS_KEY};
use crate::queue::EventQueue;
use crate::rules::{NotificationRule, RuleAction};
use crate::stats::{DispatchRecord, GlobalStats, RuleStats, StatsTracker};
use crate::templates::TemplateResolver;
use crate::throttle::ThrottleTracker;

/// Recent-dispatch ring size.
const HISTORY_LIMIT: usize = 100;

/// The notification engine. Share it as `Arc<NotificationEngine>`.
pub struct NotificationEngine {
    rules: RwLock<Vec<NotificationRule>>,
    queue: EventQueue,
    throttle: Mutex<ThrottleTracker>,
    stats: Arc<RwLock<StatsTracker>>,
    history: Arc<Mutex<Vec<DispatchRecord>>>,
    dispatcher: ActionDispatcher,
    store: Arc<dyn DocumentStore>,
    /// Serializes drains: a tick that lands mid-drain waits instead of
    /// starting a second pass over the queue.
    drain_gate: Mutex<()>,
    /// Delayed action tasks, tracked so shutdown can settle them.
    delayed: Mutex<JoinSet<()>>,
    shutdown: Arc<Notify>,
    shutting_down: Arc<AtomicBool>,
}

impl NotificationEngine {
    /// Build an engine over the given collaborators, loading persisted
    /// rules and stats. Storage must be reachable; corrupt documents
    /// are logged and replaced with empty state.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        delivery: Arc<dyn Delivery>,
        templates: Arc<dyn TemplateResolver>,
    ) -> tannoy_core::Result<Self> {
        let mut rules: Vec<NotificationRule> = match store.get(RULES_KEY)? {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Stored rules unreadable, starting empty: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };
        for rule in &mut rules {
            rule.trigger.compile();
        }

        let stats: StatsTracker = match store.get(STATS_KEY)? {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Stored stats unreadable, starting empty: {e}");
                StatsTracker::new()
            }),
            None => StatsTracker::new(),
        };

        tracing::info!("🔧 Notification engine ready: {} rule(s) loaded", rules.len());

        Ok(Self {
            rules: RwLock::new(rules),
            queue: EventQueue::new(),
            throttle: Mutex::new(ThrottleTracker::new()),
            stats: Arc::new(RwLock::new(stats)),
            history: Arc::new(Mutex::new(Vec::new())),
            dispatcher: ActionDispatcher::new(delivery, templates),
            store,
            drain_gate: Mutex::new(()),
            delayed: Mutex::new(JoinSet::new()),
            shutdown: Arc::new(Notify::new()),
            shutting_down: Arc::new(AtomicBool::new(false)),
        })
    }

    // ─── Events ───────────────────────────────────────────────

    /// Queue an event for the next drain. Never blocks on dispatch.
    pub async fn add_event(&self, event: NotificationEvent) {
        tracing::debug!("📥 Event queued: {} from {}", event.kind, event.source);
        self.queue.push(event).await;
    }

    pub async fn pending_events(&self) -> usize {
        self.queue.len().await
    }

    /// Drain the queued batch through the rule pipeline. Returns the
    /// number of events processed.
    pub async fn drain(&self) -> usize {
        let _gate = self.drain_gate.lock().await;
        let batch = self.queue.take_batch().await;
        if batch.is_empty() {
            return 0;
        }
        tracing::debug!("📨 Draining {} queued event(s)", batch.len());
        for event in &batch {
            self.process_event(event).await;
        }
        batch.len()
    }

    /// Run one event through every enabled rule.
    async fn process_event(&self, event: &NotificationEvent) {
        let now_utc = Utc::now();
        let now_local = Local::now();

        // Clone matches out of the lock; dispatch happens lock-free.
        let matched: Vec<NotificationRule> = {
            let rules = self.rules.read().await;
            rules
                .iter()
                .filter(|rule| rule.enabled && rule.trigger.matches(event))
                .cloned()
                .collect()
        };

        for rule in matched {
            if !filters::passes(&rule.filters, event, now_local) {
                tracing::debug!("Rule '{}' filtered out ({} event)", rule.name, event.kind);
                continue;
            }
            if !self.throttle.lock().await.check(&rule, now_utc) {
                tracing::debug!("🚦 Rule '{}' throttled, skipping", rule.name);
                continue;
            }

            tracing::info!(
                "⚡ Rule '{}' matched {} event from {}",
                rule.name,
                event.kind,
                event.source
            );
            for action in &rule.actions {
                self.execute_action(&rule, action, event).await;
            }
        }
    }

    /// Dispatch one action: immediately, or as a tracked delayed task.
    async fn execute_action(
        &self,
        rule: &NotificationRule,
        action: &RuleAction,
        event: &NotificationEvent,
    ) {
        let request = self.dispatcher.build_request(rule, action, event);

        if action.delay_secs == 0 {
            send_and_record(
                &self.dispatcher,
                &self.stats,
                &self.history,
                self.store.as_ref(),
                request,
            )
            .await;
            return;
        }

        // Delayed: detach so the drain keeps moving, but keep the task
        // in the set so shutdown can settle it.
        let dispatcher = self.dispatcher.clone();
        let stats = self.stats.clone();
        let history = self.history.clone();
        let store = self.store.clone();
        let shutdown = self.shutdown.clone();
        let shutting_down = self.shutting_down.clone();
        let delay = std::time::Duration::from_secs(action.delay_secs);

        tracing::debug!(
            "⏳ Action for rule '{}' delayed {}s",
            rule.name,
            action.delay_secs
        );

        let mut delayed = self.delayed.lock().await;
        while delayed.try_join_next().is_some() {}
        delayed.spawn(async move {
            if shutting_down.load(Ordering::SeqCst) {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.notified() => {
                    tracing::debug!(
                        "Delayed action for rule '{}' cancelled by shutdown",
                        request.data.rule_name
                    );
                    return;
                }
            }
            send_and_record(&dispatcher, &stats, &history, store.as_ref(), request).await;
        });
    }

    // ─── Rules ────────────────────────────────────────────────

    /// Add a rule, replacing any existing rule with the same id. The
    /// rule is live for the very next drain.
    pub async fn add_rule(&self, mut rule: NotificationRule) {
        rule.trigger.compile();
        tracing::info!("📋 Rule added: '{}' ({})", rule.name, rule.id);
        {
            let mut rules = self.rules.write().await;
            rules.retain(|r| r.id != rule.id);
            rules.push(rule);
        }
        self.persist_rules().await;
    }

    /// Replace an existing rule. Returns false when the id is unknown.
    pub async fn update_rule(&self, mut rule: NotificationRule) -> bool {
        rule.trigger.compile();
        let updated = {
            let mut rules = self.rules.write().await;
            match rules.iter_mut().find(|r| r.id == rule.id) {
                Some(slot) => {
                    *slot = rule;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.persist_rules().await;
        }
        updated
    }

    /// Remove a rule by id. Removing an absent id is a no-op.
    pub async fn remove_rule(&self, id: &str) -> bool {
        let removed = {
            let mut rules = self.rules.write().await;
            let before = rules.len();
            rules.retain(|r| r.id != id);
            rules.len() < before
        };
        if removed {
            tracing::info!("🗑️ Rule removed: {id}");
            self.throttle.lock().await.forget(id);
            self.persist_rules().await;
        }
        removed
    }

    /// Enable or disable a rule. Returns false when the id is unknown.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let changed = {
            let mut rules = self.rules.write().await;
            match rules.iter_mut().find(|r| r.id == id) {
                Some(rule) => {
                    rule.enabled = enabled;
                    true
                }
                None => false,
            }
        };
        if changed {
            tracing::info!("📋 Rule {id} {}", if enabled { "enabled" } else { "disabled" });
            self.persist_rules().await;
        }
        changed
    }

    pub async fn rules(&self) -> Vec<NotificationRule> {
        self.rules.read().await.clone()
    }

    pub async fn rule_count(&self) -> usize {
        self.rules.read().await.len()
    }

    /// Persist the rule set. In-memory state stays authoritative: a
    /// storage failure is logged, never rolled back.
    async fn persist_rules(&self) {
        let snapshot = {
            let rules = self.rules.read().await;
            serde_json::to_value(&*rules)
        };
        match snapshot {
            Ok(value) => {
                if let Err(e) = self.store.set(RULES_KEY, &value) {
                    tracing::warn!("⚠️ Failed to persist rules: {e}");
                }
            }
            Err(e) => tracing::warn!("⚠️ Failed to serialize rules: {e}"),
        }
    }

    // ─── Stats & history ──────────────────────────────────────

    pub async fn rule_stats(&self) -> std::collections::HashMap<String, RuleStats> {
        self.stats.read().await.per_rule().clone()
    }

    pub async fn global_stats(&self) -> GlobalStats {
        self.stats.read().await.global()
    }

    /// Most recent dispatches, newest last, capped at `limit`.
    pub async fn recent_dispatches(&self, limit: usize) -> Vec<DispatchRecord> {
        let history = self.history.lock().await;
        let skip = history.len().saturating_sub(limit);
        history[skip..].to_vec()
    }

    // ─── Lifecycle ────────────────────────────────────────────

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdown_signal(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Stop the engine: wake the drain loop, cancel delayed actions
    /// still waiting, and settle every tracked task before returning.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
        let mut delayed = self.delayed.lock().await;
        while delayed.join_next().await.is_some() {}
        tracing::info!("⏹️ Notification engine stopped");
    }
}

/// Spawn the drain loop: wake every `tick_secs`, drain whatever queued
/// since the last pass. Drains are awaited to completion, so a slow
/// batch delays the next tick rather than overlapping it.
pub fn spawn_engine(
    engine: Arc<NotificationEngine>,
    tick_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tracing::info!("⏰ Notification engine started (drain every {tick_secs}s)");
    tokio::spawn(async move {
        let shutdown = engine.shutdown_signal();
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(tick_secs));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if engine.is_shutting_down() {
                        break;
                    }
                    let processed = engine.drain().await;
                    if processed > 0 {
                        tracing::debug!("✅ Drain complete: {processed} event(s)");
                    }
                }
                _ = shutdown.notified() => break,
            }
        }
    })
}

/// Send one request and account for the outcome: per-rule counters,
/// the history ring, and a persisted stats snapshot.
async fn send_and_record(
    dispatcher: &ActionDispatcher,
    stats: &RwLock<StatsTracker>,
    history: &Mutex<Vec<DispatchRecord>>,
    store: &dyn DocumentStore,
    request: DeliveryRequest,
) {
    let success = match dispatcher.send(&request).await {
        Ok(()) => {
            tracing::info!("📣 Notification sent: '{}'", request.title);
            true
        }
        Err(e) => {
            tracing::warn!(
                "⚠️ Dispatch failed for rule '{}' ({} event): {e}",
                request.data.rule_name,
                request.data.event_type
            );
            false
        }
    };

    let record = DispatchRecord {
        rule_id: request.data.rule_id.clone(),
        rule_name: request.data.rule_name.clone(),
        title: request.title.clone(),
        platforms: request.platforms.clone(),
        success,
        timestamp: Utc::now(),
    };

    let snapshot = {
        let mut tracker = stats.write().await;
        tracker.record_outcome(&record.rule_id, success);
        serde_json::to_value(&*tracker).ok()
    };
    {
        let mut ring = history.lock().await;
        ring.push(record);
        if ring.len() > HISTORY_LIMIT {
            ring.remove(0);
        }
    }
    if let Some(snapshot) = snapshot
        && let Err(e) = store.set(STATS_KEY, &snapshot)
    {
        tracing::warn!("⚠️ Failed to persist stats: {e}");
    }
}
