//! Event queue — the buffer between producers and the drain loop.
//!
//! Producers append from any task; the drain takes the whole batch in
//! one swap, so a drain never observes a queue that is still growing
//! and events arriving mid-drain wait for the next tick.

use tokio::sync::Mutex;

use crate::events::NotificationEvent;

/// Mutex-guarded append-only event buffer.
#[derive(Debug, Default)]
pub struct EventQueue {
    buffer: Mutex<Vec<NotificationEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Append one event.
    pub async fn push(&self, event: NotificationEvent) {
        self.buffer.lock().await.push(event);
    }

    /// Take the entire queued batch, leaving the queue empty.
    pub async fn take_batch(&self) -> Vec<NotificationEvent> {
        std::mem::take(&mut *self.buffer.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.buffer.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buffer.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_and_take_batch() {
        let queue = EventQueue::new();
        queue.push(NotificationEvent::schedule("daily-digest")).await;
        queue.push(NotificationEvent::schedule("weekly-report")).await;
        assert_eq!(queue.len().await, 2);

        let batch = queue.take_batch().await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].data["job"], "daily-digest");
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_take_batch_preserves_arrival_order() {
        let queue = EventQueue::new();
        for i in 0..5 {
            queue
                .push(NotificationEvent::system(
                    "monitor",
                    serde_json::json!({"seq": i}),
                ))
                .await;
        }
        let batch = queue.take_batch().await;
        let seqs: Vec<i64> = batch.iter().map(|e| e.data["seq"].as_i64().unwrap()).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_concurrent_pushes_all_arrive() {
        let queue = std::sync::Arc::new(EventQueue::new());
        let mut handles = Vec::new();
        for i in 0..20 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .push(NotificationEvent::system(
                        "monitor",
                        serde_json::json!({"seq": i}),
                    ))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(queue.take_batch().await.len(), 20);
    }
}
