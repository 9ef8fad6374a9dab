//! Boundary traits implemented outside the engine.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DeliveryRequest;

/// Outbound delivery boundary.
///
/// The engine calls this once per executed rule action. An `Err` means
/// the dispatch failed; the engine records it against the rule's stats
/// and moves on — retries, if any, belong to the implementation.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, request: &DeliveryRequest) -> Result<()>;
}
