//! # Tannoy Core
//!
//! Shared foundation for the Tannoy workspace: configuration loading,
//! the error taxonomy, the delivery boundary trait, and the wire types
//! that travel between the engine and the channel implementations.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::TannoyConfig;
pub use error::{Result, TannoyError};
pub use traits::Delivery;
pub use types::{ChannelKind, DeliveryMeta, DeliveryRequest, Priority};
