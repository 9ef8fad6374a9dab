//! # Tannoy Channels
//! Delivery channel implementations.
//!
//! Each sender speaks one platform's webhook/bot API; [`ChannelRouter`]
//! fans a request out across every platform it names.

pub mod discord;
pub mod router;
pub mod slack;
pub mod telegram;

pub use discord::DiscordSender;
pub use router::ChannelRouter;
pub use slack::SlackSender;
pub use telegram::TelegramSender;
