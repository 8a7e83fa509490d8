//! Messaging platform (LINE-style) integration: callback signature
//! verification, event parsing, and outbound push/reply delivery.

pub mod client;
pub mod events;
pub mod signature;

pub use client::MessagingClient;
pub use events::CallbackEvent;
