//! Stride Real-time Core
//!
//! Room-based publish/subscribe fan-out for notifications and project
//! chat. Connections subscribe to topic rooms; the notification and
//! chat services persist their records, then push events to whoever is
//! subscribed right now.

pub mod chat;
pub mod events;
pub mod notify;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use chat::ChatService;
pub use events::{ClientEvent, FilePayload, SendMessagePayload, ServerEvent};
pub use notify::{NotificationService, NotifyTarget};
pub use registry::{Broadcaster, ConnId, RoomKey, RoomRegistry};
