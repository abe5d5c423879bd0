//! Room registry and broadcast engine.
//!
//! Rooms are derived, not declared: a room is exactly the set of
//! connections currently subscribed to its key, and an empty room has
//! no entry at all. Delivery is fire-and-forget to each subscriber's
//! outbound channel; a dead subscriber never fails a publish.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::events::ServerEvent;

/// Identity of one live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnId(String);

impl ConnId {
    /// Fresh id for a newly accepted connection.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Broadcast group key: `user:{id}`, `project:{id}`, `task:{id}` or
/// `chat:{roomId}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKey {
    User(String),
    Project(String),
    Task(String),
    Chat(String),
}

impl RoomKey {
    pub fn user(id: &str) -> Self {
        Self::User(id.to_string())
    }

    pub fn project(id: &str) -> Self {
        Self::Project(id.to_string())
    }

    pub fn task(id: &str) -> Self {
        Self::Task(id.to_string())
    }

    pub fn chat(room_id: &str) -> Self {
        Self::Chat(room_id.to_string())
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{}", id),
            Self::Project(id) => write!(f, "project:{}", id),
            Self::Task(id) => write!(f, "task:{}", id),
            Self::Chat(id) => write!(f, "chat:{}", id),
        }
    }
}

/// Pub/sub seam the fan-out services depend on. The in-process
/// [`RoomRegistry`] is the only implementation today; a multi-instance
/// deployment would back this with an external pub/sub instead.
///
/// None of these operations can fail the caller: subscription changes
/// are bookkeeping, and publish is fire-and-forget.
pub trait Broadcaster: Send + Sync {
    /// Idempotent. Callers are expected to have already authorized the
    /// connection for this room.
    fn subscribe(&self, conn: &ConnId, room: RoomKey);

    /// Idempotent; unknown memberships are ignored.
    fn unsubscribe(&self, conn: &ConnId, room: &RoomKey);

    /// Remove a connection from every room it is in. Invoked on
    /// disconnect; costs O(rooms the connection joined).
    fn unsubscribe_all(&self, conn: &ConnId);

    /// Deliver an event to every subscriber of a room. No-op when the
    /// room has none.
    fn publish(&self, room: &RoomKey, event: ServerEvent);

    /// Like [`Broadcaster::publish`] but skips one connection
    /// (presence signals exclude their sender).
    fn publish_except(&self, room: &RoomKey, except: &ConnId, event: ServerEvent);
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<RoomKey, HashSet<ConnId>>,
    subscriptions: HashMap<ConnId, HashSet<RoomKey>>,
    senders: HashMap<ConnId, UnboundedSender<ServerEvent>>,
}

/// In-memory subscription table plus per-connection outbound channels.
///
/// The lock is held only to mutate the maps or clone senders out;
/// actual sends happen after it is released, so a slow consumer cannot
/// stall the registry.
#[derive(Default)]
pub struct RoomRegistry {
    inner: Mutex<Inner>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection's outbound channel. Must happen before the
    /// connection can receive anything.
    pub fn register(&self, conn: &ConnId, sender: UnboundedSender<ServerEvent>) {
        let mut inner = self.inner.lock().unwrap();
        inner.senders.insert(conn.clone(), sender);
        debug!(conn = %conn, "connection registered");
    }

    /// Number of subscribers currently in a room.
    pub fn room_size(&self, room: &RoomKey) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.rooms.get(room).map_or(0, HashSet::len)
    }

    /// Number of rooms with at least one subscriber.
    pub fn room_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.rooms.len()
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.senders.len()
    }

    fn deliver(&self, room: &RoomKey, except: Option<&ConnId>, event: ServerEvent) {
        let targets: Vec<(ConnId, UnboundedSender<ServerEvent>)> = {
            let inner = self.inner.lock().unwrap();
            let Some(members) = inner.rooms.get(room) else {
                return;
            };
            members
                .iter()
                .filter(|conn| except != Some(*conn))
                .filter_map(|conn| {
                    inner
                        .senders
                        .get(conn)
                        .map(|tx| (conn.clone(), tx.clone()))
                })
                .collect()
        };

        for (conn, tx) in targets {
            if tx.send(event.clone()).is_err() {
                // Receiver task is gone; the disconnect path will clean
                // the membership up.
                debug!(conn = %conn, room = %room, "subscriber channel closed, skipping");
            }
        }
    }
}

impl Broadcaster for RoomRegistry {
    fn subscribe(&self, conn: &ConnId, room: RoomKey) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(conn.clone());
        inner
            .subscriptions
            .entry(conn.clone())
            .or_default()
            .insert(room.clone());
        debug!(conn = %conn, room = %room, "subscribed");
    }

    fn unsubscribe(&self, conn: &ConnId, room: &RoomKey) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(conn);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
        if let Some(rooms) = inner.subscriptions.get_mut(conn) {
            rooms.remove(room);
            if rooms.is_empty() {
                inner.subscriptions.remove(conn);
            }
        }
        debug!(conn = %conn, room = %room, "unsubscribed");
    }

    fn unsubscribe_all(&self, conn: &ConnId) {
        let mut inner = self.inner.lock().unwrap();
        let rooms = inner.subscriptions.remove(conn).unwrap_or_default();
        for room in &rooms {
            if let Some(members) = inner.rooms.get_mut(room) {
                members.remove(conn);
                if members.is_empty() {
                    inner.rooms.remove(room);
                }
            }
        }
        inner.senders.remove(conn);
        debug!(conn = %conn, rooms = rooms.len(), "connection unsubscribed from all rooms");
    }

    fn publish(&self, room: &RoomKey, event: ServerEvent) {
        self.deliver(room, None, event);
    }

    fn publish_except(&self, room: &RoomKey, except: &ConnId, event: ServerEvent) {
        self.deliver(room, Some(except), event);
    }
}
