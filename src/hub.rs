use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::cache::SnapshotCache;
use crate::snapshot::Snapshot;

/// Identifies one connected client channel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub type SnapshotReceiver = mpsc::UnboundedReceiver<Arc<Snapshot>>;

/// Tracks the set of connected client channels and fans snapshots out to
/// all of them. Channels may connect and disconnect while a publish is in
/// flight; delivery is best-effort and isolated per channel.
pub struct BroadcastHub {
    cache: Arc<SnapshotCache>,
    channels: DashMap<ConnectionId, mpsc::UnboundedSender<Arc<Snapshot>>>,
}

impl BroadcastHub {
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        BroadcastHub {
            cache,
            channels: DashMap::new(),
        }
    }

    /// Registers a new client channel and returns its id and receiving end.
    ///
    /// If the cache holds a snapshot it is delivered into the channel before
    /// the channel becomes visible to `publish`, so a late joiner catches up
    /// immediately and can never observe snapshot N after N+1.
    pub fn connect(&self) -> (ConnectionId, SnapshotReceiver) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(snapshot) = self.cache.get() {
            // rx is still held here, the send cannot fail
            let _ = tx.send(Arc::new(snapshot));
        }
        self.channels.insert(id, tx);
        tracing::info!(%id, clients = self.channels.len(), "client connected");
        (id, rx)
    }

    /// Deregisters a channel. Calling it again for the same id is a no-op.
    pub fn disconnect(&self, id: ConnectionId) {
        if self.channels.remove(&id).is_some() {
            tracing::info!(%id, clients = self.channels.len(), "client disconnected");
        }
    }

    /// Delivers a snapshot to every currently-registered channel.
    ///
    /// A channel whose receiver is gone is logged and reaped without
    /// affecting delivery to the rest. Returns the number of channels the
    /// snapshot was delivered to.
    pub fn publish(&self, snapshot: Snapshot) -> usize {
        let snapshot = Arc::new(snapshot);
        let mut delivered = 0;
        let mut dead = Vec::new();

        for entry in self.channels.iter() {
            match entry.value().send(Arc::clone(&snapshot)) {
                Ok(()) => delivered += 1,
                Err(_) => dead.push(*entry.key()),
            }
        }

        // removal is deferred so the map is not mutated mid-iteration
        for id in dead {
            tracing::debug!(%id, "reaping closed channel");
            self.channels.remove(&id);
        }

        delivered
    }

    pub fn client_count(&self) -> usize {
        self.channels.len()
    }
}
