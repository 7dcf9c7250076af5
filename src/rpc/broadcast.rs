//! Status broadcast registry.
//!
//! Tracks enrolled connections and pushes a `Status` block to each of
//! them whenever the door changes.  Membership grows only through
//! [`enroll`](BroadcastRegistry::enroll) and shrinks only when a push
//! fails: a failed write is terminal for that subscriber, no retry.
//!
//! Pushing is two-phase: write to every subscriber while collecting the
//! ones that failed, then remove those after the scan.
//!
//! Once a connection is enrolled, every write to it goes through the
//! registry, replies included, so a reply and a push never interleave on
//! the wire.

use std::io::{self, Write};
use std::net::TcpStream;

use log::{debug, info, warn};

use crate::app::events::StatusRecord;

use super::engine::Reply;

/// Identity of one client connection, unique per server lifetime.
pub type ConnectionId = u64;

/// A writable connection that can receive status pushes.
pub trait PushTarget: Write + Send {
    /// Switch the connection to non-blocking writes so a stalled peer
    /// fails fast instead of holding up the broadcast.
    fn make_nonblocking(&mut self) -> io::Result<()>;
}

impl PushTarget for TcpStream {
    fn make_nonblocking(&mut self) -> io::Result<()> {
        self.set_nonblocking(true)
    }
}

/// One enrolled connection.
pub struct Subscriber {
    id: ConnectionId,
    conn: Box<dyn PushTarget>,
}

impl Subscriber {
    pub fn new(id: ConnectionId, conn: impl PushTarget + 'static) -> Self {
        Self {
            id,
            conn: Box::new(conn),
        }
    }
}

impl core::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// The set of enrolled connections.
#[derive(Debug, Default)]
pub struct BroadcastRegistry {
    subscribers: Vec<Subscriber>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the push set.  Fails without a connection, or
    /// if it cannot be made non-blocking.  Re-enrolling the same
    /// connection keeps a single entry.
    pub fn enroll(&mut self, subscriber: Option<Subscriber>) -> bool {
        let Some(mut subscriber) = subscriber else {
            warn!("Enroll without a connection");
            return false;
        };
        if let Err(e) = subscriber.conn.make_nonblocking() {
            warn!("Enroll of connection {} failed: {}", subscriber.id, e);
            return false;
        }
        info!("Enrolling connection {}", subscriber.id);
        self.subscribers.retain(|s| s.id != subscriber.id);
        self.subscribers.push(subscriber);
        true
    }

    /// Push `status` to every subscriber and prune the ones that failed.
    /// Returns how many pushes were delivered.
    pub fn notify_enrolled(&mut self, status: &StatusRecord) -> usize {
        if self.subscribers.is_empty() {
            return 0;
        }
        let wire = Reply::Status(*status).to_wire();
        debug!("Updating {} connections with status", self.subscribers.len());

        let mut failed = Vec::new();
        for sub in &mut self.subscribers {
            let result = sub
                .conn
                .write_all(wire.as_bytes())
                .and_then(|()| sub.conn.flush());
            if let Err(e) = result {
                warn!("Push to connection {} failed ({}), removing", sub.id, e);
                failed.push(sub.id);
            }
        }

        self.subscribers.retain(|s| !failed.contains(&s.id));
        self.subscribers.len()
    }

    /// Write `wire` to enrolled connection `id`.  `None` if `id` is not
    /// enrolled; the caller then owns the only writer.
    pub fn write_to(&mut self, id: ConnectionId, wire: &str) -> Option<io::Result<()>> {
        let sub = self.subscribers.iter_mut().find(|s| s.id == id)?;
        Some(
            sub.conn
                .write_all(wire.as_bytes())
                .and_then(|()| sub.conn.flush()),
        )
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.subscribers.iter().any(|s| s.id == id)
    }

    /// Drop every subscriber (shutdown).
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}
