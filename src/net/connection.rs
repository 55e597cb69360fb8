//! Connection state machine and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track the per-connection state (Accepted → Classified → Tunneling | Relaying → Closed)
//! - Count live connections so shutdown can wait for them
//!
//! The count is passive: nothing in the relay path reads it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub(crate) fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where a client connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, initial request not yet understood.
    Accepted,
    /// Destination known.
    Classified,
    /// CONNECT tunnel running.
    Tunneling,
    /// Single request/response exchange running.
    Relaying,
    /// Both ends closed. Terminal.
    Closed,
}

impl ConnectionState {
    fn can_become(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Accepted, Classified)
                | (Classified, Tunneling)
                | (Classified, Relaying)
                | (Accepted | Classified | Tunneling | Relaying, Closed)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Accepted => "accepted",
            ConnectionState::Classified => "classified",
            ConnectionState::Tunneling => "tunneling",
            ConnectionState::Relaying => "relaying",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Counts live connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly accepted connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
            state: ConnectionState::Accepted,
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every tracked connection has closed.
    pub async fn wait_for_idle(&self) {
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Owned by a connection task for its whole lifetime.
/// Decrements the active count and records `Closed` when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
    state: ConnectionState,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to `next`. Illegal transitions are ignored and logged.
    pub fn transition(&mut self, next: ConnectionState) {
        if !self.state.can_become(next) {
            tracing::warn!(
                connection_id = %self.id,
                from = %self.state,
                to = %next,
                "Ignoring illegal state transition"
            );
            return;
        }
        tracing::trace!(
            connection_id = %self.id,
            from = %self.state,
            to = %next,
            "State transition"
        );
        self.state = next;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.state != ConnectionState::Closed {
            self.transition(ConnectionState::Closed);
        }
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}
