//! Session record and read snapshot

use vigil_core::{AccountId, ConnectionId, Coordinate, Timestamp};

/// Why a session was marked inactive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Client closed the connection
    Graceful,
    /// No heartbeat within the inactivity threshold
    Timeout,
    /// Transport-level failure reported by the push channel
    TransportError,
    /// A new connection registered for the same client
    Replaced,
}

/// Internal session record, exclusively owned by the registry
#[derive(Clone, Debug)]
pub(crate) struct Session {
    pub connection: ConnectionId,
    pub account: Option<AccountId>,
    pub location: Option<Coordinate>,
    pub location_updated_at: Option<Timestamp>,
    pub connected_at: Timestamp,
    pub last_heartbeat: Timestamp,
    /// Hard expiry; extended by heartbeats
    pub expires_at: Timestamp,
    pub active: bool,
    pub disconnect_reason: Option<DisconnectReason>,
    pub disconnected_at: Option<Timestamp>,
}

impl Session {
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connection: self.connection,
            account: self.account,
            location: self.location,
            location_updated_at: self.location_updated_at,
            connected_at: self.connected_at,
            last_heartbeat: self.last_heartbeat,
            expires_at: self.expires_at,
            active: self.active,
            disconnect_reason: self.disconnect_reason,
        }
    }
}

/// Point-in-time copy of a session handed to readers.
/// Location and its timestamp are copied together under the session's
/// lock, so a snapshot never shows a torn pair.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub connection: ConnectionId,
    pub account: Option<AccountId>,
    pub location: Option<Coordinate>,
    pub location_updated_at: Option<Timestamp>,
    pub connected_at: Timestamp,
    pub last_heartbeat: Timestamp,
    pub expires_at: Timestamp,
    pub active: bool,
    pub disconnect_reason: Option<DisconnectReason>,
}

impl SessionSnapshot {
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.account.is_none()
    }
}
