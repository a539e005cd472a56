//! Sharded session registry

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::debug;
use vigil_core::{
    AccountId, ConnectionId, Coordinate, Timestamp, VigilError, VigilResult,
};
use vigil_geo::{bounding_box, point_in_polygon, within_radius};

use crate::{DisconnectReason, Session, SessionSnapshot};

/// Number of lock shards. Mutations on different sessions usually land
/// on different shards and proceed in parallel; same-session mutations
/// always serialize on one shard lock.
const SHARD_COUNT: usize = 16;

/// Registry tuning knobs
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Expiry extension granted by each heartbeat
    pub heartbeat_ttl: Duration,
    /// Silence after which a sweep marks a session inactive
    pub inactivity_threshold: Duration,
    /// Age since connect after which a sweep purges the record outright
    pub hard_expiry: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_ttl: Duration::from_secs(24 * 3600),
            inactivity_threshold: Duration::from_secs(30 * 60),
            hard_expiry: Duration::from_secs(24 * 3600),
        }
    }
}

/// Registry counters
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub registered: u64,
    pub deregistered: u64,
    pub location_updates: u64,
    pub heartbeats: u64,
    pub swept_inactive: u64,
    pub purged: u64,
}

/// Result of one expiry sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Sessions newly marked inactive for heartbeat silence
    pub marked_inactive: usize,
    /// Sessions removed entirely for passing hard expiry
    pub purged: usize,
}

impl SweepOutcome {
    /// Total sessions affected
    #[inline]
    pub fn total(&self) -> usize {
        self.marked_inactive + self.purged
    }
}

/// Live-session table shared across all connection handlers
pub struct SessionRegistry {
    shards: Vec<RwLock<HashMap<ConnectionId, Session>>>,
    config: RegistryConfig,
    stats: Mutex<RegistryStats>,
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        SessionRegistry {
            shards,
            config,
            stats: Mutex::new(RegistryStats::default()),
        }
    }

    #[inline]
    fn shard(&self, connection: ConnectionId) -> &RwLock<HashMap<ConnectionId, Session>> {
        &self.shards[(connection.0 as usize) % SHARD_COUNT]
    }

    /// Create a session for a new connection.
    /// Fails with `DuplicateConnection` if the id is already registered.
    pub fn register(
        &self,
        connection: ConnectionId,
        account: Option<AccountId>,
        initial_location: Option<Coordinate>,
        now: Timestamp,
    ) -> VigilResult<SessionSnapshot> {
        let mut shard = self.shard(connection).write();
        if shard.contains_key(&connection) {
            return Err(VigilError::DuplicateConnection(connection));
        }

        let session = Session {
            connection,
            account,
            location: initial_location,
            location_updated_at: initial_location.map(|_| now),
            connected_at: now,
            last_heartbeat: now,
            expires_at: now + self.config.hard_expiry,
            active: true,
            disconnect_reason: None,
            disconnected_at: None,
        };
        let snapshot = session.snapshot();
        shard.insert(connection, session);
        drop(shard);

        self.stats.lock().registered += 1;
        Ok(snapshot)
    }

    /// Overwrite the session's location. The only path that mutates
    /// location; ownership of the connection is enforced by the external
    /// auth layer.
    pub fn update_location(
        &self,
        connection: ConnectionId,
        coordinate: Coordinate,
        now: Timestamp,
    ) -> VigilResult<()> {
        let mut shard = self.shard(connection).write();
        let session = shard
            .get_mut(&connection)
            .filter(|s| s.active)
            .ok_or(VigilError::UnknownSession(connection))?;

        session.location = Some(coordinate);
        session.location_updated_at = Some(now);
        drop(shard);

        self.stats.lock().location_updates += 1;
        Ok(())
    }

    /// Refresh health and extend expiry by the configured TTL
    pub fn heartbeat(&self, connection: ConnectionId, now: Timestamp) -> VigilResult<()> {
        let mut shard = self.shard(connection).write();
        let session = shard
            .get_mut(&connection)
            .filter(|s| s.active)
            .ok_or(VigilError::UnknownSession(connection))?;

        session.last_heartbeat = now;
        session.expires_at = now + self.config.heartbeat_ttl;
        drop(shard);

        self.stats.lock().heartbeats += 1;
        Ok(())
    }

    /// Mark inactive without purging (soft delete, keeps the record for
    /// late reads until the sweep's hard expiry)
    pub fn deregister(
        &self,
        connection: ConnectionId,
        reason: DisconnectReason,
        now: Timestamp,
    ) -> VigilResult<()> {
        let mut shard = self.shard(connection).write();
        let session = shard
            .get_mut(&connection)
            .ok_or(VigilError::UnknownSession(connection))?;

        if session.active {
            session.active = false;
            session.disconnect_reason = Some(reason);
            session.disconnected_at = Some(now);
            drop(shard);
            self.stats.lock().deregistered += 1;
        }
        Ok(())
    }

    /// Periodic expiry sweep. Idempotent: re-running with the same `now`
    /// finds nothing left to do. Heartbeat silence past the inactivity
    /// threshold marks a session inactive; passing hard expiry purges it.
    pub fn sweep_expired(&self, now: Timestamp) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        for shard in &self.shards {
            let mut shard = shard.write();

            shard.retain(|_, session| {
                // expires_at starts at connect + hard_expiry and is
                // extended by heartbeats
                if now >= session.expires_at {
                    outcome.purged += 1;
                    return false;
                }
                if session.active
                    && now.since(session.last_heartbeat) > self.config.inactivity_threshold
                {
                    session.active = false;
                    session.disconnect_reason = Some(DisconnectReason::Timeout);
                    session.disconnected_at = Some(now);
                    outcome.marked_inactive += 1;
                }
                true
            });
        }

        if outcome.total() > 0 {
            debug!(
                marked_inactive = outcome.marked_inactive,
                purged = outcome.purged,
                "session sweep"
            );
            let mut stats = self.stats.lock();
            stats.swept_inactive += outcome.marked_inactive as u64;
            stats.purged += outcome.purged as u64;
        }
        outcome
    }

    /// Active sessions inside a circle. Two-phase filter: cheap bounding
    /// box first, exact haversine second.
    pub fn find_in_circle(&self, center: Coordinate, radius_km: f64) -> Vec<SessionSnapshot> {
        let bbox = bounding_box(center, radius_km);
        self.collect(|session| {
            session.active
                && session.location.is_some_and(|loc| {
                    bbox.contains(loc) && within_radius(loc, center, radius_km)
                })
        })
    }

    /// Active sessions inside a polygon ring
    pub fn find_in_polygon(&self, ring: &[Coordinate]) -> Vec<SessionSnapshot> {
        self.collect(|session| {
            session.active
                && session
                    .location
                    .is_some_and(|loc| point_in_polygon(loc, ring))
        })
    }

    /// Population estimate: unique non-anonymous accounts among active
    /// sessions in range
    pub fn count_distinct_accounts_in_circle(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> usize {
        let accounts: HashSet<AccountId> = self
            .find_in_circle(center, radius_km)
            .into_iter()
            .filter_map(|s| s.account)
            .collect();
        accounts.len()
    }

    /// Snapshot of one session, if present
    pub fn get(&self, connection: ConnectionId) -> Option<SessionSnapshot> {
        self.shard(connection)
            .read()
            .get(&connection)
            .map(Session::snapshot)
    }

    /// Number of active sessions
    pub fn active_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().values().filter(|s| s.active).count())
            .sum()
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.lock().clone()
    }

    fn collect(&self, mut keep: impl FnMut(&Session) -> bool) -> Vec<SessionSnapshot> {
        let mut out = Vec::new();
        for shard in &self.shards {
            let shard = shard.read();
            for session in shard.values() {
                if keep(session) {
                    out.push(session.snapshot());
                }
            }
        }
        out
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::default()
    }

    #[test]
    fn test_register_and_duplicate() {
        let reg = registry();
        let now = Timestamp::from_secs(0);

        reg.register(ConnectionId::new(1), None, None, now).unwrap();
        let err = reg.register(ConnectionId::new(1), None, None, now);
        assert!(matches!(err, Err(VigilError::DuplicateConnection(_))));
    }

    #[test]
    fn test_update_location_unknown_session() {
        let reg = registry();
        let err = reg.update_location(
            ConnectionId::new(99),
            coord(0.0, 0.0),
            Timestamp::from_secs(0),
        );
        assert!(matches!(err, Err(VigilError::UnknownSession(_))));
    }

    #[test]
    fn test_update_location_after_deregister_fails() {
        let reg = registry();
        let now = Timestamp::from_secs(0);
        let conn = ConnectionId::new(1);

        reg.register(conn, None, None, now).unwrap();
        reg.deregister(conn, DisconnectReason::Graceful, now).unwrap();

        let err = reg.update_location(conn, coord(0.0, 0.0), now);
        assert!(matches!(err, Err(VigilError::UnknownSession(_))));
    }

    #[test]
    fn test_heartbeat_extends_expiry() {
        let reg = registry();
        let conn = ConnectionId::new(1);
        let t0 = Timestamp::from_secs(0);

        reg.register(conn, None, None, t0).unwrap();
        let before = reg.get(conn).unwrap().expires_at;

        let t1 = t0 + Duration::from_secs(3600);
        reg.heartbeat(conn, t1).unwrap();
        let after = reg.get(conn).unwrap().expires_at;

        assert_eq!(after - before, Duration::from_secs(3600));
    }

    #[test]
    fn test_find_in_circle_two_inside_three_outside() {
        let reg = registry();
        let now = Timestamp::from_secs(0);
        let center = coord(106.8, -6.2);

        // Two inside a 10 km circle
        reg.register(ConnectionId::new(1), None, Some(coord(106.81, -6.21)), now)
            .unwrap();
        reg.register(ConnectionId::new(2), None, Some(coord(106.85, -6.18)), now)
            .unwrap();
        // Three well outside
        reg.register(ConnectionId::new(3), None, Some(coord(107.6, -6.9)), now)
            .unwrap();
        reg.register(ConnectionId::new(4), None, Some(coord(110.0, -7.0)), now)
            .unwrap();
        reg.register(ConnectionId::new(5), None, Some(coord(100.0, 0.0)), now)
            .unwrap();

        let found = reg.find_in_circle(center, 10.0);
        let mut ids: Vec<u64> = found.iter().map(|s| s.connection.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_find_excludes_sessions_without_location() {
        let reg = registry();
        let now = Timestamp::from_secs(0);

        reg.register(ConnectionId::new(1), None, None, now).unwrap();
        assert!(reg.find_in_circle(coord(0.0, 0.0), 10_000.0).is_empty());
    }

    #[test]
    fn test_find_in_polygon() {
        let reg = registry();
        let now = Timestamp::from_secs(0);
        let ring = vec![
            coord(0.0, 0.0),
            coord(0.0, 10.0),
            coord(10.0, 10.0),
            coord(10.0, 0.0),
        ];

        reg.register(ConnectionId::new(1), None, Some(coord(5.0, 5.0)), now)
            .unwrap();
        reg.register(ConnectionId::new(2), None, Some(coord(20.0, 20.0)), now)
            .unwrap();

        let found = reg.find_in_polygon(&ring);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].connection, ConnectionId::new(1));
    }

    #[test]
    fn test_count_distinct_accounts_excludes_anonymous() {
        let reg = registry();
        let now = Timestamp::from_secs(0);
        let here = coord(0.0, 0.0);

        reg.register(ConnectionId::new(1), Some(AccountId::new(10)), Some(here), now)
            .unwrap();
        // Same account from a second device
        reg.register(ConnectionId::new(2), Some(AccountId::new(10)), Some(here), now)
            .unwrap();
        reg.register(ConnectionId::new(3), Some(AccountId::new(11)), Some(here), now)
            .unwrap();
        // Anonymous
        reg.register(ConnectionId::new(4), None, Some(here), now).unwrap();

        assert_eq!(reg.count_distinct_accounts_in_circle(here, 1.0), 2);
    }

    #[test]
    fn test_sweep_marks_silent_sessions_inactive() {
        let reg = registry();
        let t0 = Timestamp::from_secs(0);
        let here = coord(0.0, 0.0);

        reg.register(ConnectionId::new(1), None, Some(here), t0).unwrap();
        reg.register(ConnectionId::new(2), None, Some(here), t0).unwrap();

        // One keeps heartbeating, one goes silent for 31 minutes
        let t31 = t0 + Duration::from_secs(31 * 60);
        reg.heartbeat(ConnectionId::new(2), t31).unwrap();

        let outcome = reg.sweep_expired(t31);
        assert_eq!(outcome.marked_inactive, 1);
        assert_eq!(outcome.purged, 0);

        let found = reg.find_in_circle(here, 1.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].connection, ConnectionId::new(2));
    }

    #[test]
    fn test_sweep_idempotent() {
        let reg = registry();
        let t0 = Timestamp::from_secs(0);

        reg.register(ConnectionId::new(1), None, None, t0).unwrap();
        let t31 = t0 + Duration::from_secs(31 * 60);

        assert_eq!(reg.sweep_expired(t31).total(), 1);
        assert_eq!(reg.sweep_expired(t31).total(), 0);
    }

    #[test]
    fn test_sweep_purges_past_hard_expiry() {
        let reg = registry();
        let t0 = Timestamp::from_secs(0);
        let conn = ConnectionId::new(1);

        reg.register(conn, None, None, t0).unwrap();

        let t25h = t0 + Duration::from_secs(25 * 3600);
        let outcome = reg.sweep_expired(t25h);

        assert_eq!(outcome.purged, 1);
        assert!(reg.get(conn).is_none());
    }

    #[test]
    fn test_deregister_is_soft() {
        let reg = registry();
        let now = Timestamp::from_secs(0);
        let conn = ConnectionId::new(1);

        reg.register(conn, None, None, now).unwrap();
        reg.deregister(conn, DisconnectReason::Graceful, now).unwrap();

        let snap = reg.get(conn).unwrap();
        assert!(!snap.active);
        assert_eq!(snap.disconnect_reason, Some(DisconnectReason::Graceful));
    }

    #[test]
    fn test_stats_counters() {
        let reg = registry();
        let now = Timestamp::from_secs(0);

        reg.register(ConnectionId::new(1), None, None, now).unwrap();
        reg.heartbeat(ConnectionId::new(1), now).unwrap();
        reg.deregister(ConnectionId::new(1), DisconnectReason::Graceful, now)
            .unwrap();

        let stats = reg.stats();
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.heartbeats, 1);
        assert_eq!(stats.deregistered, 1);
    }
}
