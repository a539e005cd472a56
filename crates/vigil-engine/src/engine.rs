//! Engine facade

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use vigil_alert::{apply_patch, cancel, check_expiry, resolve, AlertPatch};
use vigil_consensus::{derive_alert, ConsensusEngine, Decision, VoteOutcome};
use vigil_core::{
    AccountId, Alert, AlertId, AlertSeverity, AlertStatus, BroadcastEvent, ConnectionId,
    Coordinate, Report, ReportCategory, ReportId, TargetArea, Timestamp, VerificationState,
    VigilError, VigilResult, VoteValue,
};
use vigil_registry::{DisconnectReason, SessionRegistry, SessionSnapshot, SweepOutcome};
use vigil_router::{apply_to_alert, BroadcastRouter, PushTransport};
use vigil_storage::{AlertFilter, NearScope, ReportFilter, Store};

use crate::{Clock, EngineConfig};

/// Inbound report submission
#[derive(Clone, Debug)]
pub struct ReportDraft {
    pub category: ReportCategory,
    pub description: String,
    pub location: Coordinate,
    /// Absent for anonymous submissions
    pub reporter: Option<AccountId>,
}

/// Authority alert creation payload
#[derive(Clone, Debug)]
pub struct AlertDraft {
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    /// Initial status; most authority alerts start active directly
    pub status: AlertStatus,
    /// Explicit priority override; otherwise derived from severity
    pub priority: Option<u8>,
    pub area: TargetArea,
    pub effective_from: Option<Timestamp>,
    pub effective_until: Option<Timestamp>,
    pub created_by: Option<AccountId>,
}

/// The geofenced broadcast and crowd-verification engine
pub struct Engine<S: Store, T: PushTransport, C: Clock> {
    store: Arc<S>,
    registry: Arc<SessionRegistry>,
    consensus: ConsensusEngine,
    router: BroadcastRouter<T>,
    clock: C,
    sweep_interval: Duration,
}

impl<S: Store, T: PushTransport, C: Clock> Engine<S, T, C> {
    pub fn new(store: Arc<S>, transport: Arc<T>, clock: C, config: EngineConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.registry));
        let router = BroadcastRouter::new(registry.clone(), transport, config.router);
        Engine {
            store,
            registry,
            consensus: ConsensusEngine::new(config.consensus),
            router,
            clock,
            sweep_interval: config.sweep_interval,
        }
    }

    #[inline]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // --- Connection surface -------------------------------------------------

    pub fn on_connect(
        &self,
        connection: ConnectionId,
        account: Option<AccountId>,
        location: Option<Coordinate>,
    ) -> VigilResult<SessionSnapshot> {
        self.registry
            .register(connection, account, location, self.clock.now())
    }

    pub fn on_location_update(
        &self,
        connection: ConnectionId,
        coordinate: Coordinate,
    ) -> VigilResult<()> {
        self.registry
            .update_location(connection, coordinate, self.clock.now())
    }

    pub fn on_heartbeat(&self, connection: ConnectionId) -> VigilResult<()> {
        self.registry.heartbeat(connection, self.clock.now())
    }

    pub fn on_disconnect(&self, connection: ConnectionId) -> VigilResult<()> {
        self.registry
            .deregister(connection, DisconnectReason::Graceful, self.clock.now())
    }

    // --- Reports and votes --------------------------------------------------

    /// Persist a new crowd report and notify nearby sessions
    pub async fn submit_report(&self, draft: ReportDraft) -> VigilResult<Report> {
        let report = Report::new(
            ReportId::new(rand::random()),
            draft.category,
            draft.description,
            draft.location,
            draft.reporter,
            self.clock.now(),
        );
        self.store.save_report(&report)?;

        self.router
            .publish(&BroadcastEvent::NewReport {
                report: report.id,
                category: report.category,
                location: report.location,
            })
            .await?;

        debug!(report = %report.id, category = report.category.as_str(), "report submitted");
        Ok(report)
    }

    /// Cast a verification vote. On promotion, derives an active alert
    /// around the report, persists both, and broadcasts the verification
    /// and the new alert.
    pub async fn submit_vote(
        &self,
        report_id: ReportId,
        account: AccountId,
        value: VoteValue,
        voter_location: Option<Coordinate>,
    ) -> VigilResult<VoteOutcome> {
        let mut report = self
            .store
            .load_report(report_id)?
            .ok_or(VigilError::ReportNotFound(report_id))?;

        let (outcome, tally) = self.consensus.cast_vote(
            report_id,
            &report.tally,
            account,
            value,
            voter_location,
            report.location,
        )?;
        report.tally = tally;

        match outcome.decision {
            Some(Decision::Promote) => {
                let now = self.clock.now();
                let mut alert = derive_alert(
                    &report,
                    AlertId::new(rand::random()),
                    now,
                    self.consensus.config(),
                );
                report.derived_alert = Some(alert.id);
                self.store.save_report(&report)?;
                self.store.save_alert(&alert)?;

                info!(report = %report.id, alert = %alert.id, "report promoted");

                self.router
                    .publish(&BroadcastEvent::ReportVerified {
                        report: report.id,
                        location: report.location,
                        alert: Some(alert.id),
                    })
                    .await?;

                let delivery = self
                    .router
                    .publish(&BroadcastEvent::AlertCreated {
                        alert: alert.id,
                        severity: alert.severity,
                        priority: alert.priority,
                        area: alert.area.clone(),
                    })
                    .await?;
                apply_to_alert(&delivery, &mut alert);
                self.store.save_alert(&alert)?;
            }
            Some(Decision::Reject) => {
                info!(report = %report.id, "report rejected as false");
                self.store.save_report(&report)?;
            }
            None => {
                self.store.save_report(&report)?;
            }
        }

        Ok(outcome)
    }

    /// Withdraw an account's vote (account deletion). Never reverts a
    /// promotion or rejection.
    pub fn withdraw_vote(
        &self,
        report_id: ReportId,
        account: AccountId,
    ) -> VigilResult<Option<VoteValue>> {
        let mut report = self
            .store
            .load_report(report_id)?
            .ok_or(VigilError::ReportNotFound(report_id))?;

        let Some((removed, tally)) = self.consensus.remove_vote(report_id, &report.tally, account)
        else {
            return Ok(None);
        };
        report.tally = tally;
        self.store.save_report(&report)?;
        Ok(Some(removed))
    }

    /// Moderator override of a report's verification state; the only
    /// path that may leave a terminal state. Broadcast to the area so
    /// clients showing the report can refresh.
    pub async fn moderate_report(
        &self,
        report_id: ReportId,
        moderator: AccountId,
        state: VerificationState,
    ) -> VigilResult<Report> {
        let mut report = self
            .store
            .load_report(report_id)?
            .ok_or(VigilError::ReportNotFound(report_id))?;

        report.tally = self.consensus.override_state(report_id, &report.tally, state);
        report.moderated_by = Some(moderator);
        report.moderated_at = Some(self.clock.now());
        self.store.save_report(&report)?;

        self.router
            .publish(&BroadcastEvent::ReportModerated {
                report: report.id,
                location: report.location,
                state,
            })
            .await?;

        Ok(report)
    }

    // --- Alerts -------------------------------------------------------------

    /// Create an authority alert and, if deliverable, broadcast it
    pub async fn create_official_alert(&self, draft: AlertDraft) -> VigilResult<Alert> {
        let now = self.clock.now();
        let mut alert = Alert::new(
            AlertId::new(rand::random()),
            draft.title,
            draft.message,
            draft.severity,
            draft.status,
            draft.area,
            now,
        );
        alert.created_by = draft.created_by;
        alert.effective_from = draft.effective_from;
        alert.effective_until = draft.effective_until;
        if let Some(priority) = draft.priority {
            alert.priority = priority.clamp(1, 10);
        }
        self.store.save_alert(&alert)?;

        if alert.is_effective(now) {
            let delivery = self
                .router
                .publish(&BroadcastEvent::AlertCreated {
                    alert: alert.id,
                    severity: alert.severity,
                    priority: alert.priority,
                    area: alert.area.clone(),
                })
                .await?;
            apply_to_alert(&delivery, &mut alert);
            self.store.save_alert(&alert)?;
        }

        info!(alert = %alert.id, severity = alert.severity.as_str(), "alert created");
        Ok(alert)
    }

    /// Patch an alert and broadcast the update to its area
    pub async fn update_alert(&self, id: AlertId, patch: AlertPatch) -> VigilResult<Alert> {
        let now = self.clock.now();
        let mut alert = self
            .store
            .load_alert(id)?
            .ok_or(VigilError::AlertNotFound(id))?;

        if check_expiry(&mut alert, now) {
            self.store.save_alert(&alert)?;
        }
        apply_patch(&mut alert, patch)?;
        self.store.save_alert(&alert)?;

        if alert.is_effective(now) {
            let delivery = self
                .router
                .publish(&BroadcastEvent::AlertUpdated {
                    alert: alert.id,
                    severity: alert.severity,
                    priority: alert.priority,
                    area: alert.area.clone(),
                })
                .await?;
            apply_to_alert(&delivery, &mut alert);
            self.store.save_alert(&alert)?;
        }

        Ok(alert)
    }

    /// Cancel an alert and notify its area
    pub async fn cancel_alert(
        &self,
        id: AlertId,
        actor: Option<AccountId>,
        reason: String,
    ) -> VigilResult<Alert> {
        let now = self.clock.now();
        let mut alert = self
            .store
            .load_alert(id)?
            .ok_or(VigilError::AlertNotFound(id))?;

        cancel(&mut alert, actor, reason.clone(), now)?;
        self.store.save_alert(&alert)?;

        let delivery = self
            .router
            .publish(&BroadcastEvent::AlertCancelled {
                alert: alert.id,
                area: alert.area.clone(),
                reason,
            })
            .await?;
        apply_to_alert(&delivery, &mut alert);
        self.store.save_alert(&alert)?;

        info!(alert = %alert.id, "alert cancelled");
        Ok(alert)
    }

    /// Resolve an alert (incident over); no broadcast
    pub fn resolve_alert(&self, id: AlertId, actor: Option<AccountId>) -> VigilResult<Alert> {
        let mut alert = self
            .store
            .load_alert(id)?
            .ok_or(VigilError::AlertNotFound(id))?;

        resolve(&mut alert, actor, self.clock.now())?;
        self.store.save_alert(&alert)?;
        Ok(alert)
    }

    // --- Query surfaces -----------------------------------------------------

    /// Alerts relevant to a point. Lazy expiry is applied to every alert
    /// observed; a lapsed one is persisted as expired before filtering.
    pub fn alerts_near(
        &self,
        center: Coordinate,
        radius_km: f64,
        effective_only: bool,
    ) -> VigilResult<Vec<Alert>> {
        let now = self.clock.now();
        let mut alerts = self.store.query_alerts(&AlertFilter {
            near: Some(NearScope { center, radius_km }),
            ..Default::default()
        })?;

        for alert in &mut alerts {
            if check_expiry(alert, now) {
                self.store.save_alert(alert)?;
            }
        }
        if effective_only {
            alerts.retain(|a| a.is_effective(now));
        }
        Ok(alerts)
    }

    /// Reports near a point, optionally filtered by category and state
    pub fn reports_near(
        &self,
        center: Coordinate,
        radius_km: f64,
        category: Option<ReportCategory>,
        state: Option<VerificationState>,
    ) -> VigilResult<Vec<Report>> {
        self.store.query_reports(&ReportFilter {
            near: Some(NearScope { center, radius_km }),
            category,
            state,
        })
    }

    /// Distinct connected accounts inside an area (anonymous excluded)
    pub fn population_in_area(&self, area: &TargetArea) -> usize {
        match area {
            TargetArea::Circle { center, radius_km } => self
                .registry
                .count_distinct_accounts_in_circle(*center, *radius_km),
            TargetArea::Polygon { ring } => {
                let mut accounts: Vec<AccountId> = self
                    .registry
                    .find_in_polygon(ring)
                    .into_iter()
                    .filter_map(|s| s.account)
                    .collect();
                accounts.sort_unstable_by_key(|a| a.0);
                accounts.dedup();
                accounts.len()
            }
        }
    }

    // --- Maintenance --------------------------------------------------------

    /// Run one expiry sweep against the current clock
    pub fn sweep_now(&self) -> SweepOutcome {
        self.registry.sweep_expired(self.clock.now())
    }
}

/// Background sweep task at the cadence set by `EngineConfig`. Runs
/// until the handle is aborted.
pub fn spawn_sweeper<S, T, C>(engine: Arc<Engine<S, T, C>>) -> tokio::task::JoinHandle<()>
where
    S: Store + 'static,
    T: PushTransport,
    C: Clock,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(engine.sweep_interval);
        // First tick completes immediately; skip it so the cadence
        // starts one interval from now
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let outcome = engine.sweep_now();
            if outcome.total() > 0 {
                debug!(
                    marked_inactive = outcome.marked_inactive,
                    purged = outcome.purged,
                    "background sweep"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use vigil_router::ChannelTransport;
    use vigil_storage::MemoryStore;

    type TestEngine = Engine<MemoryStore, ChannelTransport, ManualClock>;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    fn engine() -> (Arc<TestEngine>, Arc<MemoryStore>, Arc<ChannelTransport>, ManualClock) {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ChannelTransport::default());
        let clock = ManualClock::new(Timestamp::from_secs(1_000_000));
        let engine = Arc::new(Engine::new(
            store.clone(),
            transport.clone(),
            clock.clone(),
            EngineConfig::default(),
        ));
        (engine, store, transport, clock)
    }

    fn draft(area: TargetArea) -> AlertDraft {
        AlertDraft {
            title: "Storm warning".into(),
            message: "High winds expected".into(),
            severity: AlertSeverity::Warning,
            status: AlertStatus::Active,
            priority: None,
            area,
            effective_from: None,
            effective_until: None,
            created_by: Some(AccountId::new(1)),
        }
    }

    #[tokio::test]
    async fn test_connection_passthrough() {
        let (engine, _, _, _) = engine();
        let conn = ConnectionId::new(1);

        engine.on_connect(conn, None, Some(coord(0.0, 0.0))).unwrap();
        engine.on_location_update(conn, coord(1.0, 1.0)).unwrap();
        engine.on_heartbeat(conn).unwrap();
        engine.on_disconnect(conn).unwrap();

        let err = engine.on_heartbeat(conn);
        assert!(matches!(err, Err(VigilError::UnknownSession(_))));
    }

    #[tokio::test]
    async fn test_create_official_alert_persists_and_counts() {
        let (engine, store, transport, _) = engine();
        let center = coord(106.8, -6.2);

        // One session in range
        let conn = ConnectionId::new(1);
        engine.on_connect(conn, None, Some(coord(106.81, -6.21))).unwrap();
        let _rx = transport.open(conn);

        let alert = engine
            .create_official_alert(draft(TargetArea::Circle {
                center,
                radius_km: 10.0,
            }))
            .await
            .unwrap();

        assert_eq!(alert.priority, 6);
        let stored = store.load_alert(alert.id).unwrap().unwrap();
        assert_eq!(stored.delivery.total_targeted, 1);
        assert_eq!(stored.delivery.sent, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_alert_not_found() {
        let (engine, _, _, _) = engine();
        let err = engine
            .update_alert(AlertId::new(99), AlertPatch::default())
            .await;
        assert!(matches!(err, Err(VigilError::AlertNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_alert_broadcasts_and_stamps() {
        let (engine, store, _, _) = engine();
        let alert = engine
            .create_official_alert(draft(TargetArea::Circle {
                center: coord(0.0, 0.0),
                radius_km: 5.0,
            }))
            .await
            .unwrap();

        let cancelled = engine
            .cancel_alert(alert.id, Some(AccountId::new(2)), "false alarm".into())
            .await
            .unwrap();

        assert_eq!(cancelled.status, AlertStatus::Cancelled);
        let stored = store.load_alert(alert.id).unwrap().unwrap();
        assert_eq!(stored.cancel_reason.as_deref(), Some("false alarm"));
    }

    #[tokio::test]
    async fn test_alerts_near_applies_lazy_expiry() {
        let (engine, store, _, clock) = engine();
        let now = clock.now();
        let center = coord(0.0, 0.0);

        let mut d = draft(TargetArea::Circle {
            center,
            radius_km: 5.0,
        });
        d.effective_from = Some(now);
        d.effective_until = Some(now + Duration::from_secs(3600));
        let alert = engine.create_official_alert(d).await.unwrap();

        // Within the window the alert is effective
        let found = engine.alerts_near(center, 1.0, true).unwrap();
        assert_eq!(found.len(), 1);

        // Past the window: excluded from effective queries and the
        // stored status flips to expired on observation
        clock.advance(Duration::from_secs(7200));
        let found = engine.alerts_near(center, 1.0, true).unwrap();
        assert!(found.is_empty());

        let stored = store.load_alert(alert.id).unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Expired);
    }

    #[tokio::test]
    async fn test_population_in_area() {
        let (engine, _, _, _) = engine();
        let here = coord(0.0, 0.0);

        engine
            .on_connect(ConnectionId::new(1), Some(AccountId::new(10)), Some(here))
            .unwrap();
        engine
            .on_connect(ConnectionId::new(2), Some(AccountId::new(10)), Some(here))
            .unwrap();
        engine
            .on_connect(ConnectionId::new(3), None, Some(here))
            .unwrap();

        let circle = TargetArea::Circle {
            center: here,
            radius_km: 1.0,
        };
        assert_eq!(engine.population_in_area(&circle), 1);

        let polygon = TargetArea::Polygon {
            ring: vec![
                coord(-1.0, -1.0),
                coord(-1.0, 1.0),
                coord(1.0, 1.0),
                coord(1.0, -1.0),
            ],
        };
        assert_eq!(engine.population_in_area(&polygon), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_marks_silent_sessions() {
        let (engine, _, _, clock) = engine();
        let conn = ConnectionId::new(1);
        engine.on_connect(conn, None, Some(coord(0.0, 0.0))).unwrap();

        // Silent past the inactivity threshold before the first sweep fires
        clock.advance(Duration::from_secs(31 * 60));
        let handle = spawn_sweeper(engine.clone());

        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::task::yield_now().await;

        assert!(matches!(
            engine.on_heartbeat(conn),
            Err(VigilError::UnknownSession(_))
        ));
        handle.abort();
    }

    #[tokio::test]
    async fn test_vote_on_missing_report_not_found() {
        let (engine, _, _, _) = engine();
        let err = engine
            .submit_vote(ReportId::new(5), AccountId::new(1), VoteValue::Confirm, None)
            .await;
        assert!(matches!(err, Err(VigilError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn test_withdraw_vote_persists_tally() {
        let (engine, store, _, _) = engine();
        let report = engine
            .submit_report(ReportDraft {
                category: ReportCategory::Fire,
                description: "smoke".into(),
                location: coord(0.0, 0.0),
                reporter: None,
            })
            .await
            .unwrap();

        engine
            .submit_vote(report.id, AccountId::new(1), VoteValue::Confirm, None)
            .await
            .unwrap();
        let removed = engine.withdraw_vote(report.id, AccountId::new(1)).unwrap();
        assert_eq!(removed, Some(VoteValue::Confirm));

        let stored = store.load_report(report.id).unwrap().unwrap();
        assert_eq!(stored.tally.confirm_count, 0);

        // Nothing to withdraw the second time
        assert_eq!(engine.withdraw_vote(report.id, AccountId::new(1)).unwrap(), None);
    }
}
