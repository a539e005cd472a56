//! Broadcast fan-out and delivery accounting

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;
use vigil_core::{
    Alert, BroadcastEvent, ConnectionId, TargetArea, VigilError, VigilResult,
};
use vigil_registry::SessionRegistry;

use crate::PushTransport;

/// Router tuning knobs
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Bound on concurrent per-connection deliveries
    pub max_concurrent_deliveries: usize,
    /// Per-delivery timeout; a hang becomes a recorded failure
    pub delivery_timeout: Duration,
    /// Audience radius for report events (new/verified/moderated)
    pub report_radius_km: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_deliveries: 32,
            delivery_timeout: Duration::from_secs(3),
            report_radius_km: 10.0,
        }
    }
}

/// Outcome of one publish
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    /// Sessions matched by the geofence
    pub targeted: usize,
    /// Sends that completed successfully
    pub delivered: usize,
    /// Sends that errored or timed out
    pub failed: usize,
    pub failed_connections: Vec<ConnectionId>,
}

/// Router counters
#[derive(Debug, Clone, Default)]
pub struct RouterStats {
    pub events_published: u64,
    pub deliveries_attempted: u64,
    pub deliveries_failed: u64,
}

/// Fans events out to every live session inside the target area
pub struct BroadcastRouter<T: PushTransport> {
    registry: Arc<SessionRegistry>,
    transport: Arc<T>,
    semaphore: Arc<Semaphore>,
    config: RouterConfig,
    stats: Mutex<RouterStats>,
}

impl<T: PushTransport> BroadcastRouter<T> {
    pub fn new(registry: Arc<SessionRegistry>, transport: Arc<T>, config: RouterConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_deliveries));
        BroadcastRouter {
            registry,
            transport,
            semaphore,
            config,
            stats: Mutex::new(RouterStats::default()),
        }
    }

    #[inline]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Deliver an event to every session inside its resolved area.
    ///
    /// Per-connection deliveries run concurrently under the semaphore
    /// bound; an individual failure (connection closed, timeout, session
    /// deregistered mid-publish) is recorded and never aborts the rest.
    /// Deliveries all settle before this returns, so sequential
    /// publishes give FIFO ordering per session.
    pub async fn publish(&self, event: &BroadcastEvent) -> VigilResult<DeliveryReport> {
        let area = event.resolve_area(self.config.report_radius_km);
        let sessions = match &area {
            TargetArea::Circle { center, radius_km } => {
                self.registry.find_in_circle(*center, *radius_km)
            }
            TargetArea::Polygon { ring } => self.registry.find_in_polygon(ring),
        };

        let payload = encode_event(event)?;
        let mut report = DeliveryReport {
            targeted: sessions.len(),
            ..Default::default()
        };

        let mut deliveries = JoinSet::new();
        for session in &sessions {
            let connection = session.connection;
            let transport = self.transport.clone();
            let semaphore = self.semaphore.clone();
            let payload = payload.clone();
            let timeout = self.config.delivery_timeout;

            deliveries.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = match tokio::time::timeout(
                    timeout,
                    transport.send(connection, payload),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(VigilError::DeliveryTimeout(connection)),
                };
                (connection, result)
            });
        }

        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.delivered += 1,
                Ok((connection, Err(error))) => {
                    warn!(%connection, %error, kind = event.kind(), "delivery failed");
                    report.failed += 1;
                    report.failed_connections.push(connection);
                }
                // Task panic or cancellation: count it, keep the batch going
                Err(_) => report.failed += 1,
            }
        }

        let mut stats = self.stats.lock();
        stats.events_published += 1;
        stats.deliveries_attempted += report.targeted as u64;
        stats.deliveries_failed += report.failed as u64;

        Ok(report)
    }

    pub fn stats(&self) -> RouterStats {
        self.stats.lock().clone()
    }
}

/// Encode an event payload once per publish; every audience member gets
/// the same bytes
pub fn encode_event(event: &BroadcastEvent) -> VigilResult<Bytes> {
    serde_json::to_vec(event)
        .map(Bytes::from)
        .map_err(|e| VigilError::Storage(format!("event encoding: {e}")))
}

/// Fold a delivery report into an alert's counters. Counters are
/// monotonic; repeated publishes (updates, cancellation notices)
/// accumulate.
pub fn apply_to_alert(report: &DeliveryReport, alert: &mut Alert) {
    alert.delivery.total_targeted += report.targeted as u64;
    alert.delivery.sent += report.targeted as u64;
    alert.delivery.failed += report.failed as u64;
}

/// Per-connection ack from the transport: the payload reached the device
pub fn record_ack(alert: &mut Alert) {
    alert.delivery.delivered += 1;
}

/// Per-connection read receipt
pub fn record_read(alert: &mut Alert) {
    alert.delivery.read += 1;
}
