//! Broadcast event union
//!
//! Every kind of fan-out goes through one tagged union, each variant
//! carrying what its audience rule needs: report events resolve to a
//! fixed-radius circle around the incident, alert events carry the
//! alert's own target area.

use serde::{Deserialize, Serialize};

use crate::{
    AlertId, AlertSeverity, Coordinate, ReportCategory, ReportId, TargetArea, VerificationState,
};

/// One broadcastable occurrence in the system
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BroadcastEvent {
    /// A fresh crowd report was submitted
    NewReport {
        report: ReportId,
        category: ReportCategory,
        location: Coordinate,
    },
    /// A report reached confirm quorum and was promoted
    ReportVerified {
        report: ReportId,
        location: Coordinate,
        alert: Option<AlertId>,
    },
    /// A moderator overrode a report's verification state
    ReportModerated {
        report: ReportId,
        location: Coordinate,
        state: VerificationState,
    },
    /// An authority published a new alert (or consensus derived one)
    AlertCreated {
        alert: AlertId,
        severity: AlertSeverity,
        priority: u8,
        area: TargetArea,
    },
    /// An active alert's content changed
    AlertUpdated {
        alert: AlertId,
        severity: AlertSeverity,
        priority: u8,
        area: TargetArea,
    },
    /// An alert was cancelled before its window lapsed
    AlertCancelled {
        alert: AlertId,
        area: TargetArea,
        reason: String,
    },
}

impl BroadcastEvent {
    /// Resolve the audience geofence for this event. Report events use a
    /// fixed radius around the incident; alert events use the alert's
    /// own area.
    pub fn resolve_area(&self, report_radius_km: f64) -> TargetArea {
        match self {
            BroadcastEvent::NewReport { location, .. }
            | BroadcastEvent::ReportVerified { location, .. }
            | BroadcastEvent::ReportModerated { location, .. } => TargetArea::Circle {
                center: *location,
                radius_km: report_radius_km,
            },
            BroadcastEvent::AlertCreated { area, .. }
            | BroadcastEvent::AlertUpdated { area, .. }
            | BroadcastEvent::AlertCancelled { area, .. } => area.clone(),
        }
    }

    /// Alert this event originates from, if any (used for delivery
    /// accounting on the alert entity)
    pub fn alert_id(&self) -> Option<AlertId> {
        match self {
            BroadcastEvent::AlertCreated { alert, .. }
            | BroadcastEvent::AlertUpdated { alert, .. }
            | BroadcastEvent::AlertCancelled { alert, .. } => Some(*alert),
            BroadcastEvent::ReportVerified { alert, .. } => *alert,
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastEvent::NewReport { .. } => "new_report",
            BroadcastEvent::ReportVerified { .. } => "report_verified",
            BroadcastEvent::ReportModerated { .. } => "report_moderated",
            BroadcastEvent::AlertCreated { .. } => "alert_created",
            BroadcastEvent::AlertUpdated { .. } => "alert_updated",
            BroadcastEvent::AlertCancelled { .. } => "alert_cancelled",
        }
    }
}
