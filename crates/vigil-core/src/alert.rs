//! Geofenced alert entity
//!
//! Alerts are created directly by an authority or derived automatically
//! from a promoted report. Status transitions are governed by
//! `vigil-alert`; delivery counters are mutated only by `vigil-router`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AccountId, AlertId, ReportId, TargetArea, Timestamp};

/// Alert severity, mapped to a default priority unless the caller
/// overrides priority explicitly
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Extreme,
    Critical,
    Warning,
    Advisory,
    Info,
}

impl AlertSeverity {
    /// Fixed severity -> priority map
    pub fn default_priority(self) -> u8 {
        match self {
            AlertSeverity::Extreme => 10,
            AlertSeverity::Critical => 8,
            AlertSeverity::Warning => 6,
            AlertSeverity::Advisory => 4,
            AlertSeverity::Info => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Extreme => "extreme",
            AlertSeverity::Critical => "critical",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Advisory => "advisory",
            AlertSeverity::Info => "info",
        }
    }
}

/// Priority used when no severity is known
pub const DEFAULT_PRIORITY: u8 = 5;

/// Alert lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Draft,
    PendingApproval,
    Active,
    Updated,
    Expired,
    Cancelled,
    Resolved,
}

impl AlertStatus {
    /// Terminal statuses freeze the alert except for audit fields
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AlertStatus::Expired | AlertStatus::Cancelled | AlertStatus::Resolved
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Draft => "draft",
            AlertStatus::PendingApproval => "pending_approval",
            AlertStatus::Active => "active",
            AlertStatus::Updated => "updated",
            AlertStatus::Expired => "expired",
            AlertStatus::Cancelled => "cancelled",
            AlertStatus::Resolved => "resolved",
        }
    }
}

/// Fan-out accounting, monotonic non-decreasing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounters {
    pub total_targeted: u64,
    pub sent: u64,
    pub delivered: u64,
    pub read: u64,
    pub failed: u64,
}

/// A geofenced broadcast unit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    /// 1..=10, derived from severity unless explicitly overridden
    pub priority: u8,
    pub area: TargetArea,
    pub effective_from: Option<Timestamp>,
    pub effective_until: Option<Timestamp>,
    pub is_active: bool,
    pub created_at: Timestamp,
    /// Absent for alerts derived automatically from a promoted report
    pub created_by: Option<AccountId>,
    /// Originating report for derived alerts
    pub source_report: Option<ReportId>,
    pub ended_by: Option<AccountId>,
    pub ended_at: Option<Timestamp>,
    pub cancel_reason: Option<String>,
    pub delivery: DeliveryCounters,
}

impl Alert {
    pub fn new(
        id: AlertId,
        title: String,
        message: String,
        severity: AlertSeverity,
        status: AlertStatus,
        area: TargetArea,
        created_at: Timestamp,
    ) -> Self {
        Alert {
            id,
            title,
            message,
            severity,
            status,
            priority: severity.default_priority(),
            area,
            effective_from: None,
            effective_until: None,
            is_active: status == AlertStatus::Active,
            created_at,
            created_by: None,
            source_report: None,
            ended_by: None,
            ended_at: None,
            cancel_reason: None,
            delivery: DeliveryCounters::default(),
        }
    }

    pub fn with_window(mut self, from: Timestamp, until: Timestamp) -> Self {
        self.effective_from = Some(from);
        self.effective_until = Some(until);
        self
    }

    pub fn with_ttl(self, now: Timestamp, ttl: Duration) -> Self {
        self.with_window(now, now + ttl)
    }

    /// Deliverable right now: status Active and the current time inside
    /// the half-open [effective_from, effective_until) window. Missing
    /// bounds are open.
    pub fn is_effective(&self, now: Timestamp) -> bool {
        if self.status != AlertStatus::Active {
            return false;
        }
        if let Some(from) = self.effective_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.effective_until {
            if now >= until {
                return false;
            }
        }
        true
    }

    /// Window has lapsed while the alert is still marked active
    pub fn window_lapsed(&self, now: Timestamp) -> bool {
        self.status == AlertStatus::Active
            && self.effective_until.is_some_and(|until| now >= until)
    }
}
