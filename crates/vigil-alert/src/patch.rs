//! Authority updates to an alert
//!
//! An update may change content, severity, area, or window. Priority is
//! re-derived on severity change unless the same patch sets priority
//! explicitly; explicit wins. Terminal alerts are immutable except for
//! audit fields.

use vigil_core::{
    Alert, AlertSeverity, AlertStatus, TargetArea, Timestamp, VigilError, VigilResult,
};

/// Partial update to an alert; `None` fields are left unchanged
#[derive(Clone, Debug, Default)]
pub struct AlertPatch {
    pub title: Option<String>,
    pub message: Option<String>,
    pub severity: Option<AlertSeverity>,
    /// Explicit priority override, wins over severity derivation
    pub priority: Option<u8>,
    pub area: Option<TargetArea>,
    pub effective_from: Option<Timestamp>,
    pub effective_until: Option<Timestamp>,
}

impl AlertPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.message.is_none()
            && self.severity.is_none()
            && self.priority.is_none()
            && self.area.is_none()
            && self.effective_from.is_none()
            && self.effective_until.is_none()
    }
}

/// Apply a patch to a non-terminal alert
pub fn apply_patch(alert: &mut Alert, patch: AlertPatch) -> VigilResult<()> {
    if alert.status.is_terminal() {
        return Err(VigilError::InvalidTransition {
            from: alert.status.as_str(),
            to: AlertStatus::Updated.as_str(),
        });
    }

    if let Some(title) = patch.title {
        alert.title = title;
    }
    if let Some(message) = patch.message {
        alert.message = message;
    }

    let severity_changed = match patch.severity {
        Some(severity) if severity != alert.severity => {
            alert.severity = severity;
            true
        }
        _ => false,
    };

    match patch.priority {
        // Explicit priority in the same update wins
        Some(priority) => alert.priority = priority.clamp(1, 10),
        None if severity_changed => alert.priority = alert.severity.default_priority(),
        None => {}
    }

    if let Some(area) = patch.area {
        alert.area = area;
    }
    if let Some(from) = patch.effective_from {
        alert.effective_from = Some(from);
    }
    if let Some(until) = patch.effective_until {
        alert.effective_until = Some(until);
    }
    Ok(())
}
