//! Alert status transitions

use tracing::debug;
use vigil_core::{AccountId, Alert, AlertStatus, Timestamp, VigilError, VigilResult};

fn invalid(from: AlertStatus, to: AlertStatus) -> VigilError {
    VigilError::InvalidTransition {
        from: from.as_str(),
        to: to.as_str(),
    }
}

/// Move a draft, pending, or updated alert to active
pub fn activate(alert: &mut Alert) -> VigilResult<()> {
    match alert.status {
        AlertStatus::Draft | AlertStatus::PendingApproval | AlertStatus::Updated => {
            alert.status = AlertStatus::Active;
            alert.is_active = true;
            Ok(())
        }
        from => Err(invalid(from, AlertStatus::Active)),
    }
}

/// Flag an active alert as updated; callers re-activate after applying
/// the change so the status round-trips active -> updated -> active
pub fn mark_updated(alert: &mut Alert) -> VigilResult<()> {
    match alert.status {
        AlertStatus::Active => {
            alert.status = AlertStatus::Updated;
            Ok(())
        }
        from => Err(invalid(from, AlertStatus::Updated)),
    }
}

/// Cancel a non-terminal alert, stamping actor, time, and reason
pub fn cancel(
    alert: &mut Alert,
    actor: Option<AccountId>,
    reason: String,
    now: Timestamp,
) -> VigilResult<()> {
    if alert.status.is_terminal() {
        return Err(invalid(alert.status, AlertStatus::Cancelled));
    }
    alert.status = AlertStatus::Cancelled;
    alert.is_active = false;
    alert.ended_by = actor;
    alert.ended_at = Some(now);
    alert.cancel_reason = Some(reason);
    Ok(())
}

/// Resolve an active or updated alert
pub fn resolve(alert: &mut Alert, actor: Option<AccountId>, now: Timestamp) -> VigilResult<()> {
    match alert.status {
        AlertStatus::Active | AlertStatus::Updated => {
            alert.status = AlertStatus::Resolved;
            alert.is_active = false;
            alert.ended_by = actor;
            alert.ended_at = Some(now);
            Ok(())
        }
        from => Err(invalid(from, AlertStatus::Resolved)),
    }
}

/// Expire an active alert whose window lapsed
pub fn expire(alert: &mut Alert, now: Timestamp) -> VigilResult<()> {
    match alert.status {
        AlertStatus::Active => {
            alert.status = AlertStatus::Expired;
            alert.is_active = false;
            alert.ended_at = Some(now);
            Ok(())
        }
        from => Err(invalid(from, AlertStatus::Expired)),
    }
}

/// Bring a terminated alert back to active, clearing the end stamps
pub fn reactivate(alert: &mut Alert) -> VigilResult<()> {
    if !alert.status.is_terminal() {
        return Err(invalid(alert.status, AlertStatus::Active));
    }
    alert.status = AlertStatus::Active;
    alert.is_active = true;
    alert.ended_by = None;
    alert.ended_at = None;
    alert.cancel_reason = None;
    Ok(())
}

/// Lazy expiry check, applied by every query surface before returning an
/// alert. Returns true when the status changed (caller persists).
pub fn check_expiry(alert: &mut Alert, now: Timestamp) -> bool {
    if alert.window_lapsed(now) {
        // window_lapsed implies status == Active, expire cannot fail
        let _ = expire(alert, now);
        debug!(alert = %alert.id, "alert expired lazily");
        true
    } else {
        false
    }
}
