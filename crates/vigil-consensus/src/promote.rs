//! Alert derivation for promoted reports
//!
//! Performed by the caller of the consensus engine so the engine itself
//! stays free of I/O: on a `Promote` decision, a new active alert is
//! built from the report's category and location and linked back to it.

use vigil_core::{Alert, AlertId, AlertSeverity, AlertStatus, Report, ReportCategory, TargetArea, Timestamp};

use crate::ConsensusConfig;

/// Fixed category -> severity map for derived alerts
pub fn severity_for_category(category: ReportCategory) -> AlertSeverity {
    match category {
        ReportCategory::Earthquake => AlertSeverity::Extreme,
        ReportCategory::Fire | ReportCategory::Flood => AlertSeverity::Critical,
        ReportCategory::Storm | ReportCategory::Crime => AlertSeverity::Warning,
        ReportCategory::Medical | ReportCategory::Infrastructure => AlertSeverity::Advisory,
        ReportCategory::Other => AlertSeverity::Info,
    }
}

/// Build the alert a promoted report spawns: active, circle around the
/// report's location, effective now through now + ttl, linked back to
/// the originating report.
pub fn derive_alert(
    report: &Report,
    alert_id: AlertId,
    now: Timestamp,
    config: &ConsensusConfig,
) -> Alert {
    let severity = severity_for_category(report.category);
    let mut alert = Alert::new(
        alert_id,
        format!("Verified {} incident", report.category.as_str()),
        report.description.clone(),
        severity,
        AlertStatus::Active,
        TargetArea::Circle {
            center: report.location,
            radius_km: config.derived_alert_radius_km,
        },
        now,
    )
    .with_ttl(now, config.derived_alert_ttl);

    alert.source_report = Some(report.id);
    alert
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vigil_core::{Coordinate, ReportId};

    #[test]
    fn test_severity_mapping() {
        assert_eq!(
            severity_for_category(ReportCategory::Earthquake),
            AlertSeverity::Extreme
        );
        assert_eq!(
            severity_for_category(ReportCategory::Fire),
            AlertSeverity::Critical
        );
        assert_eq!(
            severity_for_category(ReportCategory::Other),
            AlertSeverity::Info
        );
    }

    #[test]
    fn test_derived_alert_shape() {
        let loc = Coordinate::new(106.8, -6.2).unwrap();
        let report = Report::new(
            ReportId::new(5),
            ReportCategory::Flood,
            "river overflow".into(),
            loc,
            None,
            Timestamp::from_secs(0),
        );
        let now = Timestamp::from_secs(1000);
        let config = ConsensusConfig::default();

        let alert = derive_alert(&report, AlertId::new(42), now, &config);

        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.priority, 8);
        assert_eq!(alert.source_report, Some(ReportId::new(5)));
        assert_eq!(alert.effective_from, Some(now));
        assert_eq!(
            alert.effective_until,
            Some(now + Duration::from_secs(24 * 3600))
        );
        match alert.area {
            TargetArea::Circle { center, radius_km } => {
                assert_eq!(center, loc);
                assert_eq!(radius_km, 5.0);
            }
            _ => panic!("expected circle"),
        }
        assert!(alert.is_effective(now));
    }
}
