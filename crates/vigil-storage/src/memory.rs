//! In-memory store

use std::collections::HashMap;

use parking_lot::RwLock;
use vigil_core::{Alert, AlertId, Report, ReportId, VigilResult};
use vigil_geo::{area_center, area_contains, within_radius};

use crate::{AlertFilter, ReportFilter, Store};

/// Map-backed store. Each save replaces the whole entity under one
/// write lock, which satisfies the per-entity atomicity contract.
#[derive(Default)]
pub struct MemoryStore {
    reports: RwLock<HashMap<ReportId, Report>>,
    alerts: RwLock<HashMap<AlertId, Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_count(&self) -> usize {
        self.reports.read().len()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.read().len()
    }
}

impl Store for MemoryStore {
    fn load_report(&self, id: ReportId) -> VigilResult<Option<Report>> {
        Ok(self.reports.read().get(&id).cloned())
    }

    fn save_report(&self, report: &Report) -> VigilResult<()> {
        self.reports.write().insert(report.id, report.clone());
        Ok(())
    }

    fn load_alert(&self, id: AlertId) -> VigilResult<Option<Alert>> {
        Ok(self.alerts.read().get(&id).cloned())
    }

    fn save_alert(&self, alert: &Alert) -> VigilResult<()> {
        self.alerts.write().insert(alert.id, alert.clone());
        Ok(())
    }

    fn query_reports(&self, filter: &ReportFilter) -> VigilResult<Vec<Report>> {
        let reports = self.reports.read();
        Ok(reports
            .values()
            .filter(|r| {
                filter.near.map_or(true, |scope| {
                    within_radius(r.location, scope.center, scope.radius_km)
                }) && filter.category.map_or(true, |c| r.category == c)
                    && filter.state.map_or(true, |s| r.tally.state == s)
            })
            .cloned()
            .collect())
    }

    fn query_alerts(&self, filter: &AlertFilter) -> VigilResult<Vec<Alert>> {
        let alerts = self.alerts.read();
        Ok(alerts
            .values()
            .filter(|a| {
                filter.near.map_or(true, |scope| {
                    area_contains(&a.area, scope.center)
                        || area_center(&a.area)
                            .is_some_and(|c| within_radius(c, scope.center, scope.radius_km))
                }) && filter.status.map_or(true, |s| a.status == s)
                    && filter.min_priority.map_or(true, |p| a.priority >= p)
            })
            .cloned()
            .collect())
    }
}
