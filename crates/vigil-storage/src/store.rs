//! Storage trait and query filters

use vigil_core::{
    Alert, AlertId, AlertStatus, Coordinate, Report, ReportCategory, ReportId, VerificationState,
    VigilResult,
};

/// Geographic query scope: a center point and radius in kilometers
#[derive(Clone, Copy, Debug)]
pub struct NearScope {
    pub center: Coordinate,
    pub radius_km: f64,
}

/// Filter for report queries; `None` fields match everything
#[derive(Clone, Debug, Default)]
pub struct ReportFilter {
    pub near: Option<NearScope>,
    pub category: Option<ReportCategory>,
    pub state: Option<VerificationState>,
}

/// Filter for alert queries; `None` fields match everything.
/// An alert matches a `near` scope when its area contains the point or
/// its area's center lies within the radius.
#[derive(Clone, Debug, Default)]
pub struct AlertFilter {
    pub near: Option<NearScope>,
    pub status: Option<AlertStatus>,
    pub min_priority: Option<u8>,
}

/// Entity persistence contract. `save_*` must be atomic per entity;
/// partially-written entities are never observable.
pub trait Store: Send + Sync {
    fn load_report(&self, id: ReportId) -> VigilResult<Option<Report>>;
    fn save_report(&self, report: &Report) -> VigilResult<()>;
    fn load_alert(&self, id: AlertId) -> VigilResult<Option<Alert>>;
    fn save_alert(&self, alert: &Alert) -> VigilResult<()>;
    fn query_reports(&self, filter: &ReportFilter) -> VigilResult<Vec<Report>>;
    fn query_alerts(&self, filter: &AlertFilter) -> VigilResult<Vec<Alert>>;
}
