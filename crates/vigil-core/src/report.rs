//! Crowd-submitted incident reports
//!
//! A report owns one `VoteTally` and, once promoted by consensus,
//! references the derived alert by id.

use serde::{Deserialize, Serialize};

use crate::{AccountId, AlertId, Coordinate, ReportId, Timestamp, VerificationState, VoteTally};

/// Incident category chosen by the reporter.
/// Drives the severity of an alert derived on promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportCategory {
    Earthquake,
    Fire,
    Flood,
    Storm,
    Crime,
    Medical,
    Infrastructure,
    Other,
}

impl ReportCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportCategory::Earthquake => "earthquake",
            ReportCategory::Fire => "fire",
            ReportCategory::Flood => "flood",
            ReportCategory::Storm => "storm",
            ReportCategory::Crime => "crime",
            ReportCategory::Medical => "medical",
            ReportCategory::Infrastructure => "infrastructure",
            ReportCategory::Other => "other",
        }
    }
}

/// A crowd-submitted incident report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub category: ReportCategory,
    pub description: String,
    pub location: Coordinate,
    /// Absent for anonymous submissions
    pub reporter: Option<AccountId>,
    pub submitted_at: Timestamp,
    pub tally: VoteTally,
    /// Alert derived from this report on promotion, if any
    pub derived_alert: Option<AlertId>,
    /// Moderator override audit trail
    pub moderated_by: Option<AccountId>,
    pub moderated_at: Option<Timestamp>,
}

impl Report {
    pub fn new(
        id: ReportId,
        category: ReportCategory,
        description: String,
        location: Coordinate,
        reporter: Option<AccountId>,
        submitted_at: Timestamp,
    ) -> Self {
        Report {
            id,
            category,
            description,
            location,
            reporter,
            submitted_at,
            tally: VoteTally::new(),
            derived_alert: None,
            moderated_by: None,
            moderated_at: None,
        }
    }

    #[inline]
    pub fn verification_state(&self) -> VerificationState {
        self.tally.state
    }
}
