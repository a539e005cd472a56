//! VIGIL Consensus - Crowd verification
//!
//! Promotes a report to `verified` once enough independent,
//! geographically-plausible confirmations accumulate, or to
//! `false_report` on a deny quorum. Both transitions are one-way
//! ratchets: later vote removals never revert them. Vote mutation and
//! quorum evaluation happen in one critical section per report, so two
//! concurrent votes cannot both miss the threshold.

pub mod vote;
pub mod engine;
pub mod promote;

pub use vote::*;
pub use engine::*;
pub use promote::*;

use std::time::Duration;

/// Consensus tuning knobs
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Confirm votes required to promote a report
    pub confirm_quorum: u32,
    /// Deny votes required to reject a report
    pub deny_quorum: u32,
    /// Proximity gate: a located voter further away than this is refused
    pub max_vote_distance_km: f64,
    /// Radius of the alert derived from a promoted report
    pub derived_alert_radius_km: f64,
    /// Effective window of a derived alert
    pub derived_alert_ttl: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            confirm_quorum: 3,
            deny_quorum: 3,
            max_vote_distance_km: 5.0,
            derived_alert_radius_km: 5.0,
            derived_alert_ttl: Duration::from_secs(24 * 3600),
        }
    }
}
