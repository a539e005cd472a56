//! Per-report tally locking
//!
//! `ConsensusEngine` keeps one mutex per live tally in a sharded map.
//! Votes on the same report are linearizable (mutation and quorum check
//! inside one lock hold); votes on different reports run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;
use vigil_core::{
    AccountId, Coordinate, ReportId, VerificationState, VigilResult, VoteTally, VoteValue,
};

use crate::{cast_vote, remove_vote, ConsensusConfig, VoteOutcome};

const SHARD_COUNT: usize = 16;

type TallyCell = Arc<Mutex<VoteTally>>;

/// Shared vote-tally store with per-report serialization
pub struct ConsensusEngine {
    shards: Vec<RwLock<HashMap<ReportId, TallyCell>>>,
    config: ConsensusConfig,
}

impl ConsensusEngine {
    pub fn new(config: ConsensusConfig) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        ConsensusEngine { shards, config }
    }

    #[inline]
    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    #[inline]
    fn shard(&self, report: ReportId) -> &RwLock<HashMap<ReportId, TallyCell>> {
        &self.shards[(report.0 as usize) % SHARD_COUNT]
    }

    /// Tally cell for a report, seeding from `seed` on first touch
    /// (the persisted tally loaded alongside the report)
    fn cell(&self, report: ReportId, seed: &VoteTally) -> TallyCell {
        if let Some(cell) = self.shard(report).read().get(&report) {
            return cell.clone();
        }
        self.shard(report)
            .write()
            .entry(report)
            .or_insert_with(|| Arc::new(Mutex::new(seed.clone())))
            .clone()
    }

    /// Cast a vote on a report. Returns the outcome plus a snapshot of
    /// the tally for persisting back onto the report entity.
    pub fn cast_vote(
        &self,
        report: ReportId,
        seed: &VoteTally,
        account: AccountId,
        value: VoteValue,
        voter_location: Option<Coordinate>,
        report_location: Coordinate,
    ) -> VigilResult<(VoteOutcome, VoteTally)> {
        let cell = self.cell(report, seed);
        let mut tally = cell.lock();
        let outcome = cast_vote(
            &mut tally,
            account,
            value,
            voter_location,
            report_location,
            &self.config,
        )?;
        if let Some(decision) = outcome.decision {
            info!(report = %report, ?decision, confirms = outcome.confirm_count,
                denies = outcome.deny_count, "consensus decision");
        }
        Ok((outcome, tally.clone()))
    }

    /// Withdraw an account's vote. The ratchet holds: no retroactive
    /// promotion or rejection.
    pub fn remove_vote(
        &self,
        report: ReportId,
        seed: &VoteTally,
        account: AccountId,
    ) -> Option<(VoteValue, VoteTally)> {
        let cell = self.cell(report, seed);
        let mut tally = cell.lock();
        let removed = remove_vote(&mut tally, account)?;
        Some((removed, tally.clone()))
    }

    /// Moderator override of the verification state. The only path that
    /// may leave a terminal state.
    pub fn override_state(
        &self,
        report: ReportId,
        seed: &VoteTally,
        state: VerificationState,
    ) -> VoteTally {
        let cell = self.cell(report, seed);
        let mut tally = cell.lock();
        tally.state = state;
        tally.clone()
    }

    /// Drop the in-memory cell once the report is gone from storage
    pub fn evict(&self, report: ReportId) {
        self.shard(report).write().remove(&report);
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(ConsensusConfig::default())
    }
}
