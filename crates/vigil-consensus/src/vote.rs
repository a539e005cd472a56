//! Vote casting with proximity gate and quorum evaluation

use vigil_core::{
    AccountId, Coordinate, VerificationState, VigilError, VigilResult, VoteMutation, VoteTally,
    VoteValue,
};
use vigil_geo::distance_km;

use crate::ConsensusConfig;

/// Automatic state transition triggered by a vote
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Confirm quorum reached: the report is verified
    Promote,
    /// Deny quorum reached: the report is a false report
    Reject,
}

/// Result of one accepted vote
#[derive(Clone, Debug)]
pub struct VoteOutcome {
    pub mutation: VoteMutation,
    pub confirm_count: u32,
    pub deny_count: u32,
    pub state: VerificationState,
    /// Set for exactly one vote per tally, the one that crossed a quorum
    pub decision: Option<Decision>,
    /// True when the proximity gate was waived for lack of a voter
    /// location (recorded for audit, not rejected)
    pub gate_waived: bool,
}

/// Apply one vote to a tally, then evaluate quorum in the same step.
///
/// The gate runs first: a voter with a known location further than
/// `max_vote_distance_km` from the report is refused with `OutOfRange`
/// and the tally is left untouched. A voter without a known location is
/// allowed through with `gate_waived` recorded.
///
/// Quorum checks use `>=`, so a tally that jumps the threshold still
/// triggers exactly once; terminal states are never re-entered or
/// reverted by votes (the ratchet).
pub fn cast_vote(
    tally: &mut VoteTally,
    account: AccountId,
    value: VoteValue,
    voter_location: Option<Coordinate>,
    report_location: Coordinate,
    config: &ConsensusConfig,
) -> VigilResult<VoteOutcome> {
    let gate_waived = match voter_location {
        Some(location) => {
            let d = distance_km(location, report_location);
            if d > config.max_vote_distance_km {
                return Err(VigilError::OutOfRange {
                    distance_km: d,
                    max_km: config.max_vote_distance_km,
                });
            }
            false
        }
        None => {
            tally.gate_waived += 1;
            true
        }
    };

    let mutation = tally.apply_vote(account, value);
    let decision = evaluate_quorum(tally, config);

    debug_assert!(tally.is_consistent());

    Ok(VoteOutcome {
        mutation,
        confirm_count: tally.confirm_count,
        deny_count: tally.deny_count,
        state: tally.state,
        decision,
        gate_waived,
    })
}

/// Withdraw an account's vote (account deletion path). Never triggers a
/// retroactive promotion or rejection; the ratchet holds even if counts
/// drop back below threshold.
pub fn remove_vote(tally: &mut VoteTally, account: AccountId) -> Option<VoteValue> {
    tally.remove_vote(account)
}

/// Evaluate promotion/rejection exactly once, only from `Unverified`.
/// Reaching one quorum permanently forecloses the other.
fn evaluate_quorum(tally: &mut VoteTally, config: &ConsensusConfig) -> Option<Decision> {
    if tally.state != VerificationState::Unverified {
        return None;
    }
    if tally.confirm_count >= config.confirm_quorum {
        tally.state = VerificationState::Verified;
        Some(Decision::Promote)
    } else if tally.deny_count >= config.deny_quorum {
        tally.state = VerificationState::FalseReport;
        Some(Decision::Reject)
    } else {
        None
    }
}
