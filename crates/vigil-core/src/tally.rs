//! Vote tally for crowd verification
//!
//! One tally per report. Holds the confirm/deny counts, the per-account
//! vote map, and the derived verification state. Mutations here maintain
//! the count invariant; quorum evaluation and the promotion ratchet live
//! in `vigil-consensus`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Direction of a verification vote
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteValue {
    Confirm,
    Deny,
}

/// Verification state of a report.
/// Monotonic once it leaves `Unverified`, except for moderator override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerificationState {
    #[default]
    Unverified,
    Verified,
    FalseReport,
}

impl VerificationState {
    /// Terminal states hold against further vote-driven transitions
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, VerificationState::Unverified)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VerificationState::Unverified => "unverified",
            VerificationState::Verified => "verified",
            VerificationState::FalseReport => "false_report",
        }
    }
}

/// Effect of applying one vote to a tally
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteMutation {
    /// First vote by this account
    Added,
    /// Same value cast again: toggle-off, vote removed
    Removed,
    /// Opposite value cast: vote moved between buckets in one step
    Moved,
}

/// Per-report vote aggregate
///
/// INVARIANT: confirm_count + deny_count == voters.len()
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub confirm_count: u32,
    pub deny_count: u32,
    voters: HashMap<AccountId, VoteValue>,
    pub state: VerificationState,
    /// Votes accepted without a known voter location (audit trail for the
    /// waived proximity gate)
    pub gate_waived: u32,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one vote by `account`. Same value twice removes the vote;
    /// the opposite value moves it; otherwise it is added. Counts are
    /// updated in the same step, so the invariant holds at every return.
    pub fn apply_vote(&mut self, account: AccountId, value: VoteValue) -> VoteMutation {
        match self.voters.get(&account).copied() {
            Some(existing) if existing == value => {
                self.voters.remove(&account);
                self.decrement(value);
                VoteMutation::Removed
            }
            Some(existing) => {
                self.voters.insert(account, value);
                self.decrement(existing);
                self.increment(value);
                VoteMutation::Moved
            }
            None => {
                self.voters.insert(account, value);
                self.increment(value);
                VoteMutation::Added
            }
        }
    }

    /// Withdraw an account's vote (e.g., account deleted).
    /// Returns the removed value, if any.
    pub fn remove_vote(&mut self, account: AccountId) -> Option<VoteValue> {
        let value = self.voters.remove(&account)?;
        self.decrement(value);
        Some(value)
    }

    /// Current vote of an account, if any
    pub fn vote_of(&self, account: AccountId) -> Option<VoteValue> {
        self.voters.get(&account).copied()
    }

    #[inline]
    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Check the count invariant (used by tests and debug assertions)
    pub fn is_consistent(&self) -> bool {
        (self.confirm_count + self.deny_count) as usize == self.voters.len()
    }

    fn increment(&mut self, value: VoteValue) {
        match value {
            VoteValue::Confirm => self.confirm_count += 1,
            VoteValue::Deny => self.deny_count += 1,
        }
    }

    fn decrement(&mut self, value: VoteValue) {
        match value {
            VoteValue::Confirm => self.confirm_count = self.confirm_count.saturating_sub(1),
            VoteValue::Deny => self.deny_count = self.deny_count.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_toggle_off() {
        let mut tally = VoteTally::new();
        let account = AccountId::new(1);

        assert_eq!(tally.apply_vote(account, VoteValue::Confirm), VoteMutation::Added);
        assert_eq!(tally.confirm_count, 1);

        assert_eq!(tally.apply_vote(account, VoteValue::Confirm), VoteMutation::Removed);
        assert_eq!(tally.confirm_count, 0);
        assert_eq!(tally.voter_count(), 0);
        assert!(tally.is_consistent());
    }

    #[test]
    fn test_vote_move_between_buckets() {
        let mut tally = VoteTally::new();
        let account = AccountId::new(1);

        tally.apply_vote(account, VoteValue::Confirm);
        assert_eq!(tally.apply_vote(account, VoteValue::Deny), VoteMutation::Moved);

        assert_eq!(tally.confirm_count, 0);
        assert_eq!(tally.deny_count, 1);
        assert_eq!(tally.voter_count(), 1);
        assert!(tally.is_consistent());
    }

    #[test]
    fn test_remove_vote() {
        let mut tally = VoteTally::new();
        let account = AccountId::new(1);

        tally.apply_vote(account, VoteValue::Deny);
        assert_eq!(tally.remove_vote(account), Some(VoteValue::Deny));
        assert_eq!(tally.deny_count, 0);
        assert_eq!(tally.remove_vote(account), None);
        assert!(tally.is_consistent());
    }

    #[test]
    fn test_tally_serde_roundtrip() {
        let mut tally = VoteTally::new();
        tally.apply_vote(AccountId::new(1), VoteValue::Confirm);
        tally.apply_vote(AccountId::new(2), VoteValue::Deny);
        tally.gate_waived = 1;

        let json = serde_json::to_string(&tally).unwrap();
        let back: VoteTally = serde_json::from_str(&json).unwrap();

        assert_eq!(back.confirm_count, 1);
        assert_eq!(back.deny_count, 1);
        assert_eq!(back.vote_of(AccountId::new(2)), Some(VoteValue::Deny));
        assert_eq!(back.gate_waived, 1);
        assert!(back.is_consistent());
    }

    #[test]
    fn test_invariant_across_many_voters() {
        let mut tally = VoteTally::new();
        for i in 0..10 {
            let value = if i % 2 == 0 { VoteValue::Confirm } else { VoteValue::Deny };
            tally.apply_vote(AccountId::new(i), value);
            assert!(tally.is_consistent());
        }
        assert_eq!(tally.confirm_count, 5);
        assert_eq!(tally.deny_count, 5);
    }
}
