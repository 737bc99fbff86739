//! Vote ledger
//!
//! Per-planning record of who chose what. Each option carries an ordered
//! voter roll (first voters first; re-adding a retracted vote moves the
//! voter to the end). The ledger is the single source of truth for votes -
//! options themselves never store voters.
//!
//! Callers mutate the ledger only while holding the planning's mutation
//! slot, which makes every toggle one atomic check-then-act.

use std::collections::HashMap;

use super::voter::Voter;

/// Which state a toggle resulted in, for the caller to phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDelta {
    /// The vote did not exist and was created
    Added,
    /// The vote existed and was retracted
    Removed,
    /// Single-select: the new vote displaced the voter's prior vote
    Switched { from: u32 },
}

/// Votes for one planning
#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    /// option id -> voters, ordered by when each vote was last added
    rolls: HashMap<u32, Vec<Voter>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the (option, voter) vote.
    ///
    /// Removal is unconditional. Under single-select, adding while holding
    /// a vote for a different option swaps the two in one step - the voter
    /// is never observable with zero votes in between, because the caller
    /// holds the mutation slot for the duration.
    pub fn toggle(&mut self, option_id: u32, voter: &Voter, single_select: bool) -> VoteDelta {
        if self.has_vote(option_id, &voter.id) {
            self.remove(option_id, &voter.id);
            return VoteDelta::Removed;
        }

        if single_select
            && let Some(prior) = self.first_option_of(&voter.id)
        {
            self.remove(prior, &voter.id);
            self.push(option_id, voter.clone());
            return VoteDelta::Switched { from: prior };
        }

        self.push(option_id, voter.clone());
        VoteDelta::Added
    }

    /// Does this voter currently hold a vote for this option?
    pub fn has_vote(&self, option_id: u32, voter_id: &str) -> bool {
        self.rolls
            .get(&option_id)
            .is_some_and(|roll| roll.iter().any(|v| v.id == voter_id))
    }

    /// Ordered voter roll for one option (empty if nobody voted).
    pub fn voters_for(&self, option_id: u32) -> &[Voter] {
        self.rolls.get(&option_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All options this voter currently holds a vote for, ascending.
    pub fn options_of(&self, voter_id: &str) -> Vec<u32> {
        let mut options: Vec<u32> = self
            .rolls
            .iter()
            .filter(|(_, roll)| roll.iter().any(|v| v.id == voter_id))
            .map(|(&id, _)| id)
            .collect();
        options.sort_unstable();
        options
    }

    /// Number of distinct participants holding at least one vote.
    pub fn participants(&self) -> usize {
        let mut ids: Vec<&str> = self
            .rolls
            .values()
            .flat_map(|roll| roll.iter().map(|v| v.id.as_str()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Total number of votes across all options.
    pub fn vote_count(&self) -> usize {
        self.rolls.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vote_count() == 0
    }

    /// Re-insert a vote during restore from storage. Appends in call order;
    /// callers feed votes back in persisted rank order.
    pub fn restore_vote(&mut self, option_id: u32, voter: Voter) {
        if !self.has_vote(option_id, &voter.id) {
            self.push(option_id, voter);
        }
    }

    /// Iterate rolls for persistence, option id ascending.
    pub fn rolls(&self) -> impl Iterator<Item = (u32, &[Voter])> {
        let mut ids: Vec<u32> = self.rolls.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(move |id| (id, self.voters_for(id)))
    }

    fn push(&mut self, option_id: u32, voter: Voter) {
        self.rolls.entry(option_id).or_default().push(voter);
    }

    fn remove(&mut self, option_id: u32, voter_id: &str) {
        if let Some(roll) = self.rolls.get_mut(&option_id) {
            roll.retain(|v| v.id != voter_id);
            if roll.is_empty() {
                self.rolls.remove(&option_id);
            }
        }
    }

    fn first_option_of(&self, voter_id: &str) -> Option<u32> {
        self.options_of(voter_id).first().copied()
    }
}
