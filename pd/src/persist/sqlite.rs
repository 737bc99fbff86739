//! SQLite-backed store adapter
//!
//! Maps domain types to planstore rows and back. The heavy lifting
//! (transactions, schema, file locking) lives in the planstore crate.

use std::path::Path;

use planstore::{OptionRecord, PlanningRecord, Store, StoredPlanning, VoteRecord};

use crate::domain::{Planning, PlanningStatus, Voter, VoteLedger};

use super::{PersistError, PlanningStore};

pub struct SqliteStore {
    store: Store,
}

impl SqliteStore {
    /// Open (creating if necessary) the store directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let store = Store::open(dir).map_err(|e| PersistError(e.to_string()))?;
        Ok(Self { store })
    }
}

impl PlanningStore for SqliteStore {
    fn save(&self, planning: &Planning, ledger: &VoteLedger) -> Result<(), PersistError> {
        self.store
            .save(&to_stored(planning, ledger))
            .map_err(|e| PersistError(e.to_string()))
    }

    fn load_all(&self) -> Result<Vec<(Planning, VoteLedger)>, PersistError> {
        let stored = self.store.load_all().map_err(|e| PersistError(e.to_string()))?;
        stored.into_iter().map(from_stored).collect()
    }
}

fn to_stored(planning: &Planning, ledger: &VoteLedger) -> StoredPlanning {
    let options = planning
        .options
        .iter()
        .map(|opt| OptionRecord {
            planning_id: planning.id.clone(),
            option_id: opt.id,
            label: opt.label.clone(),
        })
        .collect();

    let votes = ledger
        .rolls()
        .flat_map(|(option_id, roll)| {
            let planning_id = planning.id.clone();
            roll.iter().enumerate().map(move |(rank, voter)| VoteRecord {
                planning_id: planning_id.clone(),
                option_id,
                voter_id: voter.id.clone(),
                voter_name: voter.display_name.clone(),
                rank: rank as u32,
            })
        })
        .collect();

    StoredPlanning {
        planning: PlanningRecord {
            id: planning.id.clone(),
            scope: planning.scope.clone(),
            title: planning.title.clone(),
            creator_id: planning.creator.id.clone(),
            creator_name: planning.creator.display_name.clone(),
            single_select: planning.single_select,
            status: planning.status.to_string(),
            created_at: planning.created_at,
            closed_at: planning.closed_at,
        },
        options,
        votes,
    }
}

fn from_stored(stored: StoredPlanning) -> Result<(Planning, VoteLedger), PersistError> {
    let status: PlanningStatus = stored.planning.status.parse().map_err(PersistError)?;

    let labels = stored.options.into_iter().map(|o| o.label).collect();
    let mut planning = Planning::with_id(
        stored.planning.id,
        stored.planning.scope,
        stored.planning.title,
        Voter::new(stored.planning.creator_id, stored.planning.creator_name),
        labels,
        stored.planning.single_select,
    );
    planning.status = status;
    planning.created_at = stored.planning.created_at;
    planning.closed_at = stored.planning.closed_at;

    // Votes arrive ordered by (option, rank); restore keeps that order.
    let mut ledger = VoteLedger::new();
    for vote in stored.votes {
        ledger.restore_vote(vote.option_id, Voter::new(vote.voter_id, vote.voter_name));
    }

    Ok((planning, ledger))
}
