//! Snapshot rendering
//!
//! An immutable, point-in-time view of a planning's tally. Capturing is a
//! pure function of planning + ledger: it copies everything it needs, never
//! blocks on I/O and never mutates the ledger. A caller holding an old
//! snapshot keeps seeing the old state until it asks for a new one.

use serde::Serialize;

use super::ledger::VoteLedger;
use super::planning::{Planning, PlanningStatus};
use super::voter::Voter;

/// Tally for one option, in the planning's display order
#[derive(Debug, Clone, Serialize)]
pub struct OptionTally {
    pub option_id: u32,
    pub label: String,
    /// Voter roll, first voters first
    pub voters: Vec<Voter>,
}

/// Immutable tally of one planning
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub planning_id: String,
    pub title: String,
    pub status: PlanningStatus,
    pub single_select: bool,
    pub options: Vec<OptionTally>,
    /// Distinct participants holding at least one vote
    pub participants: usize,
    pub created_at: i64,
    pub closed_at: Option<i64>,
}

impl Snapshot {
    /// Capture the current state. Defensive copy; the snapshot stays valid
    /// after later mutations.
    pub fn capture(planning: &Planning, ledger: &VoteLedger) -> Self {
        let options = planning
            .options
            .iter()
            .map(|opt| OptionTally {
                option_id: opt.id,
                label: opt.label.clone(),
                voters: ledger.voters_for(opt.id).to_vec(),
            })
            .collect();

        Self {
            planning_id: planning.id.clone(),
            title: planning.title.clone(),
            status: planning.status,
            single_select: planning.single_select,
            options,
            participants: ledger.participants(),
            created_at: planning.created_at,
            closed_at: planning.closed_at,
        }
    }

    /// Tally for one option, if the option exists
    pub fn option(&self, option_id: u32) -> Option<&OptionTally> {
        self.options.iter().find(|o| o.option_id == option_id)
    }

    /// Voter ids for one option, in roll order (test and transport helper)
    pub fn voter_ids(&self, option_id: u32) -> Vec<&str> {
        self.option(option_id)
            .map(|o| o.voters.iter().map(|v| v.id.as_str()).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "*{}*", self.title)?;
        writeln!(f)?;
        for opt in &self.options {
            write!(f, "{}. {} - 👥 {}", opt.option_id, opt.label, opt.voters.len())?;
            if !opt.voters.is_empty() {
                let names: Vec<&str> = opt.voters.iter().map(|v| v.display_name.as_str()).collect();
                write!(f, " ({})", names.join(", "))?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        write!(
            f,
            "👥 {} people participated so far. _Planning {}_.",
            self.participants, self.status
        )
    }
}
