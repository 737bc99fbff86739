//! Planning domain type
//!
//! A Planning is one decision under vote: a fixed option set, a creator who
//! alone may close it, and an open/closed lifecycle state.

use serde::{Deserialize, Serialize};

use planstore::now_ms;

use super::id::generate_id;
use super::voter::Voter;

/// Planning lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStatus {
    /// Accepting vote toggles
    #[default]
    Open,
    /// Terminal; read-only
    Closed,
}

impl std::fmt::Display for PlanningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for PlanningStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown planning status: {other}")),
        }
    }
}

/// One selectable alternative within a planning.
///
/// Ids are assigned 1..=N in display order at creation and never change;
/// the option set is fixed for the planning's lifetime. Voters are not
/// stored here - the ledger is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOption {
    pub id: u32,
    pub label: String,
}

/// A decision in progress or finished
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planning {
    /// Unique identifier (e.g., "019b42-plan-party-day")
    pub id: String,

    /// Conversational scope the planning is visible in
    pub scope: String,

    /// Human-readable title, immutable after creation
    pub title: String,

    /// The participant who created it; owns the right to close it
    pub creator: Voter,

    /// At most one active vote per voter when set
    pub single_select: bool,

    /// Options in display order, fixed at creation
    pub options: Vec<PlanOption>,

    /// Current lifecycle state
    pub status: PlanningStatus,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Close timestamp (Unix milliseconds), set exactly once
    pub closed_at: Option<i64>,
}

impl Planning {
    /// Create a new Planning with a generated id. Labels are taken as-is;
    /// the registry validates them before calling this.
    pub fn new(
        scope: impl Into<String>,
        title: impl Into<String>,
        creator: Voter,
        labels: Vec<String>,
        single_select: bool,
    ) -> Self {
        let title = title.into();
        let id = generate_id(&title);
        Self::with_id(id, scope, title, creator, labels, single_select)
    }

    /// Create a Planning with a specific id (for restore or testing)
    pub fn with_id(
        id: impl Into<String>,
        scope: impl Into<String>,
        title: impl Into<String>,
        creator: Voter,
        labels: Vec<String>,
        single_select: bool,
    ) -> Self {
        let options = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| PlanOption {
                id: i as u32 + 1,
                label,
            })
            .collect();
        Self {
            id: id.into(),
            scope: scope.into(),
            title: title.into(),
            creator,
            single_select,
            options,
            status: PlanningStatus::Open,
            created_at: now_ms(),
            closed_at: None,
        }
    }

    /// Look up an option by id
    pub fn option(&self, option_id: u32) -> Option<&PlanOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn is_open(&self) -> bool {
        self.status == PlanningStatus::Open
    }

    /// Transition to Closed. Idempotent: a second call changes nothing,
    /// `closed_at` keeps its original value.
    pub fn close(&mut self) {
        if self.status == PlanningStatus::Open {
            self.status = PlanningStatus::Closed;
            self.closed_at = Some(now_ms());
        }
    }

    /// Summary for list views
    pub fn summary(&self, participants: usize) -> PlanningSummary {
        PlanningSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            option_count: self.options.len(),
            participants,
            created_at: self.created_at,
        }
    }
}

/// Compact view of one planning for browsing
#[derive(Debug, Clone, Serialize)]
pub struct PlanningSummary {
    pub id: String,
    pub title: String,
    pub status: PlanningStatus,
    pub option_count: usize,
    pub participants: usize,
    pub created_at: i64,
}

impl PlanningSummary {
    /// One-line description prefixed by its position in a list
    pub fn short_description(&self, num: usize) -> String {
        format!("*{}*. *{}* - _{}_", num + 1, self.title, self.status)
    }
}
