//! Voter identity

use serde::{Deserialize, Serialize};

/// A participant as the transport layer identifies them.
///
/// Identity is the `id` alone; the display name is carried for tally
/// rendering and may change between sessions without affecting votes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    /// Stable identifier supplied by the transport
    pub id: String,

    /// Name shown in tallies
    pub display_name: String,
}

impl Voter {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

impl PartialEq for Voter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Voter {}

impl std::hash::Hash for Voter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Voter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name)
    }
}
