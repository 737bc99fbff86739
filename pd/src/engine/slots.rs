//! Per-planning mutation slots
//!
//! The concurrency controller: at most one mutation per planning is in
//! flight at any instant, while unrelated plannings proceed fully in
//! parallel. Each planning gets one cell for its lifetime; the cell's async
//! mutex over the planning's mutable state is the mutation slot.
//!
//! Acquisition is bounded: a caller that cannot take the slot within the
//! configured wait gets `EngineError::Busy` instead of queueing forever.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::timeout;

use crate::domain::{Planning, VoteLedger};

use super::error::EngineError;

/// Mutable state guarded by a planning's mutation slot
#[derive(Debug)]
pub(crate) struct PlanningState {
    pub planning: Planning,
    pub ledger: VoteLedger,
}

/// One registered planning: the slot plus the state it guards
pub(crate) struct PlanningCell {
    slot: Mutex<PlanningState>,
}

impl PlanningCell {
    pub fn new(planning: Planning, ledger: VoteLedger) -> Self {
        Self {
            slot: Mutex::new(PlanningState { planning, ledger }),
        }
    }

    /// Take the mutation slot, waiting at most `wait`.
    pub async fn acquire(
        &self,
        wait: Duration,
        planning_id: &str,
    ) -> Result<MutexGuard<'_, PlanningState>, EngineError> {
        timeout(wait, self.slot.lock())
            .await
            .map_err(|_| EngineError::Busy(planning_id.to_string()))
    }
}

/// Registry of cells, keyed by planning id. The map lock is held only for
/// lookup and insertion, never across a slot acquisition.
#[derive(Default)]
pub(crate) struct SlotMap {
    cells: RwLock<HashMap<String, Arc<PlanningCell>>>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, planning_id: String, cell: PlanningCell) {
        self.cells.write().await.insert(planning_id, Arc::new(cell));
    }

    pub async fn get(&self, planning_id: &str) -> Option<Arc<PlanningCell>> {
        self.cells.read().await.get(planning_id).cloned()
    }

    pub async fn ids(&self) -> Vec<String> {
        self.cells.read().await.keys().cloned().collect()
    }

    pub async fn all(&self) -> Vec<(String, Arc<PlanningCell>)> {
        self.cells
            .read()
            .await
            .iter()
            .map(|(id, cell)| (id.clone(), cell.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.cells.read().await.len()
    }
}
