//! In-memory store
//!
//! For tests and ephemeral sessions. `fail_writes` turns every save into an
//! error, which is how the rollback path gets exercised.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{Planning, VoteLedger};

use super::{PersistError, PlanningStore};

#[derive(Default)]
pub struct MemoryStore {
    plannings: Mutex<HashMap<String, (Planning, VoteLedger)>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail (or stop failing).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of plannings currently stored.
    pub fn len(&self) -> usize {
        self.plannings.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlanningStore for MemoryStore {
    fn save(&self, planning: &Planning, ledger: &VoteLedger) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError("injected write failure".to_string()));
        }
        let mut map = self
            .plannings
            .lock()
            .map_err(|_| PersistError("memory store poisoned".to_string()))?;
        map.insert(planning.id.clone(), (planning.clone(), ledger.clone()));
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(Planning, VoteLedger)>, PersistError> {
        let map = self
            .plannings
            .lock()
            .map_err(|_| PersistError("memory store poisoned".to_string()))?;
        Ok(map.values().cloned().collect())
    }
}
