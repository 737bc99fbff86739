//! Planning engine core
//!
//! The aggregate root: owns the registry of plannings, applies every
//! mutation under the planning's mutation slot, persists before publishing,
//! and renders snapshots for the transport layer.
//!
//! The engine is an explicit object constructed from what the store holds -
//! never ambient global state. Handles are cheap clones; pass them to every
//! task that needs one.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{Planning, PlanningStatus, PlanningSummary, Snapshot, VoteDelta, VoteLedger, Voter};
use crate::persist::PlanningStore;

use super::error::{EngineError, EngineResult};
use super::slots::{PlanningCell, SlotMap};

/// Engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounded wait for a planning's mutation slot, in milliseconds
    #[serde(rename = "slot-timeout-ms")]
    pub slot_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { slot_timeout_ms: 2_000 }
    }
}

impl EngineConfig {
    pub fn slot_timeout(&self) -> Duration {
        Duration::from_millis(self.slot_timeout_ms)
    }
}

/// Handle to the planning engine. Cloneable; all clones share one registry.
#[derive(Clone)]
pub struct PlanningEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    store: Arc<dyn PlanningStore>,
    slots: SlotMap,
}

impl PlanningEngine {
    /// Engine over an empty registry (fresh store).
    pub fn new(store: Arc<dyn PlanningStore>, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                store,
                slots: SlotMap::new(),
            }),
        }
    }

    /// Engine over everything the store holds. Called once at process start.
    pub async fn load(store: Arc<dyn PlanningStore>, config: EngineConfig) -> EngineResult<Self> {
        let engine = Self::new(store.clone(), config);
        let restored = store
            .load_all()
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        let count = restored.len();
        for (planning, ledger) in restored {
            let id = planning.id.clone();
            engine.inner.slots.insert(id, PlanningCell::new(planning, ledger)).await;
        }

        info!(plannings = count, "registry loaded");
        Ok(engine)
    }

    /// Create a planning with its full option set in one atomic step.
    ///
    /// Fails with `EmptyOptionSet` or `DuplicateLabel` before anything is
    /// registered or written.
    pub async fn create(
        &self,
        scope: &str,
        title: &str,
        creator: Voter,
        labels: Vec<String>,
        single_select: bool,
    ) -> EngineResult<Snapshot> {
        validate_labels(&labels)?;

        let planning = Planning::new(scope, title, creator, labels, single_select);
        let ledger = VoteLedger::new();

        self.inner
            .store
            .save(&planning, &ledger)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        let snapshot = Snapshot::capture(&planning, &ledger);
        info!(planning = %planning.id, scope = %planning.scope, "planning created");
        let id = planning.id.clone();
        self.inner.slots.insert(id, PlanningCell::new(planning, ledger)).await;

        Ok(snapshot)
    }

    /// Toggle one (option, voter) vote: create it if absent, retract it if
    /// present. Under single-select, adding swaps out the voter's prior
    /// vote in the same step.
    ///
    /// The whole check-then-act runs under the planning's mutation slot,
    /// and the new ledger is published only after the durable write
    /// succeeded - on `Persistence` the in-memory state is untouched.
    pub async fn toggle(
        &self,
        planning_id: &str,
        option_id: u32,
        voter: &Voter,
    ) -> EngineResult<(VoteDelta, Snapshot)> {
        let cell = self.cell(planning_id).await?;
        let mut state = cell.acquire(self.inner.config.slot_timeout(), planning_id).await?;

        if state.planning.status == PlanningStatus::Closed {
            return Err(EngineError::PlanningClosed(planning_id.to_string()));
        }
        if state.planning.option(option_id).is_none() {
            return Err(EngineError::UnknownOption {
                planning: planning_id.to_string(),
                option: option_id,
            });
        }

        // Apply to a scratch copy; publish only once the write is durable.
        let mut ledger = state.ledger.clone();
        let delta = ledger.toggle(option_id, voter, state.planning.single_select);

        if let Err(e) = self.inner.store.save(&state.planning, &ledger) {
            warn!(planning = %planning_id, error = %e, "save failed, vote rolled back");
            return Err(EngineError::Persistence(e.to_string()));
        }
        state.ledger = ledger;

        debug!(
            planning = %planning_id,
            option = option_id,
            voter = %voter.id,
            ?delta,
            "vote toggled"
        );
        Ok((delta, Snapshot::capture(&state.planning, &state.ledger)))
    }

    /// Close a planning. Only its creator may; closing an already-closed
    /// planning succeeds without touching `closed_at`.
    pub async fn close(&self, planning_id: &str, requester_id: &str) -> EngineResult<Snapshot> {
        let cell = self.cell(planning_id).await?;
        let mut state = cell.acquire(self.inner.config.slot_timeout(), planning_id).await?;

        if state.planning.creator.id != requester_id {
            return Err(EngineError::NotAuthorized(planning_id.to_string()));
        }
        if state.planning.status == PlanningStatus::Closed {
            debug!(planning = %planning_id, "close repeated, no-op");
            return Ok(Snapshot::capture(&state.planning, &state.ledger));
        }

        let mut planning = state.planning.clone();
        planning.close();

        if let Err(e) = self.inner.store.save(&planning, &state.ledger) {
            warn!(planning = %planning_id, error = %e, "save failed, close rolled back");
            return Err(EngineError::Persistence(e.to_string()));
        }
        state.planning = planning;

        info!(planning = %planning_id, "planning closed");
        Ok(Snapshot::capture(&state.planning, &state.ledger))
    }

    /// Point-in-time snapshot. Taken under the slot, so a snapshot
    /// requested right after a mutation observes that mutation.
    pub async fn snapshot(&self, planning_id: &str) -> EngineResult<Snapshot> {
        let cell = self.cell(planning_id).await?;
        let state = cell.acquire(self.inner.config.slot_timeout(), planning_id).await?;
        Ok(Snapshot::capture(&state.planning, &state.ledger))
    }

    /// Plannings visible in a scope, most recent first.
    pub async fn list(&self, scope: &str) -> EngineResult<Vec<PlanningSummary>> {
        let mut summaries = Vec::new();
        for (id, cell) in self.inner.slots.all().await {
            let state = cell.acquire(self.inner.config.slot_timeout(), &id).await?;
            if state.planning.scope == scope {
                summaries.push(state.planning.summary(state.ledger.participants()));
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    /// All registered planning ids (transports use this for reference
    /// resolution).
    pub async fn planning_ids(&self) -> Vec<String> {
        self.inner.slots.ids().await
    }

    /// Number of registered plannings.
    pub async fn planning_count(&self) -> usize {
        self.inner.slots.len().await
    }

    async fn cell(&self, planning_id: &str) -> EngineResult<Arc<PlanningCell>> {
        self.inner
            .slots
            .get(planning_id)
            .await
            .ok_or_else(|| EngineError::NotFound(planning_id.to_string()))
    }
}

fn validate_labels(labels: &[String]) -> EngineResult<()> {
    if labels.is_empty() {
        return Err(EngineError::EmptyOptionSet);
    }
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(EngineError::DuplicateLabel(label.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;

    fn engine() -> PlanningEngine {
        PlanningEngine::new(Arc::new(MemoryStore::new()), EngineConfig::default())
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_and_snapshot() {
        let engine = engine();
        let snapshot = engine
            .create("room-1", "Party day", Voter::new("alice", "Alice"), labels(&["Mon", "Thu"]), false)
            .await
            .unwrap();

        assert_eq!(snapshot.options.len(), 2);
        assert_eq!(snapshot.participants, 0);

        let again = engine.snapshot(&snapshot.planning_id).await.unwrap();
        assert_eq!(again.title, "Party day");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_option_set() {
        let engine = engine();
        let err = engine
            .create("room-1", "Empty", Voter::new("alice", "Alice"), vec![], false)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::EmptyOptionSet);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_labels() {
        let engine = engine();
        let err = engine
            .create("room-1", "Dup", Voter::new("alice", "Alice"), labels(&["Mon", "Mon"]), false)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::DuplicateLabel("Mon".to_string()));
    }

    #[tokio::test]
    async fn test_toggle_unknown_planning_and_option() {
        let engine = engine();
        let voter = Voter::new("bob", "Bob");

        let err = engine.toggle("missing", 1, &voter).await.unwrap_err();
        assert_eq!(err, EngineError::NotFound("missing".to_string()));

        let snapshot = engine
            .create("room-1", "Party day", Voter::new("alice", "Alice"), labels(&["Mon"]), false)
            .await
            .unwrap();
        let err = engine.toggle(&snapshot.planning_id, 7, &voter).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownOption {
                planning: snapshot.planning_id,
                option: 7
            }
        );
    }

    #[tokio::test]
    async fn test_single_select_switch_reported() {
        let engine = engine();
        let snapshot = engine
            .create("room-1", "Pick one", Voter::new("alice", "Alice"), labels(&["A", "B"]), true)
            .await
            .unwrap();
        let bob = Voter::new("bob", "Bob");

        let (delta, _) = engine.toggle(&snapshot.planning_id, 1, &bob).await.unwrap();
        assert_eq!(delta, VoteDelta::Added);

        let (delta, snapshot) = engine.toggle(&snapshot.planning_id, 2, &bob).await.unwrap();
        assert_eq!(delta, VoteDelta::Switched { from: 1 });
        assert!(snapshot.voter_ids(1).is_empty());
        assert_eq!(snapshot.voter_ids(2), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_list_filters_scope_newest_first() {
        let engine = engine();
        let alice = Voter::new("alice", "Alice");

        engine.create("room-1", "First", alice.clone(), labels(&["A"]), false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        engine.create("room-1", "Second", alice.clone(), labels(&["A"]), false).await.unwrap();
        engine.create("room-2", "Elsewhere", alice, labels(&["A"]), false).await.unwrap();

        let summaries = engine.list("room-1").await.unwrap();
        let titles: Vec<&str> = summaries.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_validate_labels_order_of_checks() {
        assert_eq!(validate_labels(&[]), Err(EngineError::EmptyOptionSet));
        assert!(validate_labels(&labels(&["A", "B"])).is_ok());
    }
}
