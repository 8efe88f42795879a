//! Resource ledger.
//!
//! Ordered record of everything a scenario created, plus the outputs steps
//! hand to each other. Insertion order is creation order; teardown walks it
//! backwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::gateway::ResourceRef;

/// What teardown does with a recorded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionAction {
    /// Delete the remote object
    Delete,
    /// Delete the remote object, then remove its local backing directory
    DeleteWithHostPath(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub reference: ResourceRef,
    pub action: DeletionAction,
}

#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    outputs: BTreeMap<String, Value>,
    observed: Vec<ResourceRef>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns `false` if `reference` is already recorded,
    /// in which case the ledger is unchanged.
    pub fn record(&mut self, reference: ResourceRef, action: DeletionAction) -> bool {
        if self.contains(&reference) {
            return false;
        }
        self.entries.push(LedgerEntry { reference, action });
        true
    }

    /// Drop the entry for `reference`, if any.
    pub fn forget(&mut self, reference: &ResourceRef) -> Option<LedgerEntry> {
        let index = self.entries.iter().position(|e| &e.reference == reference)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, reference: &ResourceRef) -> bool {
        self.entries.iter().any(|e| &e.reference == reference)
    }

    /// Entries in creation order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entries in the order teardown must visit them.
    pub fn teardown_order(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_output(&mut self, key: impl Into<String>, value: Value) {
        self.outputs.insert(key.into(), value);
    }

    pub fn get_output(&self, key: &str) -> Option<&Value> {
        self.outputs.get(key)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    /// Remember a resource the scenario did not create but wants to inspect
    /// (for example a controller-spawned pod). Never torn down.
    pub fn observe(&mut self, reference: ResourceRef) {
        if !self.observed.contains(&reference) {
            self.observed.push(reference);
        }
    }

    pub fn observed(&self) -> &[ResourceRef] {
        &self.observed
    }

    /// Local directories recorded through [`DeletionAction::DeleteWithHostPath`].
    pub fn host_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().filter_map(|e| match &e.action {
            DeletionAction::DeleteWithHostPath(path) => Some(path.as_path()),
            DeletionAction::Delete => None,
        })
    }
}
