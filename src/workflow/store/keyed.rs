//! Keyed in-memory store for many concurrent workflow instances.
//!
//! Each instance id maps to its own locked record. A handle returned by
//! [`KeyedStore::instance`] implements [`StateStore`] for exactly one id,
//! so one orchestrator per request can be built over a shared store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::debug;

use super::{StateStore, StoreError};
use crate::workflow::state::WorkflowState;

type Record = Arc<Mutex<WorkflowState>>;

/// A map of workflow instance id to state, with per-instance locking.
#[derive(Debug, Default, Clone)]
pub struct KeyedStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
}

impl KeyedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a store handle bound to `id`.
    ///
    /// The record is created lazily in the initial state.
    pub fn instance(&self, id: impl Into<String>) -> InstanceStore {
        InstanceStore {
            id: id.into(),
            records: Arc::clone(&self.records),
        }
    }

    /// Ids of every instance that has a record.
    pub fn instances(&self) -> Result<Vec<String>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<String> = records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Drops the record for `id`. Returns true if one existed.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        Ok(records.remove(id).is_some())
    }
}

/// [`StateStore`] view of a single instance inside a [`KeyedStore`].
#[derive(Debug, Clone)]
pub struct InstanceStore {
    id: String,
    records: Arc<RwLock<HashMap<String, Record>>>,
}

impl InstanceStore {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn record(&self) -> Result<Record, StoreError> {
        {
            let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
            if let Some(record) = records.get(&self.id) {
                return Ok(Arc::clone(record));
            }
        }

        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        let record = records.entry(self.id.clone()).or_insert_with(|| {
            debug!("Creating workflow instance '{}'", self.id);
            Arc::new(Mutex::new(WorkflowState::default()))
        });
        Ok(Arc::clone(record))
    }
}

impl StateStore for InstanceStore {
    fn load(&self) -> Result<WorkflowState, StoreError> {
        let record = self.record()?;
        let state = record.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state.clone())
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let record = self.record()?;
        let mut stored = record.lock().map_err(|_| StoreError::Poisoned)?;
        *stored = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StageResult;
    use std::thread;

    #[test]
    fn test_instances_are_isolated() {
        let store = KeyedStore::new();
        let alice = store.instance("alice");
        let bob = store.instance("bob");
        assert_eq!(alice.id(), "alice");
        assert_eq!(bob.id(), "bob");

        alice
            .save(&WorkflowState::at(1, Some(StageResult::encode(&"a").unwrap())))
            .unwrap();

        assert_eq!(alice.load().unwrap().current_stage, 1);
        assert!(bob.load().unwrap().is_initial());
    }

    #[test]
    fn test_handles_share_records() {
        let store = KeyedStore::new();
        store.instance("job").save(&WorkflowState::at(2, None)).unwrap();

        assert_eq!(store.instance("job").load().unwrap().current_stage, 2);
        assert_eq!(store.instances().unwrap(), vec!["job".to_string()]);
    }

    #[test]
    fn test_remove_instance() {
        let store = KeyedStore::new();
        let job = store.instance("job");
        job.save(&WorkflowState::at(1, None)).unwrap();

        assert!(store.remove("job").unwrap());
        assert!(!store.remove("job").unwrap());
        assert!(job.load().unwrap().is_initial());
    }

    #[test]
    fn test_concurrent_instances() {
        let store = KeyedStore::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let instance = store.instance(format!("job-{}", i));
                thread::spawn(move || {
                    instance.save(&WorkflowState::at(i, None)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.instances().unwrap().len(), 8);
        assert_eq!(store.instance("job-5").load().unwrap().current_stage, 5);
    }
}
