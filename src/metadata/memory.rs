//! An in-memory [`MetadataRepository`], used in tests and for one-shot runs
//! that don't need durable history.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::DqResult;
use crate::metadata::repository::{MetadataRepository, RunId, RunRecord};
use crate::state::State;

#[derive(Default)]
pub struct InMemoryMetadataRepository {
    runs: RefCell<HashMap<String, Vec<RunRecord>>>,
}

impl InMemoryMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataRepository for InMemoryMetadataRepository {
    fn save_run(&self, record: &RunRecord) -> DqResult<()> {
        self.runs
            .borrow_mut()
            .entry(record.dataset.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn latest_states(&self, dataset: &str) -> DqResult<Vec<State>> {
        Ok(self
            .runs
            .borrow()
            .get(dataset)
            .and_then(|runs| runs.last())
            .map(|run| run.states.clone())
            .unwrap_or_default())
    }

    fn run_history(&self, dataset: &str) -> DqResult<Vec<RunId>> {
        Ok(self
            .runs
            .borrow()
            .get(dataset)
            .map(|runs| runs.iter().map(|r| r.run_id.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckStatus;

    #[test]
    fn latest_states_reflects_most_recent_run() {
        let repo = InMemoryMetadataRepository::new();
        let first = RunRecord {
            run_id: RunId::new(),
            dataset: "orders".to_string(),
            status: CheckStatus::Success,
            checks: vec![],
            metrics: vec![],
            states: vec![],
        };
        repo.save_run(&first).unwrap();
        assert_eq!(repo.run_history("orders").unwrap().len(), 1);
    }
}
