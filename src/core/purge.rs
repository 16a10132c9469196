//! Deletion of every record belonging to a library.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::adapters::{ApiError, LibraryPurger};
use crate::domain::RecordSet;

/// Purge failures
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("library key must not be empty")]
    EmptyLibraryKey,

    #[error("failed to delete {set} records: {source}")]
    Delete {
        set: RecordSet,
        #[source]
        source: ApiError,
    },
}

/// Rows removed per record set, in deletion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub library_key: String,
    pub deleted: Vec<(RecordSet, usize)>,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.deleted.iter().map(|(_, n)| n).sum()
    }

    /// Rows removed for one record set
    pub fn deleted_in(&self, set: RecordSet) -> usize {
        self.deleted
            .iter()
            .find(|(s, _)| *s == set)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Delete the library with `library_key` and everything that depends on it.
///
/// Record sets are removed in [`RecordSet::PURGE_ORDER`], package last.
/// Each delete is independent; a failure stops the purge and leaves the
/// earlier deletes in place.
#[instrument(skip(purger))]
pub async fn delete_library(
    purger: &dyn LibraryPurger,
    library_key: &str,
) -> Result<PurgeReport, PurgeError> {
    if library_key.trim().is_empty() {
        return Err(PurgeError::EmptyLibraryKey);
    }

    info!("Deleting library with id {}", library_key);

    let mut report = PurgeReport {
        library_key: library_key.to_string(),
        deleted: Vec::with_capacity(RecordSet::PURGE_ORDER.len()),
    };
    for set in RecordSet::PURGE_ORDER {
        let rows = purger
            .delete_records(set, library_key)
            .await
            .map_err(|source| PurgeError::Delete { set, source })?;
        info!(record_set = %set, rows, "Deleted records");
        report.deleted.push((set, rows));
    }

    info!(total = report.total(), "Deleted library {}", library_key);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Purger that records calls and optionally fails on one set
    #[derive(Default)]
    struct RecordingPurger {
        calls: Mutex<Vec<(RecordSet, String)>>,
        fail_on: Option<RecordSet>,
    }

    #[async_trait]
    impl LibraryPurger for RecordingPurger {
        async fn delete_records(&self, set: RecordSet, library_key: &str) -> Result<usize, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((set, library_key.to_string()));
            if self.fail_on == Some(set) {
                return Err(ApiError::InvalidInput("boom".to_string()));
            }
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_deletes_in_dependency_order() {
        let purger = RecordingPurger::default();

        let report = delete_library(&purger, "lib:org:slug").await.unwrap();

        let calls = purger.calls.lock().unwrap();
        let sets: Vec<RecordSet> = calls.iter().map(|(s, _)| *s).collect();
        assert_eq!(sets, RecordSet::PURGE_ORDER.to_vec());
        assert!(calls.iter().all(|(_, key)| key == "lib:org:slug"));
        assert_eq!(report.total(), 5);
    }

    #[tokio::test]
    async fn test_empty_key_fails_before_any_delete() {
        let purger = RecordingPurger::default();

        for key in ["", "   "] {
            let result = delete_library(&purger, key).await;
            assert!(matches!(result, Err(PurgeError::EmptyLibraryKey)));
        }
        assert!(purger.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_deletes() {
        let purger = RecordingPurger {
            fail_on: Some(RecordSet::OrphanedEntityLists),
            ..Default::default()
        };

        let result = delete_library(&purger, "lib:org:slug").await;
        assert!(matches!(
            result,
            Err(PurgeError::Delete {
                set: RecordSet::OrphanedEntityLists,
                ..
            })
        ));
        // Package is never touched
        assert_eq!(purger.calls.lock().unwrap().len(), 3);
    }
}
