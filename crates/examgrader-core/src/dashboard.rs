//! Read path for the teacher dashboard.
//!
//! Store failures never escape this module: a failed read yields an empty
//! snapshot carrying a diagnostic, so "nothing matched" and "could not read"
//! are both renderable states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{StoredSubmission, SubmissionFilter};
use crate::statistics::{summarize, DashboardStats};
use crate::traits::SubmissionStore;

/// A point-in-time read of the store. Not refreshed; fetch again for new data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Matching submissions, newest first.
    pub submissions: Vec<StoredSubmission>,
    /// Why the snapshot is empty, if the read failed.
    pub diagnostic: Option<String>,
    /// When the read was made.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    /// Whether the read itself succeeded.
    pub fn is_ok(&self) -> bool {
        self.diagnostic.is_none()
    }

    /// Summary statistics over this snapshot.
    pub fn stats(&self, question_count: usize) -> DashboardStats {
        summarize(self.submissions.iter().map(|s| &s.record), question_count)
    }

    fn from_result(
        result: Result<Vec<StoredSubmission>, crate::error::StoreError>,
        store: &str,
    ) -> Self {
        let (submissions, diagnostic) = match result {
            Ok(submissions) => (submissions, None),
            Err(e) => {
                tracing::error!(store, "failed to read submissions: {e}");
                (Vec::new(), Some(e.to_string()))
            }
        };
        Self {
            submissions,
            diagnostic,
            fetched_at: Utc::now(),
        }
    }
}

/// Read a filtered snapshot.
pub async fn fetch_snapshot(store: &dyn SubmissionStore, filter: &SubmissionFilter) -> Snapshot {
    Snapshot::from_result(store.query(filter).await, store.name())
}

/// Read one student's history.
pub async fn fetch_history(store: &dyn SubmissionStore, student_id: &str, limit: usize) -> Snapshot {
    Snapshot::from_result(
        store.query_by_student(student_id.trim(), limit).await,
        store.name(),
    )
}
