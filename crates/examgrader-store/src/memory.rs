//! In-process submission store.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use examgrader_core::error::StoreError;
use examgrader_core::model::{StoredSubmission, Submission, SubmissionFilter};
use examgrader_core::traits::SubmissionStore;

/// A process-local store with the same filter and ordering semantics as
/// the remote one. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredSubmission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored submissions.
    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(
        &self,
        keep: impl Fn(&Submission) -> bool,
        limit: Option<usize>,
    ) -> Result<Vec<StoredSubmission>, StoreError> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".into()))?;

        let mut selected: Vec<StoredSubmission> =
            rows.iter().filter(|s| keep(&s.record)).cloned().collect();
        // Newest first; insertion order breaks ties, latest insert first.
        selected.reverse();
        selected.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        if let Some(limit) = limit {
            selected.truncate(limit);
        }
        Ok(selected)
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, submission: &Submission) -> Result<StoredSubmission, StoreError> {
        let stored = StoredSubmission {
            id: Uuid::new_v4().to_string(),
            record: submission.clone(),
        };
        self.rows
            .lock()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".into()))?
            .push(stored.clone());
        tracing::info!(id = %stored.id, student_id = %submission.student_id, "stored submission");
        Ok(stored)
    }

    async fn query(&self, filter: &SubmissionFilter) -> Result<Vec<StoredSubmission>, StoreError> {
        self.select(|s| filter.matches(s), filter.limit)
    }

    async fn query_by_student(
        &self,
        student_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredSubmission>, StoreError> {
        self.select(|s| s.student_id == student_id, Some(limit))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use examgrader_core::model::Verdict;

    fn submission(student_id: &str, day: u32) -> Submission {
        Submission {
            student_id: student_id.into(),
            answers: vec!["a".into(), "b".into(), "c".into()],
            feedbacks: vec![Verdict::pass("ok"), Verdict::fail("no"), Verdict::pass("ok")],
            model: "gpt-5-mini".into(),
            created_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_unique_ids() {
        let store = MemoryStore::new();
        let a = store.insert(&submission("10101", 1)).await.unwrap();
        let b = store.insert(&submission("10101", 1)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn read_back_equals_inserted() {
        let store = MemoryStore::new();
        let original = submission("10130", 4);
        store.insert(&original).await.unwrap();

        let rows = store.query_by_student("10130", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record, original);
    }

    #[tokio::test]
    async fn query_orders_newest_first_and_limits() {
        let store = MemoryStore::new();
        for (student, day) in [("10101", 1), ("10102", 3), ("10103", 2)] {
            store.insert(&submission(student, day)).await.unwrap();
        }

        let rows = store.query(&SubmissionFilter::default()).await.unwrap();
        let students: Vec<&str> = rows.iter().map(|r| r.record.student_id.as_str()).collect();
        assert_eq!(students, vec!["10102", "10103", "10101"]);

        let rows = store
            .query(&SubmissionFilter::default().with_limit(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.student_id, "10102");
    }

    #[tokio::test]
    async fn search_and_date_filters_combine() {
        let store = MemoryStore::new();
        store.insert(&submission("A-10101", 1)).await.unwrap();
        store.insert(&submission("a-10102", 5)).await.unwrap();
        store.insert(&submission("B-10103", 5)).await.unwrap();

        let filter = SubmissionFilter {
            student_id_contains: Some("a-".into()),
            created_after: Some(Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap()),
            limit: None,
        };
        let rows = store.query(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.student_id, "a-10102");
    }

    #[tokio::test]
    async fn recent_days_excludes_old_rows() {
        let store = MemoryStore::new();
        let mut old = submission("10101", 1);
        old.created_at = Utc::now() - Duration::days(40);
        let mut fresh = submission("10102", 1);
        fresh.created_at = Utc::now() - Duration::days(2);
        store.insert(&old).await.unwrap();
        store.insert(&fresh).await.unwrap();

        let rows = store.query(&SubmissionFilter::recent_days(30)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.student_id, "10102");

        let rows = store.query(&SubmissionFilter::recent_days(0)).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn student_history_is_exact_match() {
        let store = MemoryStore::new();
        store.insert(&submission("10130", 1)).await.unwrap();
        store.insert(&submission("101300", 2)).await.unwrap();
        store.insert(&submission("10130", 3)).await.unwrap();

        let rows = store.query_by_student("10130", 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].record.created_at > rows[1].record.created_at);
        assert!(store.query_by_student("10130", 1).await.unwrap().len() == 1);
        assert!(store.query_by_student("nobody", 10).await.unwrap().is_empty());
    }
}
