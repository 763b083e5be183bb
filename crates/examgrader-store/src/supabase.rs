//! Supabase (PostgREST) submission store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tracing::instrument;

use examgrader_core::error::StoreError;
use examgrader_core::model::{StoredSubmission, Submission, SubmissionFilter};
use examgrader_core::traits::SubmissionStore;

use crate::row::{from_row, to_row};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Submission store backed by a Supabase table through its REST API.
pub struct SupabaseStore {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    /// `url` is the project URL, e.g. `https://<project>.supabase.co`.
    pub fn new(url: &str, api_key: &str, table: &str) -> Result<Self, StoreError> {
        if url.trim().is_empty() || api_key.trim().is_empty() {
            return Err(StoreError::Connection(
                "store url and api key are required".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: format!("{}/rest/v1/{}", url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn fetch(&self, params: Vec<(&str, String)>) -> Result<Vec<StoredSubmission>, StoreError> {
        let request = self.authorized(self.client.get(&self.endpoint)).query(&params);
        let rows = send(request).await?;
        rows.iter().map(from_row).collect()
    }
}

/// Escape `LIKE` metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

async fn send(request: reqwest::RequestBuilder) -> Result<Vec<Map<String, Value>>, StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.text().await.unwrap_or_default();
        return Err(StoreError::Http { status, message });
    }

    response
        .json::<Vec<Map<String, Value>>>()
        .await
        .map_err(|e| StoreError::MalformedRow(format!("failed to parse response: {e}")))
}

#[async_trait]
impl SubmissionStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    #[instrument(skip(self, submission), fields(student_id = %submission.student_id))]
    async fn insert(&self, submission: &Submission) -> Result<StoredSubmission, StoreError> {
        let request = self
            .authorized(self.client.post(&self.endpoint))
            .header("Prefer", "return=representation")
            .json(&[to_row(submission)]);

        let rows = send(request).await?;
        let stored = rows.first().map(from_row).ok_or(StoreError::EmptyInsert)??;
        tracing::info!(id = %stored.id, "stored submission");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn query(&self, filter: &SubmissionFilter) -> Result<Vec<StoredSubmission>, StoreError> {
        let mut params = vec![("select", "*".to_string())];
        if let Some(term) = &filter.student_id_contains {
            params.push(("student_id", format!("ilike.*{}*", escape_like(term))));
        }
        if let Some(after) = filter.created_after {
            params.push((
                "created_at",
                format!("gte.{}", after.to_rfc3339_opts(SecondsFormat::Micros, true)),
            ));
        }
        params.push(("order", "created_at.desc".to_string()));
        if let Some(limit) = filter.limit {
            params.push(("limit", limit.to_string()));
        }
        let mut rows = self.fetch(params).await?;
        // PostgREST always reads `*` as a wildcard, so a literal one is rechecked here.
        if filter.student_id_contains.as_ref().is_some_and(|t| t.contains('*')) {
            rows.retain(|row| filter.matches(&row.record));
        }
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn query_by_student(
        &self,
        student_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredSubmission>, StoreError> {
        self.fetch(vec![
            ("select", "*".to_string()),
            ("student_id", format!("eq.{student_id}")),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use examgrader_core::model::Verdict;

    fn sample() -> Submission {
        Submission {
            student_id: "10130".into(),
            answers: vec!["faster".into(), "inverse".into()],
            feedbacks: vec![Verdict::pass("Good."), Verdict::fail("State the law.")],
            model: "gpt-5-mini".into(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap(),
        }
    }

    fn stored_row(id: u64, student_id: &str) -> Value {
        let mut row = to_row(&Submission {
            student_id: student_id.into(),
            ..sample()
        });
        row.insert("id".into(), json!(id));
        Value::Object(row)
    }

    #[tokio::test]
    async fn insert_returns_representation() {
        let server = MockServer::start().await;
        let submission = sample();

        Mock::given(method("POST"))
            .and(path("/rest/v1/student_submissions"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .and(header("Prefer", "return=representation"))
            .and(body_partial_json(json!([{"student_id": "10130", "feedback_2": "X: State the law."}])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([stored_row(1, "10130")])))
            .expect(1)
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "anon-key", "student_submissions").unwrap();
        let stored = store.insert(&submission).await.unwrap();
        assert_eq!(stored.id, "1");
        assert_eq!(stored.record, submission);
    }

    #[tokio::test]
    async fn insert_with_empty_representation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/student_submissions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "key", "student_submissions").unwrap();
        let err = store.insert(&sample()).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyInsert));
    }

    #[tokio::test]
    async fn query_sends_postgrest_filters() {
        let server = MockServer::start().await;
        let after = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

        Mock::given(method("GET"))
            .and(path("/rest/v1/student_submissions"))
            .and(query_param("select", "*"))
            .and(query_param("student_id", "ilike.*101*"))
            .and(query_param("created_at", "gte.2025-03-01T00:00:00.000000Z"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "50"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([stored_row(2, "10102"), stored_row(1, "10101")])),
            )
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "key", "student_submissions").unwrap();
        let filter = SubmissionFilter {
            student_id_contains: Some("101".into()),
            created_after: Some(after),
            limit: Some(50),
        };
        let rows = store.query(&filter).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "2");
        assert_eq!(rows[1].record.student_id, "10101");
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("101"), "101");
        assert_eq!(escape_like("a_b%c"), "a\\_b\\%c");
        assert_eq!(escape_like("x\\y"), "x\\\\y");
    }

    #[tokio::test]
    async fn search_terms_match_literally() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/student_submissions"))
            .and(query_param("student_id", "ilike.*s\\_1*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored_row(1, "s_10")])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/student_submissions"))
            .and(query_param("student_id", "ilike.*a*b*"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([stored_row(2, "a*b1"), stored_row(1, "axb2")])),
            )
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "key", "student_submissions").unwrap();
        let underscore = SubmissionFilter::default().with_search(Some("s_1"));
        let rows = store.query(&underscore).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.student_id, "s_10");

        let star = SubmissionFilter::default().with_search(Some("a*b"));
        let rows = store.query(&star).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.student_id, "a*b1");
    }

    #[tokio::test]
    async fn created_after_keeps_fractional_seconds() {
        let server = MockServer::start().await;
        let after = Utc.with_ymd_and_hms(2025, 3, 1, 8, 15, 30).unwrap()
            + chrono::Duration::microseconds(250_000);

        Mock::given(method("GET"))
            .and(path("/rest/v1/student_submissions"))
            .and(query_param("created_at", "gte.2025-03-01T08:15:30.250000Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "key", "student_submissions").unwrap();
        let filter = SubmissionFilter {
            created_after: Some(after),
            ..SubmissionFilter::default()
        };
        assert!(store.query(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_by_student_uses_exact_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/answers"))
            .and(query_param("student_id", "eq.10130"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored_row(9, "10130")])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&format!("{}/", server.uri()), "key", "answers").unwrap();
        let rows = store.query_by_student("10130", 5).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record, sample());
    }

    #[tokio::test]
    async fn http_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/student_submissions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "bad", "student_submissions").unwrap();
        let err = store.query(&SubmissionFilter::default()).await.unwrap_err();
        match err {
            StoreError::Http { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_rows_are_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/student_submissions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&server.uri(), "key", "student_submissions").unwrap();
        let err = store.query(&SubmissionFilter::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow(_)));
    }

    #[test]
    fn requires_url_and_key() {
        assert!(SupabaseStore::new("", "key", "t").is_err());
        assert!(SupabaseStore::new("https://x.supabase.co", " ", "t").is_err());
    }

    #[tokio::test]
    async fn unreachable_store() {
        let store = SupabaseStore::new("http://127.0.0.1:1", "key", "t").unwrap();
        let err = store.query(&SubmissionFilter::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
