pub mod dashboard;
pub mod export;
pub mod history;
pub mod init;
pub mod list_models;
pub mod submit;
pub mod validate;

use anyhow::{Context, Result};

use examgrader_core::model::Submission;
use examgrader_core::traits::SubmissionStore;
use examgrader_providers::{ExamgraderConfig, StoreConfig};
use examgrader_store::SupabaseStore;

/// Open the configured submission store.
pub fn open_store(config: &ExamgraderConfig) -> Result<Box<dyn SubmissionStore>> {
    let store = config.store.as_ref().context(
        "no submission store configured; add a [store] section to examgrader.toml \
         or set EXAMGRADER_SUPABASE_URL and EXAMGRADER_SUPABASE_KEY",
    )?;
    match store {
        StoreConfig::Supabase {
            url,
            api_key,
            table,
        } => Ok(Box::new(SupabaseStore::new(url, api_key, table)?)),
    }
}

/// `"2/3"`-style pass count for one submission.
pub fn passed_label(submission: &Submission) -> String {
    format!(
        "{}/{}",
        submission.passed_count(),
        submission.answers.len().max(submission.feedbacks.len())
    )
}
