//! The `examgrader submit` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Color, Table};

use examgrader_core::collector::collect;
use examgrader_core::engine::{GradingEngine, GradingOutcome};
use examgrader_core::model::Exam;
use examgrader_core::parser::parse_exam;

use super::open_store;

pub struct SubmitArgs {
    pub exam: PathBuf,
    pub student_id: String,
    pub answers: Vec<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub no_save: bool,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: SubmitArgs) -> Result<()> {
    let exam = parse_exam(&args.exam)?;
    let draft = collect(&args.student_id, &args.answers, exam.question_count())?;

    let config = examgrader_providers::config::load_config_from(args.config.as_deref())?;
    // The store is resolved before any grading call is made.
    let store = if args.no_save {
        None
    } else {
        Some(open_store(&config)?)
    };

    let provider = config.provider(args.provider.as_deref())?;
    let engine = GradingEngine::new(
        Arc::from(provider),
        Arc::new(exam.rubric()),
        config.engine_config(args.model.as_deref()),
    );

    eprintln!(
        "Grading {} answer(s) for {} with {}...",
        draft.answers.len(),
        draft.student_id,
        engine.config().model
    );
    let outcome = engine.grade(&draft).await?;
    print_verdicts(&exam, &outcome);

    if let Some(store) = store {
        let stored = store.insert(&outcome.submission).await?;
        println!("Saved submission {} to {}.", stored.id, store.name());
    } else {
        println!("Not saved (--no-save).");
    }

    Ok(())
}

fn print_verdicts(exam: &Exam, outcome: &GradingOutcome) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Result", "Feedback"]);

    for (i, verdict) in outcome.submission.feedbacks.iter().enumerate() {
        let prompt = exam
            .questions
            .get(i)
            .map(|q| q.prompt.as_str())
            .unwrap_or_default();
        let result = if verdict.outcome.is_pass() {
            Cell::new("O").fg(Color::Green)
        } else {
            Cell::new("X").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(prompt),
            result,
            Cell::new(&verdict.message),
        ]);
    }

    println!("{table}");
    println!(
        "Passed {}/{} | {} tokens | {}ms",
        outcome.submission.passed_count(),
        outcome.submission.feedbacks.len(),
        outcome.token_usage.total_tokens,
        outcome.duration_ms
    );
    for failure in &outcome.remote_failures {
        eprintln!(
            "  WARNING: question {} could not be graded: {}",
            failure.question, failure.error
        );
    }
}
