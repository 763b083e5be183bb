//! The `examgrader validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examgrader_core::parser::{parse_exam, validate_exam};

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let exam = parse_exam(&exam_path)?;
    println!("Exam: {} ({} questions)", exam.title, exam.question_count());

    let warnings = validate_exam(&exam);
    for w in &warnings {
        let prefix = w
            .question
            .map(|q| format!("  [Q{q}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Exam is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
