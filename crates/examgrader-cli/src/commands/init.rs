//! The `examgrader init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_once(Path::new("examgrader.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("exams").context("failed to create exams directory")?;
    write_once(Path::new("exams/example.toml"), EXAMPLE_EXAM)?;

    println!("\nNext steps:");
    println!("  1. Edit examgrader.toml with your API keys and Supabase project");
    println!("  2. Run: examgrader validate --exam exams/example.toml");
    println!(
        "  3. Run: examgrader submit --exam exams/example.toml --student-id 10101 \
         --answer \"...\" --answer \"...\" --answer \"...\""
    );
    println!("  4. Run: examgrader dashboard");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examgrader configuration

default_provider = "openai"
default_model = "gpt-5-mini"
max_retries = 1
request_timeout_secs = 120
parallelism = 3
max_tokens = 1000

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[store]
type = "supabase"
url = "${SUPABASE_URL}"
api_key = "${SUPABASE_KEY}"
table = "student_submissions"
"#;

const EXAMPLE_EXAM: &str = r#"[exam]
id = "gases"
title = "Gases and heat"
description = "Answer each question in one or two sentences."

[[questions]]
prompt = "Describe how the motion of gas particles changes as temperature rises."
criterion = "Particles move faster at higher temperature (more kinetic energy) and collide more often and more strongly."

[[questions]]
prompt = "State Boyle's law."
criterion = "At constant temperature, the pressure of a fixed amount of gas is inversely proportional to its volume."

[[questions]]
prompt = "Name and explain the three ways heat is transferred."
criterion = "Conduction (direct contact between particles), convection (movement of fluid), and radiation (electromagnetic waves, no medium needed)."
"#;
