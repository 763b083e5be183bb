//! examgrader CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examgrader", version, about = "LLM-graded short-answer exams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one student's answers and store the result
    Submit {
        /// Path to the exam .toml file
        #[arg(long)]
        exam: PathBuf,

        /// Student identifier
        #[arg(long)]
        student_id: String,

        /// Answer text, one per question, in order
        #[arg(long = "answer", num_args = 1)]
        answers: Vec<String>,

        /// Grading model (defaults to `default_model` from the config)
        #[arg(long)]
        model: Option<String>,

        /// Provider name from the config (defaults to `default_provider`)
        #[arg(long)]
        provider: Option<String>,

        /// Grade only; do not store the submission
        #[arg(long)]
        no_save: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show stored submissions with summary statistics
    Dashboard {
        /// Case-insensitive student id substring
        #[arg(long)]
        search: Option<String>,

        /// Only submissions from the last N days (0 = all)
        #[arg(long, default_value = "30")]
        days: u32,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show one student's submissions with full feedback
    History {
        /// Exact student identifier
        #[arg(long)]
        student_id: String,

        /// Max submissions to show
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export stored submissions to CSV or JSON
    Export {
        /// Case-insensitive student id substring
        #[arg(long)]
        search: Option<String>,

        /// Only submissions from the last N days (0 = all)
        #[arg(long, default_value = "30")]
        days: u32,

        /// Output file (defaults to student_submissions_<timestamp>.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: csv, json
        #[arg(long, default_value = "csv")]
        format: String,

        /// Exam file; its questions set the minimum CSV column count
        #[arg(long)]
        exam: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate an exam TOML file
    Validate {
        /// Path to the exam .toml file
        #[arg(long)]
        exam: PathBuf,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example exam
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("examgrader=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Submit {
            exam,
            student_id,
            answers,
            model,
            provider,
            no_save,
            config,
        } => {
            commands::submit::execute(commands::submit::SubmitArgs {
                exam,
                student_id,
                answers,
                model,
                provider,
                no_save,
                config,
            })
            .await
        }
        Commands::Dashboard {
            search,
            days,
            config,
        } => commands::dashboard::execute(search, days, config).await,
        Commands::History {
            student_id,
            limit,
            config,
        } => commands::history::execute(student_id, limit, config).await,
        Commands::Export {
            search,
            days,
            output,
            format,
            exam,
            config,
        } => commands::export::execute(search, days, output, format, exam, config).await,
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
