//! Mnemo CLI - runs agentic-memory evaluations from a settings file.
//!
//! Provides a `mnemo` command that loads a YAML settings file, builds the
//! configured chat client and fast learner, and runs the listed evaluation
//! scenarios, writing results to a page-structured log.

use clap::Parser;
use mnemo_eval::Evaluator;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Mnemo - fast-learner evaluation harness
#[derive(Parser, Debug)]
#[command(
    name = "mnemo",
    author,
    version,
    about = "Mnemo - agentic-memory evaluation harness",
    long_about = "Runs scripted evaluation scenarios against a configured fast learner,\ngrading responses with a secondary model call and reporting success rates."
)]
struct Args {
    /// Path to the YAML settings file
    settings: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Anything other than exactly one settings file is a usage request,
    // not an error.
    let [settings] = args.settings.as_slice() else {
        println!("Usage: mnemo <SETTINGS>\n\nProvide a YAML settings file to run an evaluation.");
        return Ok(());
    };

    Evaluator::new().run(settings).await?;
    Ok(())
}
