//! Dante Todo - demo binary
//!
//! Keeps a todo list in a Dante collection.

use anyhow::Context;
use clap::Parser;
use dante::engine::cli::formatter::{plural, CliFormatter};
use dante::engine::cli::{run, Cli, Commands, Outcome};
use dante::Dante;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        CliFormatter::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.get_db_path();
    let db = Dante::open(&db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    let todos = db.collection("todos")?;

    match (run(&todos, &cli.command)?, &cli.command) {
        (Outcome::Listed(lines), _) => {
            CliFormatter::header(&format!("Todos ({})", plural(lines.len(), "item")));
            for (i, line) in lines.iter().enumerate() {
                CliFormatter::todo(i + 1, line);
            }
        }
        (Outcome::Changed(_), Commands::Add { todo }) => {
            CliFormatter::success(&format!("Added \"{}\"", todo))
        }
        (Outcome::Changed(0), _) => CliFormatter::warning("No matching todo"),
        (Outcome::Changed(n), Commands::Remove { .. }) => {
            CliFormatter::success(&format!("Removed {}", plural(n, "todo")))
        }
        (Outcome::Changed(n), _) => {
            CliFormatter::success(&format!("Updated {}", plural(n, "todo")))
        }
    }

    db.close()?;
    Ok(())
}
