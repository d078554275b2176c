//! Dante Todo CLI Module
//! Command-line interface for the todo demo

pub mod formatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::collection::Collection;
use super::error::Result;
use crate::criteria;

#[derive(Parser, Debug)]
#[command(name = "dante-todo")]
#[command(author = "Dante Team")]
#[command(version)]
#[command(about = "A tiny todo list stored with Dante", long_about = None)]
pub struct Cli {
    /// Database file (defaults to ~/.dante/todo.db)
    #[arg(short, long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all todos
    List,

    /// Add a todo
    Add {
        /// Todo text
        todo: String,
    },

    /// Remove a todo
    Remove {
        /// Todo text
        todo: String,
    },

    /// Mark a todo as done
    Done {
        /// Todo text
        todo: String,
    },

    /// Mark a todo as not done
    Undone {
        /// Todo text
        todo: String,
    },
}

impl Cli {
    pub fn get_db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".dante")
                .join("todo.db")
        })
    }
}

/// A todo as printed by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoLine {
    pub text: String,
    pub done: bool,
}

/// Apply a command to the todo collection.
///
/// Returns the todos for `list` and the number of affected rows otherwise.
pub fn run(todos: &Collection, command: &Commands) -> Result<Outcome> {
    let outcome = match command {
        Commands::List => {
            let lines = todos
                .all()?
                .into_iter()
                .map(|todo| TodoLine {
                    text: todo
                        .get("text")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    done: todo.get("done").and_then(|v| v.as_bool()).unwrap_or(false),
                })
                .collect();
            Outcome::Listed(lines)
        }
        Commands::Add { todo } => {
            let mut doc = crate::Document::new();
            doc.insert("text".into(), todo.as_str().into());
            doc.insert("done".into(), false.into());
            todos.insert(&doc)?;
            Outcome::Changed(1)
        }
        Commands::Remove { todo } => {
            Outcome::Changed(todos.delete(&criteria! { "text" => todo.as_str() })?)
        }
        Commands::Done { todo } => Outcome::Changed(mark(todos, todo, true)?),
        Commands::Undone { todo } => Outcome::Changed(mark(todos, todo, false)?),
    };
    Ok(outcome)
}

fn mark(todos: &Collection, todo: &str, done: bool) -> Result<usize> {
    let mut fields = crate::Document::new();
    fields.insert("done".into(), done.into());
    todos.set(&fields, &criteria! { "text" => todo })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Listed(Vec<TodoLine>),
    Changed(usize),
}
