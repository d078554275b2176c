//! CLI Output Formatting Module
//! Provides consistent, colorized output for the todo demo

use colored::Colorize;

use super::TodoLine;

pub struct CliFormatter;

impl CliFormatter {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print a section header
    pub fn header(title: &str) {
        println!("\n{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(title.chars().count()).bright_black());
    }

    /// Print a numbered todo
    pub fn todo(num: usize, line: &TodoLine) {
        println!("  {}. {}", num.to_string().bright_white().bold(), todo_text(line));
    }
}

/// Todo text with a done marker, uncolored
pub fn todo_text(line: &TodoLine) -> String {
    if line.done {
        format!("{} (done)", line.text)
    } else {
        line.text.clone()
    }
}

/// "1 todo" / "3 todos"
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
