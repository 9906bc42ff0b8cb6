use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use task_core::error::AppError;
use task_core::task_api::parse_task_id;

#[derive(Parser, Debug)]
#[command(name = "task-tracker", author, version, about = "Track tasks in a local file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: task-tracker add Buy groceries
    Add {
        #[arg(value_name = "DESCRIPTION", trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// List all tasks or only those with a status (todo, in-progress, done)
    ///
    /// Example: task-tracker list
    /// Example: task-tracker list done
    List {
        #[arg(value_name = "STATUS")]
        status: Option<String>,
    },
    /// Update a task's description
    ///
    /// Example: task-tracker update 1 Buy milk and bread
    Update {
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
        #[arg(value_name = "DESCRIPTION", trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Delete a task
    ///
    /// Example: task-tracker delete 1
    Delete {
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
    },
    /// Mark a task as in progress
    ///
    /// Example: task-tracker mark-in-progress 1
    MarkInProgress {
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
    },
    /// Mark a task as done
    ///
    /// Example: task-tracker mark-done 1
    MarkDone {
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
    },
}

/// Lowercases the command word so `ADD` and `Mark-Done` dispatch like their
/// lowercase forms. Flags and the arguments after the command are left alone.
pub fn normalize_command_case<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if let Some(command) = args.get_mut(1)
        && let Some(text) = command.to_str()
        && !text.starts_with('-')
    {
        *command = OsString::from(text.to_lowercase());
    }
    args
}

/// Parses a positional id, telling a missing id apart from a non-numeric one.
pub fn require_id(raw: Option<&str>) -> Result<u32, AppError> {
    let raw = raw.ok_or_else(|| AppError::validation("Please provide a task ID."))?;
    parse_task_id(raw)
}

/// Joins description words with single spaces.
pub fn require_description(words: &[String], missing: &str) -> Result<String, AppError> {
    let description = words.join(" ");
    if description.trim().is_empty() {
        return Err(AppError::validation(missing));
    }
    Ok(description)
}

/// Name of the subcommand clap did not recognize, if that is what failed.
pub fn unknown_command(err: &clap::Error) -> Option<String> {
    if err.kind() != ErrorKind::InvalidSubcommand {
        return None;
    }

    match err.get(ContextKind::InvalidSubcommand) {
        Some(ContextValue::String(name)) => Some(name.clone()),
        _ => Some(String::new()),
    }
}

pub fn normalize_parse_error(err: &clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::validation(message)
}
