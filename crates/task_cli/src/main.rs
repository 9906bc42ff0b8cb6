use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::IsTerminal;
use task_cli::cli::{
    Cli, Command, normalize_command_case, normalize_parse_error, require_description, require_id,
    unknown_command,
};
use task_cli::render::{render_tasks, task_summary};
use task_core::config::Config;
use task_core::error::AppError;
use task_core::model::TaskStatus;
use task_core::storage::TaskStore;
use task_core::task_api;
use tracing_subscriber::EnvFilter;

const USAGE_EXIT_CODE: i32 = 2;

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(store: &TaskStore, command: Command) -> Result<(), AppError> {
    tracing::debug!(?command, path = %store.path().display(), "running command");

    match command {
        Command::Add { words } => {
            let description = require_description(&words, "Please provide a task description.")?;
            let task = task_api::add_task(store, &description)?;
            println!("Task added: {}", task_summary(&task));
        }
        Command::List { status } => {
            let filter = status
                .as_deref()
                .map(task_api::parse_status_filter)
                .transpose()?;
            let listing = task_api::list_tasks(store, filter)?;
            println!("{}", render_tasks(&listing, filter)?);
        }
        Command::Update { id, words } => {
            let id = require_id(id.as_deref())?;
            let description =
                require_description(&words, "Please provide a task ID and new description.")?;
            let task = task_api::update_task(store, id, &description)?;
            println!("Task updated: {}", task_summary(&task));
        }
        Command::Delete { id } => {
            let id = require_id(id.as_deref())?;
            let task = task_api::delete_task(store, id)?;
            println!("Task deleted: {}", task_summary(&task));
        }
        Command::MarkInProgress { id } => {
            let id = require_id(id.as_deref())?;
            let task = task_api::mark_task(store, id, TaskStatus::InProgress)?;
            println!("Task marked as in-progress: {}", task_summary(&task));
        }
        Command::MarkDone { id } => {
            let id = require_id(id.as_deref())?;
            let task = task_api::mark_task(store, id, TaskStatus::Done)?;
            println!("Task marked as done: {}", task_summary(&task));
        }
    }

    Ok(())
}

fn main() {
    let config = Config::from_env();
    init_tracing(&config.log_filter);

    let cli = match Cli::try_parse_from(normalize_command_case(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            if let Some(name) = unknown_command(&err) {
                println!("Unknown command: {name}");
                print_help();
            } else {
                eprintln!("ERROR: {}", normalize_parse_error(&err));
            }
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    let Some(command) = cli.command else {
        print_help();
        return;
    };

    let store = TaskStore::from_config(&config);
    if let Err(err) = run_command(&store, command) {
        eprintln!("ERROR: {}", err);
        std::process::exit(err.exit_code());
    }
}
