use tabled::settings::Style;
use tabled::{Table, Tabled};
use task_core::error::AppError;
use task_core::model::timestamp::format_timestamp;
use task_core::model::{Task, TaskStatus};
use task_core::task_api::TaskListing;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

impl TaskRow {
    fn from_task(task: &Task) -> Result<Self, AppError> {
        Ok(Self {
            id: task.id(),
            description: task.description().to_string(),
            status: task.status().label().to_string(),
            created_at: format_timestamp(task.created_at())?,
            updated_at: format_timestamp(task.updated_at())?,
        })
    }
}

/// Listing for `list`, in the order given. An empty store reads the same
/// with or without a filter.
pub fn render_tasks(listing: &TaskListing, filter: Option<TaskStatus>) -> Result<String, AppError> {
    if listing.tasks.is_empty() {
        return Ok(match filter {
            Some(status) if listing.total > 0 => {
                format!("No tasks found with status: {}", status.label())
            }
            _ => "No tasks found.".to_string(),
        });
    }

    let rows = listing
        .tasks
        .iter()
        .map(TaskRow::from_task)
        .collect::<Result<Vec<_>, AppError>>()?;
    Ok(Table::new(rows).with(Style::psql()).to_string())
}

pub fn task_summary(task: &Task) -> String {
    format!("[{}] {}", task.id(), task.description())
}
