use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use crate::storage::TaskStore;
use tracing::info;

pub fn add_task(store: &TaskStore, description: &str) -> Result<Task, AppError> {
    let mut tasks = store.load_all()?;
    let id = store.next_id(&tasks)?;
    let task = Task::create(i64::from(id), description)?;

    tasks.push(task.clone());
    store.save_all(&tasks)?;
    info!(id = task.id(), "added task");

    Ok(task)
}

/// Tasks matching a filter, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListing {
    pub tasks: Vec<Task>,
    /// Tasks in the store before filtering.
    pub total: usize,
}

pub fn list_tasks(store: &TaskStore, filter: Option<TaskStatus>) -> Result<TaskListing, AppError> {
    let tasks = store.load_all()?;
    let total = tasks.len();
    Ok(TaskListing {
        tasks: tasks.into_iter().filter(|task| task.matches(filter)).collect(),
        total,
    })
}

pub fn update_task(store: &TaskStore, id: u32, description: &str) -> Result<Task, AppError> {
    let mut tasks = store.load_all()?;
    let updated = {
        let task = find_task_mut(&mut tasks, id)?;
        task.set_description(description)?;
        task.clone()
    };

    store.save_all(&tasks)?;
    info!(id, "updated task description");

    Ok(updated)
}

pub fn delete_task(store: &TaskStore, id: u32) -> Result<Task, AppError> {
    let mut tasks = store.load_all()?;
    let index = tasks
        .iter()
        .position(|task| task.id() == id)
        .ok_or_else(|| not_found(id))?;

    let removed = tasks.remove(index);
    store.save_all(&tasks)?;
    info!(id, "deleted task");

    Ok(removed)
}

pub fn mark_task(store: &TaskStore, id: u32, status: TaskStatus) -> Result<Task, AppError> {
    let mut tasks = store.load_all()?;
    let updated = {
        let task = find_task_mut(&mut tasks, id)?;
        task.set_status(status);
        task.clone()
    };

    store.save_all(&tasks)?;
    info!(id, status = status.name(), "changed task status");

    Ok(updated)
}

pub fn parse_task_id(raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| AppError::parse("Invalid task ID. Please provide a numeric ID."))
}

pub fn parse_status_filter(raw: &str) -> Result<TaskStatus, AppError> {
    raw.parse()
}

fn find_task_mut(tasks: &mut [Task], id: u32) -> Result<&mut Task, AppError> {
    tasks
        .iter_mut()
        .find(|task| task.id() == id)
        .ok_or_else(|| not_found(id))
}

fn not_found(id: u32) -> AppError {
    AppError::not_found(format!("Task not found with ID: {id}"))
}
