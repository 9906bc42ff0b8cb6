use crate::error::AppError;
use crate::model::timestamp::{self, Timestamp, format_timestamp, parse_timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serialized field set of one task, in file key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i64,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Name used in the task file.
    pub fn name(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }

    /// Name used on the command line and in listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Exact match against the file name of a status.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.name() == name)
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| AppError::validation(format!("unrecognized status: {}", raw.trim())))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: u32,
    description: String,
    status: TaskStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Task {
    /// New task in `Todo` with both timestamps set to now.
    pub fn create(id: i64, description: &str) -> Result<Self, AppError> {
        let id = validate_id(id)?;
        let description = validate_description(description)?;
        let now = timestamp::now();

        Ok(Self {
            id,
            description,
            status: TaskStatus::Todo,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a stored task. Values are kept as given; nothing is refreshed.
    pub fn reconstruct(
        id: i64,
        description: String,
        status: TaskStatus,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Result<Self, AppError> {
        let id = validate_id(id)?;
        if description.trim().is_empty() {
            return Err(AppError::validation("Description cannot be empty"));
        }
        if updated_at < created_at {
            return Err(AppError::validation("updatedAt precedes createdAt"));
        }

        Ok(Self {
            id,
            description,
            status,
            created_at,
            updated_at,
        })
    }

    pub fn from_record(record: TaskRecord) -> Result<Self, AppError> {
        let created_at = parse_timestamp(&record.created_at)?;
        let updated_at = parse_timestamp(&record.updated_at)?;

        Self::reconstruct(
            record.id,
            record.description,
            record.status,
            created_at,
            updated_at,
        )
        .map_err(|err| AppError::invalid_data(err.message()))
    }

    pub fn to_record(&self) -> Result<TaskRecord, AppError> {
        Ok(TaskRecord {
            id: i64::from(self.id),
            description: self.description.clone(),
            status: self.status,
            created_at: format_timestamp(self.created_at)?,
            updated_at: format_timestamp(self.updated_at)?,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn set_description(&mut self, text: &str) -> Result<(), AppError> {
        self.description = validate_description(text)?;
        self.touch();
        Ok(())
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.touch();
    }

    pub fn matches(&self, filter: Option<TaskStatus>) -> bool {
        filter.is_none_or(|status| self.status == status)
    }

    // A clock that went backwards must not break updated_at >= created_at.
    fn touch(&mut self) {
        self.updated_at = timestamp::now().max(self.created_at);
    }
}

fn validate_id(id: i64) -> Result<u32, AppError> {
    if id < 0 {
        return Err(AppError::validation("ID cannot be negative"));
    }
    u32::try_from(id).map_err(|_| AppError::validation(format!("ID {id} is out of range")))
}

fn validate_description(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Description cannot be empty"));
    }
    Ok(trimmed.to_string())
}
