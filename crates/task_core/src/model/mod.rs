mod task;
pub mod timestamp;

pub use task::{Task, TaskRecord, TaskStatus};
pub use timestamp::Timestamp;
