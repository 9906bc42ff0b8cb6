use crate::codec::{self, Decoded};
use crate::config::Config;
use crate::error::AppError;
use crate::model::Task;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const HIGH_WATER_EXTENSION: &str = "seq";
const TEMP_SUFFIX: &str = ".tmp";

/// Owns the task file and its id high-water mark.
///
/// The whole collection is rewritten on every save. There is no locking: two
/// invocations saving at the same time race, and the last rename wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.store_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All readable tasks in file order. A missing file is an empty store.
    pub fn load_all(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.load_report()?.tasks)
    }

    pub fn load_report(&self) -> Result<Decoded, AppError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "task file missing, starting empty");
                return Ok(Decoded::default());
            }
            Err(err) => return Err(io_failure("read", &self.path, err)),
        };

        let decoded = codec::decode(&String::from_utf8_lossy(&bytes));
        debug!(
            path = %self.path.display(),
            tasks = decoded.tasks.len(),
            dropped = decoded.dropped.len(),
            "loaded tasks"
        );
        Ok(decoded)
    }

    pub fn save_all(&self, tasks: &[Task]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| io_failure("create directory", parent, err))?;
        }

        let content = codec::encode(tasks)?;

        // Mark first: it may run ahead of the task file, never behind it.
        let highest = highest_id(tasks);
        if highest > self.high_water_mark() {
            write_atomic(&self.high_water_path(), &highest.to_string())?;
        }

        write_atomic(&self.path, &content)?;

        debug!(path = %self.path.display(), tasks = tasks.len(), "saved tasks");
        Ok(())
    }

    /// Next id to hand out: one past the highest id ever issued, so ids of
    /// deleted tasks are never reused.
    pub fn next_id(&self, tasks: &[Task]) -> Result<u32, AppError> {
        highest_id(tasks)
            .max(self.high_water_mark())
            .checked_add(1)
            .ok_or_else(|| AppError::validation("no task ids left to assign"))
    }

    fn high_water_path(&self) -> PathBuf {
        self.path.with_extension(HIGH_WATER_EXTENSION)
    }

    fn high_water_mark(&self) -> u32 {
        let path = self.high_water_path();
        match fs::read_to_string(&path) {
            Ok(content) => content.trim().parse::<u32>().unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring unreadable id high-water mark");
                0
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable id high-water mark");
                0
            }
        }
    }
}

fn highest_id(tasks: &[Task]) -> u32 {
    tasks.iter().map(Task::id).max().unwrap_or(0)
}

fn write_atomic(path: &Path, content: &str) -> Result<(), AppError> {
    let temp_path = temp_path_for(path);
    let result = write_then_rename(&temp_path, path, content);
    if result.is_err() {
        fs::remove_file(&temp_path).ok();
    }
    result
}

fn write_then_rename(temp_path: &Path, path: &Path, content: &str) -> Result<(), AppError> {
    let mut file = fs::File::create(temp_path).map_err(|err| io_failure("create", temp_path, err))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|err| io_failure("set permissions on", temp_path, err))?;
    }

    file.write_all(content.as_bytes())
        .map_err(|err| io_failure("write", temp_path, err))?;
    file.sync_all()
        .map_err(|err| io_failure("sync", temp_path, err))?;
    drop(file);

    fs::rename(temp_path, path).map_err(|err| io_failure("replace", path, err))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn io_failure(action: &str, path: &Path, err: std::io::Error) -> AppError {
    warn!(path = %path.display(), error = %err, "failed to {action}");
    AppError::io(format!("failed to {action} {}: {err}", path.display()))
}
