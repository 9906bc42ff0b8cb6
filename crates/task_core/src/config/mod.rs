use std::path::PathBuf;

const STORE_PATH_ENV_VAR: &str = "TASK_TRACKER_STORE_PATH";
const LOG_ENV_VAR: &str = "TASK_TRACKER_LOG";
const DATA_DIR_NAME: &str = "data";
const STORE_FILE_NAME: &str = "tasks.json";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Per-invocation settings. There is no configuration file; everything comes
/// from the environment and falls back to fixed defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_path: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(STORE_PATH_ENV_VAR)
            && !path.trim().is_empty()
        {
            config.store_path = PathBuf::from(path);
        }

        if let Some(filter) = lookup(LOG_ENV_VAR)
            && !filter.trim().is_empty()
        {
            config.log_filter = filter.trim().to_string();
        }

        config
    }
}

pub fn default_store_path() -> PathBuf {
    PathBuf::from(DATA_DIR_NAME).join(STORE_FILE_NAME)
}
