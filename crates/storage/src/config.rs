#![forbid(unsafe_code)]

use crate::StoreError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_UNDO_DEPTH: usize = 1000;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_DB_FILE: &str = "treelog_undo.db";

pub const ENV_DB_URL: &str = "TREELOG_DB_URL";
pub const ENV_TREE_ID: &str = "TREELOG_TREE_ID";
pub const ENV_USER_ID: &str = "TREELOG_USER_ID";
pub const ENV_MAX_UNDO: &str = "TREELOG_MAX_UNDO";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoLogConfig {
    pub location: DbLocation,
    /// Tree the history belongs to; history queries are scoped to it.
    pub tree_id: Option<i64>,
    pub user_id: Option<String>,
    /// Reattach to an existing connection row instead of creating a new one.
    pub resume_connection: Option<i64>,
    pub busy_timeout: Duration,
    pub max_undo_depth: usize,
}

impl UndoLogConfig {
    pub fn new(location: DbLocation) -> Self {
        Self {
            location,
            tree_id: None,
            user_id: None,
            resume_connection: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(DbLocation::File(path.into()))
    }

    pub fn memory() -> Self {
        Self::new(DbLocation::Memory)
    }

    pub fn with_tree_id(mut self, tree_id: Option<i64>) -> Self {
        self.tree_id = tree_id;
        self
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_resume_connection(mut self, connection_id: Option<i64>) -> Self {
        self.resume_connection = connection_id;
        self
    }

    pub fn with_max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = depth;
        self
    }

    /// Accepts `sqlite:///relative.db`, `sqlite:////abs/path.db`, `sqlite://`,
    /// `:memory:` or a plain file path.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::InvalidInput("database url must not be empty"));
        }
        let location = match url.split_once("://") {
            Some(("sqlite", rest)) => {
                let path = rest.strip_prefix('/').unwrap_or(rest);
                if path.is_empty() || path == ":memory:" {
                    DbLocation::Memory
                } else {
                    DbLocation::File(PathBuf::from(path))
                }
            }
            Some(_) => return Err(StoreError::InvalidInput("unsupported database url scheme")),
            None if url == ":memory:" => DbLocation::Memory,
            None => DbLocation::File(PathBuf::from(url)),
        };
        Ok(Self::new(location))
    }

    pub fn from_env() -> Result<Self, StoreError> {
        Self::resolve(&ConfigOverrides::default(), env_var)
    }

    /// Builds a config from explicit values, consulting `lookup` for a
    /// `TREELOG_*` variable only when the matching value is absent.
    pub fn resolve(
        overrides: &ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        let mut config = match &overrides.db_url {
            Some(url) => Self::from_url(url)?,
            None => Self::from_url(
                &lookup(ENV_DB_URL).unwrap_or_else(|| DEFAULT_DB_FILE.to_string()),
            )?,
        };
        config.tree_id = match overrides.tree_id {
            Some(tree_id) => Some(tree_id),
            None => parse_i64(lookup(ENV_TREE_ID), "TREELOG_TREE_ID must be an integer")?,
        };
        config.user_id = match &overrides.user_id {
            Some(user_id) => Some(user_id.clone()),
            None => lookup(ENV_USER_ID).filter(|value| !value.trim().is_empty()),
        };
        config.max_undo_depth = match overrides.max_undo_depth {
            Some(depth) => depth,
            None => match parse_i64(lookup(ENV_MAX_UNDO), "TREELOG_MAX_UNDO must be an integer")? {
                Some(depth) => usize::try_from(depth).map_err(|_| {
                    StoreError::InvalidInput("TREELOG_MAX_UNDO must not be negative")
                })?,
                None => DEFAULT_MAX_UNDO_DEPTH,
            },
        };
        Ok(config)
    }
}

/// Values given explicitly, e.g. on the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub db_url: Option<String>,
    pub tree_id: Option<i64>,
    pub user_id: Option<String>,
    pub max_undo_depth: Option<usize>,
}

pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_i64(raw: Option<String>, message: &'static str) -> Result<Option<i64>, StoreError> {
    match raw {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StoreError::InvalidInput(message)),
        None => Ok(None),
    }
}
