//! Persisted client session.
//!
//! The dashboard keeps one flag, `argus::authentication`, in a small JSON
//! key/value file. The access gate reads it through the [`Session`] trait so
//! tests and the TUI can inject their own store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Key of the persisted login flag.
pub const AUTH_KEY: &str = "argus::authentication";

/// Failures reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The file exists but could not be read.
    #[error("Failed to read session file at {path}: {source}")]
    Read {
        /// Session file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a JSON object of strings.
    #[error("Session file at {path} is not a JSON object of strings: {reason}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The file or its directory could not be written.
    #[error("Failed to write session file at {path}: {source}")]
    Write {
        /// Session file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Session capability handed to the access gate.
pub trait Session {
    /// True only when the flag is stored as the string `"true"`.
    fn is_authenticated(&self) -> bool;

    /// Store or clear the login flag.
    ///
    /// # Errors
    ///
    /// Fails when the backing store cannot be written.
    fn set_authenticated(&mut self, authenticated: bool) -> Result<(), SessionError>;
}

/// Session backed by a JSON file, loaded eagerly and written through.
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSession {
    /// Load the session file. A missing file is an empty session.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                values: BTreeMap::new(),
            });
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| SessionError::Read {
            path: path.clone(),
            source,
        })?;
        let values = serde_json::from_str(&contents).map_err(|e| SessionError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { path, values })
    }

    /// File this session is persisted to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SessionError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(&self.values).map_err(|e| {
            SessionError::Write {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            }
        })?;
        std::fs::write(&self.path, contents).map_err(|source| SessionError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl Session for FileSession {
    fn is_authenticated(&self) -> bool {
        self.values.get(AUTH_KEY).is_some_and(|v| v == "true")
    }

    fn set_authenticated(&mut self, authenticated: bool) -> Result<(), SessionError> {
        if authenticated {
            self.values.insert(AUTH_KEY.to_string(), "true".to_string());
        } else {
            self.values.remove(AUTH_KEY);
        }
        debug!(path = ?self.path, authenticated, "Persisting session flag");
        self.persist()
    }
}

/// In-memory session for tests and ephemeral runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySession {
    authenticated: bool,
}

impl MemorySession {
    /// Session starting with the given login flag.
    pub fn new(authenticated: bool) -> Self {
        Self { authenticated }
    }
}

impl Session for MemorySession {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn set_authenticated(&mut self, authenticated: bool) -> Result<(), SessionError> {
        self.authenticated = authenticated;
        Ok(())
    }
}
