//! Error types for profile operations.
//!
//! Every core operation returns [`Result`]. The variants follow the way the
//! CLI has to react to them:
//! - validation errors are reported and nothing is attempted,
//! - conflicts (name taken, path exists, not found) may be resolved by the caller,
//! - I/O failures and invariant violations abort the operation.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{0}")]
    Validation(String),

    #[error("The name '{0}' is already taken")]
    NameTaken(String),

    #[error("The path '{}' already exists", .0.display())]
    PathExists(PathBuf),

    #[error("There is no profile named '{0}'")]
    NotFound(String),

    #[error("Failed to {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Invariant(String),

    #[error("Record database '{}' is unusable: {reason}", path.display())]
    Store { path: PathBuf, reason: String },

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl ProfileError {
    /// Conflicts are the errors a caller can resolve by asking the user.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::NameTaken(_) | Self::PathExists(_) | Self::NotFound(_)
        )
    }

    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Attach the attempted action and path to a raw `io::Result`.
pub trait IoContext<T> {
    fn at(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, action: &'static str, path: &Path) -> Result<T> {
        self.map_err(|e| ProfileError::io(action, path, e))
    }
}
