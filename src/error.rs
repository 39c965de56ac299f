//! Error types for repository generation.
//!
//! Every variant here is fatal: the run stops at the first one, leaves already
//! published files in place, and the binary exits non-zero. Candidates that do
//! not resolve to a type are *not* errors; discovery records them in
//! [`Discovery::unresolved`](crate::discovery::Discovery::unresolved).

use std::io;
use std::path::{Path, PathBuf};

/// Fatal failure raised by discovery, rendering or publishing.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The template identifier resolves to neither an override stub nor a
    /// built-in template.
    #[error("template `{name}` not found")]
    TemplateNotFound {
        /// Identifier that was requested (e.g. `repository-interface`)
        name: String,
    },

    /// A candidate declares the expected type but its declaration cannot be
    /// understood, or its supertype chain is corrupt.
    #[error("cannot resolve type `{fqn}` in {}: {reason}", path.display())]
    TypeResolution {
        /// Fully-qualified name of the candidate
        fqn: String,
        /// Source file declaring it
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Directory creation, delete, read or write failed.
    #[error("{action} {}: {source}", path.display())]
    Filesystem {
        /// Short verb describing the operation (`write`, `create directory`, ...)
        action: &'static str,
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The source-root manifest (`composer.json`) is missing or malformed.
    #[error("invalid source-root manifest {}: {reason}", path.display())]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Parse or shape problem
        reason: String,
    },

    /// The tool configuration file could not be parsed.
    #[error("invalid configuration {}: {reason}", path.display())]
    Config {
        /// Configuration file path
        path: PathBuf,
        /// Parse problem
        reason: String,
    },
}

impl GenerateError {
    pub(crate) fn fs(action: &'static str, path: &Path, source: io::Error) -> Self {
        GenerateError::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn type_resolution(
        fqn: impl Into<String>,
        path: &Path,
        reason: impl Into<String>,
    ) -> Self {
        GenerateError::TypeResolution {
            fqn: fqn.into(),
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, GenerateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_error_message_names_path_and_action() {
        let err = GenerateError::fs(
            "write",
            Path::new("/tmp/app/Repositories/UserRepositoryInterface.php"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("write /tmp/app/Repositories/UserRepositoryInterface.php"));
        assert!(msg.ends_with("denied"));
    }

    #[test]
    fn test_template_not_found_message() {
        let err = GenerateError::TemplateNotFound {
            name: "missing".into(),
        };
        assert_eq!(err.to_string(), "template `missing` not found");
    }
}
