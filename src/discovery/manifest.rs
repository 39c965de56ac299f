//! Source-root registrations from `composer.json`.
//!
//! Only `autoload.psr-4` is read. Each entry maps a namespace prefix to one
//! directory or a list of directories; registration order is the key order of
//! the JSON object, then the order inside a list.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{GenerateError, Result};

/// One `(namespace prefix, directory)` registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    /// Namespace prefix, e.g. `App\`
    pub prefix: String,
    /// Absolute (project-joined) directory
    pub dir: PathBuf,
}

/// Read the registrations from a manifest file.
pub fn read_source_roots(manifest_path: &Path, project_root: &Path) -> Result<Vec<SourceRoot>> {
    let contents = std::fs::read_to_string(manifest_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GenerateError::Manifest {
                path: manifest_path.to_path_buf(),
                reason: "file not found".to_string(),
            }
        } else {
            GenerateError::fs("read", manifest_path, e)
        }
    })?;
    parse_source_roots(&contents, manifest_path, project_root)
}

/// Parse manifest text into registrations, resolving directories against
/// `project_root`.
pub fn parse_source_roots(
    contents: &str,
    manifest_path: &Path,
    project_root: &Path,
) -> Result<Vec<SourceRoot>> {
    let invalid = |reason: String| GenerateError::Manifest {
        path: manifest_path.to_path_buf(),
        reason,
    };

    let manifest: Value = serde_json::from_str(contents).map_err(|e| invalid(e.to_string()))?;
    let psr4 = match manifest.pointer("/autoload/psr-4") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(invalid("`autoload.psr-4` must be an object".to_string())),
    };

    let mut roots = Vec::new();
    for (prefix, dirs) in psr4 {
        let dirs: Vec<&str> = match dirs {
            Value::String(dir) => vec![dir.as_str()],
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        invalid(format!("`autoload.psr-4.{prefix}` must list directory strings"))
                    })
                })
                .collect::<Result<_>>()?,
            _ => {
                return Err(invalid(format!(
                    "`autoload.psr-4.{prefix}` must be a directory or a list of directories"
                )))
            }
        };
        for dir in dirs {
            roots.push(SourceRoot {
                prefix: prefix.clone(),
                dir: project_root.join(dir),
            });
        }
    }
    Ok(roots)
}
