//! Publish-once file writing.
//!
//! Generated files are written at most once: an existing file at the target
//! path is authoritative and is never overwritten, diffed or merged. Writes go
//! through a temporary file in the target directory that is atomically linked
//! into place only if the target is still absent, so a crash never leaves a
//! half-written file and a concurrent run cannot clobber a winner.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{GenerateError, Result};

/// What happened to a target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The file did not exist and has been created
    Written,
    /// A file was already present; nothing was written
    AlreadyExists,
    /// An existing file was deleted and rewritten (wiring file only)
    Replaced,
    /// Dry run: the file would have been written
    DryRun,
}

impl PublishOutcome {
    /// Whether bytes reached the disk.
    pub fn wrote(self) -> bool {
        matches!(self, PublishOutcome::Written | PublishOutcome::Replaced)
    }
}

/// Writes generated files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePublisher {
    dry_run: bool,
}

impl FilePublisher {
    /// Publisher that writes to disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publisher that reports outcomes without touching the filesystem.
    pub fn dry_run() -> Self {
        FilePublisher { dry_run: true }
    }

    /// Whether this publisher is a dry run.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Create a directory and its parents.
    pub fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if self.dry_run || dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| GenerateError::fs("create directory", dir, e))
    }

    /// Write `content` to `path` unless a file already exists there.
    pub fn publish_once(&self, path: &Path, content: &str) -> Result<PublishOutcome> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "target exists, leaving it untouched");
            return Ok(PublishOutcome::AlreadyExists);
        }
        if self.dry_run {
            return Ok(PublishOutcome::DryRun);
        }
        if write_if_absent(path, content)? {
            Ok(PublishOutcome::Written)
        } else {
            Ok(PublishOutcome::AlreadyExists)
        }
    }

    /// Delete any file at `path`, then write `content` there.
    pub fn replace(&self, path: &Path, content: &str) -> Result<PublishOutcome> {
        let existed = path.exists();
        if self.dry_run {
            return Ok(PublishOutcome::DryRun);
        }
        if existed {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(GenerateError::fs("delete", path, e)),
            }
        }
        let wrote = write_if_absent(path, content)?;
        Ok(replace_outcome(existed, wrote))
    }
}

/// A concurrent writer can recreate the file between delete and write; then
/// nothing of ours reached the disk.
fn replace_outcome(existed: bool, wrote: bool) -> PublishOutcome {
    match (existed, wrote) {
        (_, false) => PublishOutcome::AlreadyExists,
        (true, true) => PublishOutcome::Replaced,
        (false, true) => PublishOutcome::Written,
    }
}

/// Atomic create-if-absent. Returns `false` when another writer got there first.
fn write_if_absent(path: &Path, content: &str) -> Result<bool> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| GenerateError::fs("create directory", parent, e))?;

    let mut tmp =
        NamedTempFile::new_in(parent).map_err(|e| GenerateError::fs("create temp file in", parent, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| GenerateError::fs("write", tmp.path(), e))?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            tracing::debug!(path = %path.display(), "lost create race, keeping existing file");
            Ok(false)
        }
        Err(e) => Err(GenerateError::fs("write", path, e.error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_publish_once_creates_parents_and_writes() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/File.php");
        let outcome = FilePublisher::new().publish_once(&target, "<?php").unwrap();
        assert_eq!(outcome, PublishOutcome::Written);
        assert_eq!(fs::read_to_string(&target).unwrap(), "<?php");
    }

    #[test]
    fn test_publish_once_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("File.php");
        fs::write(&target, "edited by hand").unwrap();
        let outcome = FilePublisher::new().publish_once(&target, "generated").unwrap();
        assert_eq!(outcome, PublishOutcome::AlreadyExists);
        assert_eq!(fs::read_to_string(&target).unwrap(), "edited by hand");
    }

    #[test]
    fn test_publish_leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("File.php");
        FilePublisher::new().publish_once(&target, "x").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("File.php")]);
    }

    #[test]
    fn test_replace_rewrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Provider.php");
        let publisher = FilePublisher::new();
        assert_eq!(publisher.replace(&target, "one").unwrap(), PublishOutcome::Written);
        assert_eq!(publisher.replace(&target, "two").unwrap(), PublishOutcome::Replaced);
        assert_eq!(fs::read_to_string(&target).unwrap(), "two");
    }

    #[test]
    fn test_write_if_absent_reports_lost_race() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Provider.php");
        fs::write(&target, "other writer").unwrap();
        assert!(!write_if_absent(&target, "ours").unwrap());
        assert_eq!(fs::read_to_string(&target).unwrap(), "other writer");
    }

    #[test]
    fn test_replace_outcome_when_recreated_concurrently() {
        assert_eq!(replace_outcome(true, false), PublishOutcome::AlreadyExists);
        assert_eq!(replace_outcome(false, false), PublishOutcome::AlreadyExists);
        assert_eq!(replace_outcome(true, true), PublishOutcome::Replaced);
        assert_eq!(replace_outcome(false, true), PublishOutcome::Written);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("sub/File.php");
        let publisher = FilePublisher::dry_run();
        publisher.ensure_dir(&dir.path().join("sub")).unwrap();
        assert_eq!(publisher.publish_once(&target, "x").unwrap(), PublishOutcome::DryRun);
        assert_eq!(publisher.replace(&target, "x").unwrap(), PublishOutcome::DryRun);
        assert!(!dir.path().join("sub").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_directory_is_a_filesystem_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();
        // root ignores directory permissions
        if fs::write(locked.join("writable"), "").is_ok() {
            return;
        }
        let err = FilePublisher::new()
            .publish_once(&locked.join("File.php"), "x")
            .unwrap_err();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).unwrap();
        assert!(matches!(err, GenerateError::Filesystem { .. }));
    }
}
