//! Tool configuration for repository generation
//!
//! A project may carry a `repogen.toml` next to its `composer.json` to adjust
//! where models live and what counts as a model. Every field is optional:
//!
//! ```toml
//! app_dir = "app"
//! app_namespace = "App"
//! source_extension = "php"
//! manifest = "composer.json"
//! stubs_dir = "stubs/repositories"
//! model_bases = ["Illuminate\\Database\\Eloquent\\Model"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GenerateError, Result};

/// File name auto-detected at the project root.
pub const CONFIG_FILE_NAME: &str = "repogen.toml";

/// Base types a model must (transitively) extend unless configured otherwise.
pub const DEFAULT_MODEL_BASES: &[&str] = &[
    "Illuminate\\Database\\Eloquent\\Model",
    "Illuminate\\Foundation\\Auth\\User",
    "Illuminate\\Database\\Eloquent\\Relations\\Pivot",
];

/// Configuration loaded from `repogen.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RepogenConfig {
    /// Application source directory, relative to the project root
    pub app_dir: PathBuf,
    /// Namespace registered for `app_dir`
    pub app_namespace: String,
    /// Extension of source files and of generated files, without the dot
    pub source_extension: String,
    /// Fully-qualified names accepted as the data-model base type
    pub model_bases: Vec<String>,
    /// Directory of `<identifier>.stub` files overriding built-in templates
    pub stubs_dir: Option<PathBuf>,
    /// Source-root manifest, relative to the project root
    pub manifest: PathBuf,
}

impl Default for RepogenConfig {
    fn default() -> Self {
        RepogenConfig {
            app_dir: PathBuf::from("app"),
            app_namespace: "App".to_string(),
            source_extension: "php".to_string(),
            model_bases: DEFAULT_MODEL_BASES.iter().map(|s| s.to_string()).collect(),
            stubs_dir: None,
            manifest: PathBuf::from("composer.json"),
        }
    }
}

/// Load a configuration file.
///
/// Returns `Ok(None)` when the file does not exist, an error when it exists
/// but cannot be read or parsed.
pub fn load_config(config_path: &Path) -> Result<Option<RepogenConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(config_path)
        .map_err(|e| GenerateError::fs("read", config_path, e))?;
    let config = toml::from_str(&contents).map_err(|e| GenerateError::Config {
        path: config_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Some(config))
}

/// Resolve the configuration path.
///
/// Priority:
/// 1. Explicitly provided path (via CLI)
/// 2. `repogen.toml` at the project root, if present
/// 3. None (defaults)
pub fn resolve_config_path(explicit_path: Option<&Path>, project_root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    let detected = project_root.join(CONFIG_FILE_NAME);
    detected.exists().then_some(detected)
}

/// Load the configuration for a project, falling back to defaults.
///
/// An explicit path that does not exist is an error; a missing auto-detected
/// file is not.
pub fn load_project_config(project_root: &Path, explicit: Option<&Path>) -> Result<RepogenConfig> {
    match resolve_config_path(explicit, project_root) {
        Some(path) => match load_config(&path)? {
            Some(config) => Ok(config),
            None => Err(GenerateError::fs(
                "read",
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "configuration file not found"),
            )),
        },
        None => Ok(RepogenConfig::default()),
    }
}

/// Output locations and namespaces derived from a project root and its config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Project root (directory holding the manifest)
    pub project_root: PathBuf,
    /// Directory receiving `<Model>RepositoryInterface` files
    pub interfaces_dir: PathBuf,
    /// Namespace of generated interfaces
    pub interfaces_namespace: String,
    /// Directory receiving `<Model>Repository` files
    pub repositories_dir: PathBuf,
    /// Namespace of generated repositories
    pub repositories_namespace: String,
    /// Fixed path of the wiring provider
    pub provider_path: PathBuf,
    /// Namespace of the wiring provider
    pub provider_namespace: String,
    /// Extension of generated files, without the dot
    pub extension: String,
}

/// Short name of the generated wiring provider.
pub const PROVIDER_CLASS: &str = "RepositoryServiceProvider";

impl OutputLayout {
    /// Derive the layout: `Repositories/`, `Repositories/Eloquent/` and
    /// `Providers/` under the configured application directory.
    pub fn new(project_root: &Path, config: &RepogenConfig) -> Self {
        let app_dir = project_root.join(&config.app_dir);
        let interfaces_namespace = join_namespace(&config.app_namespace, "Repositories");
        let repositories_namespace = join_namespace(&interfaces_namespace, "Eloquent");
        let provider_namespace = join_namespace(&config.app_namespace, "Providers");
        OutputLayout {
            project_root: project_root.to_path_buf(),
            interfaces_dir: app_dir.join("Repositories"),
            interfaces_namespace,
            repositories_dir: app_dir.join("Repositories").join("Eloquent"),
            repositories_namespace,
            provider_path: app_dir
                .join("Providers")
                .join(format!("{PROVIDER_CLASS}.{}", config.source_extension)),
            provider_namespace,
            extension: config.source_extension.clone(),
        }
    }

    /// Fully-qualified name of the wiring provider class.
    pub fn provider_class(&self) -> String {
        join_namespace(&self.provider_namespace, PROVIDER_CLASS)
    }
}

/// Join two namespace fragments with a single backslash.
pub fn join_namespace(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('\\');
    let name = name.trim_matches('\\');
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}\\{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_no_config_present() {
        let dir = TempDir::new().unwrap();
        let config = load_project_config(dir.path(), None).unwrap();
        assert_eq!(config, RepogenConfig::default());
        assert_eq!(config.model_bases.len(), 3);
    }

    #[test]
    fn test_auto_detected_config_overrides_fields() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "app_dir = \"src\"\napp_namespace = \"Acme\\\\\"\n",
        )
        .unwrap();
        let config = load_project_config(dir.path(), None).unwrap();
        assert_eq!(config.app_dir, PathBuf::from("src"));
        assert_eq!(config.app_namespace, "Acme\\");
        assert_eq!(config.source_extension, "php");

        let layout = OutputLayout::new(dir.path(), &config);
        assert_eq!(layout.interfaces_namespace, "Acme\\Repositories");
        assert_eq!(layout.repositories_namespace, "Acme\\Repositories\\Eloquent");
        assert_eq!(layout.provider_class(), "Acme\\Providers\\RepositoryServiceProvider");
        assert_eq!(
            layout.provider_path,
            dir.path().join("src/Providers/RepositoryServiceProvider.php")
        );
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_project_config(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, GenerateError::Filesystem { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "appdir = \"src\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, GenerateError::Config { .. }));
    }

    #[test]
    fn test_join_namespace_trims_separators() {
        assert_eq!(join_namespace("App\\", "\\Models"), "App\\Models");
        assert_eq!(join_namespace("", "User"), "User");
        assert_eq!(join_namespace("App", ""), "App");
    }
}
