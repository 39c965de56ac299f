use std::path::PathBuf;

use crate::config::{join_namespace, OutputLayout};
use crate::discovery::ModelDescriptor;

/// Suffix of generated interface names.
pub const INTERFACE_SUFFIX: &str = "RepositoryInterface";
/// Suffix of generated repository names.
pub const REPOSITORY_SUFFIX: &str = "Repository";
/// Short name of the shared base interface.
pub const BASE_INTERFACE: &str = "EloquentRepositoryInterface";
/// Short name of the shared base repository.
pub const BASE_REPOSITORY: &str = "ModelRepository";

/// Names and paths of the two files generated for one model.
///
/// Everything is a function of the model's short name and the layout; two
/// models sharing a short name in different namespaces map to the same target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTarget {
    /// `<Model>RepositoryInterface`
    pub interface_name: String,
    /// Fully-qualified interface name
    pub interface_fqn: String,
    /// Interface file
    pub interface_path: PathBuf,
    /// `<Model>Repository`
    pub repository_name: String,
    /// Fully-qualified repository name
    pub repository_fqn: String,
    /// Repository file
    pub repository_path: PathBuf,
}

/// Derive the generation target of a model.
pub fn resolve_target(model: &ModelDescriptor, layout: &OutputLayout) -> GenerationTarget {
    let interface_name = format!("{}{INTERFACE_SUFFIX}", model.short_name);
    let repository_name = format!("{}{REPOSITORY_SUFFIX}", model.short_name);
    GenerationTarget {
        interface_fqn: join_namespace(&layout.interfaces_namespace, &interface_name),
        interface_path: file_in(layout, &layout.interfaces_dir, &interface_name),
        repository_fqn: join_namespace(&layout.repositories_namespace, &repository_name),
        repository_path: file_in(layout, &layout.repositories_dir, &repository_name),
        interface_name,
        repository_name,
    }
}

/// Path of the shared base interface.
pub fn base_interface_path(layout: &OutputLayout) -> PathBuf {
    file_in(layout, &layout.interfaces_dir, BASE_INTERFACE)
}

/// Path of the shared base repository.
pub fn base_repository_path(layout: &OutputLayout) -> PathBuf {
    file_in(layout, &layout.repositories_dir, BASE_REPOSITORY)
}

fn file_in(layout: &OutputLayout, dir: &std::path::Path, class: &str) -> PathBuf {
    dir.join(format!("{class}.{}", layout.extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepogenConfig;
    use crate::discovery::Eligibility;
    use std::path::Path;

    fn model(fqn: &str) -> ModelDescriptor {
        let (namespace, short) = fqn.rsplit_once('\\').unwrap();
        ModelDescriptor {
            fqn: fqn.into(),
            namespace: namespace.into(),
            short_name: short.into(),
            source: PathBuf::from("x.php"),
            eligibility: Eligibility::Eligible,
        }
    }

    #[test]
    fn test_target_names_and_paths() {
        let layout = OutputLayout::new(Path::new("/srv/shop"), &RepogenConfig::default());
        let target = resolve_target(&model("App\\Models\\Foo"), &layout);
        assert_eq!(target.interface_name, "FooRepositoryInterface");
        assert_eq!(target.repository_name, "FooRepository");
        assert_eq!(target.interface_fqn, "App\\Repositories\\FooRepositoryInterface");
        assert_eq!(target.repository_fqn, "App\\Repositories\\Eloquent\\FooRepository");
        assert_eq!(
            target.interface_path,
            Path::new("/srv/shop/app/Repositories/FooRepositoryInterface.php")
        );
        assert_eq!(
            target.repository_path,
            Path::new("/srv/shop/app/Repositories/Eloquent/FooRepository.php")
        );
    }

    #[test]
    fn test_same_short_name_collides() {
        let layout = OutputLayout::new(Path::new("/p"), &RepogenConfig::default());
        let a = resolve_target(&model("App\\Models\\Tag"), &layout);
        let b = resolve_target(&model("Blog\\Tag"), &layout);
        assert_eq!(a, b);
    }

    #[test]
    fn test_base_paths() {
        let layout = OutputLayout::new(Path::new("/p"), &RepogenConfig::default());
        assert!(base_interface_path(&layout).ends_with("Repositories/EloquentRepositoryInterface.php"));
        assert!(base_repository_path(&layout).ends_with("Repositories/Eloquent/ModelRepository.php"));
    }
}
