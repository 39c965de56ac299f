#![allow(dead_code, clippy::unwrap_used)]

pub mod fixture {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A throwaway Laravel-shaped project.
    pub struct LaravelProject {
        dir: TempDir,
        roots: Vec<(String, String)>,
    }

    impl LaravelProject {
        /// Project with the conventional `App\` → `app/` root.
        pub fn new() -> Self {
            Self::with_roots(&[("App\\", "app/")])
        }

        /// Project registering the given `(prefix, dir)` roots in order.
        pub fn with_roots(roots: &[(&str, &str)]) -> Self {
            let project = LaravelProject {
                dir: TempDir::new().unwrap(),
                roots: roots
                    .iter()
                    .map(|(p, d)| (p.to_string(), d.to_string()))
                    .collect(),
            };
            project.write_manifest();
            project
        }

        fn write_manifest(&self) {
            let psr4: serde_json::Map<String, serde_json::Value> = self
                .roots
                .iter()
                .map(|(p, d)| (p.clone(), serde_json::Value::String(d.clone())))
                .collect();
            let manifest = serde_json::json!({
                "name": "acme/shop",
                "autoload": { "psr-4": psr4 },
            });
            fs::write(
                self.root().join("composer.json"),
                serde_json::to_string_pretty(&manifest).unwrap(),
            )
            .unwrap();
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        /// Write a file relative to the project root.
        pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
            let path = self.root().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, contents).unwrap();
            path
        }

        /// Write a concrete model extending Eloquent's `Model`.
        pub fn model(&self, rel: &str, namespace: &str, name: &str) -> PathBuf {
            self.write(rel, &model_source(namespace, name, ""))
        }

        /// Read a file relative to the project root.
        pub fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.root().join(rel)).unwrap()
        }

        pub fn exists(&self, rel: &str) -> bool {
            self.root().join(rel).exists()
        }

        /// Every regular file under `app/Repositories`, sorted.
        pub fn generated_files(&self) -> Vec<String> {
            let mut files: Vec<String> = walkdir::WalkDir::new(self.root().join("app/Repositories"))
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| {
                    e.path()
                        .strip_prefix(self.root())
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/")
                })
                .collect();
            files.sort();
            files
        }
    }

    /// PHP source of a model class; `prefix` goes before `class`
    /// (attributes, `abstract`).
    pub fn model_source(namespace: &str, name: &str, prefix: &str) -> String {
        format!(
            "<?php\n\nnamespace {namespace};\n\nuse Illuminate\\Database\\Eloquent\\Model;\n\n{prefix}class {name} extends Model\n{{\n    protected $guarded = [];\n}}\n"
        )
    }
}
