//! # Generator Module
//!
//! Turns discovered models into repository source files and the provider
//! that wires them together.
//!
//! ## Overview
//!
//! For every eligible model the generator produces:
//! - **Interface** - `<Model>RepositoryInterface`, extending the shared base interface
//! - **Repository** - `<Model>Repository`, extending the shared base repository
//!
//! plus, once per project, the two shared bases and the wiring provider.
//!
//! ## Architecture
//!
//! ```text
//! Discovery → Naming → Template Rendering → Publish-once → Wiring (rewrite)
//! ```
//!
//! 1. **Naming** - [`resolve_target`] derives names and paths from the model's short name
//! 2. **Template Rendering** - [`TemplateStore`] substitutes `$KEY$` placeholders in a stub
//! 3. **Publishing** - [`FilePublisher`] writes a file only if none exists yet
//! 4. **Wiring** - [`WiringManifest`] collects imports and bindings; the provider is
//!    deleted and rewritten on every run
//!
//! ## Generated Structure
//!
//! ```text
//! app/
//! ├── Repositories/
//! │   ├── EloquentRepositoryInterface.php
//! │   └── *RepositoryInterface.php      # One per model
//! │   └── Eloquent/
//! │       ├── ModelRepository.php
//! │       └── *Repository.php           # One per model
//! └── Providers/
//!     └── RepositoryServiceProvider.php # Rewritten every run
//! ```
//!
//! ## Usage
//!
//! ### CLI Usage
//!
//! ```bash
//! repogen generate --project path/to/laravel-app
//! ```
//!
//! ### Programmatic Usage
//!
//! ```rust,ignore
//! use eloquent_repogen::generator::{generate_repositories, GenerateOptions};
//!
//! let report = generate_repositories(Path::new("."), &GenerateOptions::default())?;
//! println!("{} models", report.models.len());
//! ```
//!
//! ## Template Customization
//!
//! Templates live in `templates/` and are compiled into the binary. A project
//! can override any of them by pointing `stubs_dir` in `repogen.toml` at a
//! directory containing `<identifier>.stub` files:
//!
//! - `eloquent-repository-interface.stub` - shared base interface
//! - `model-repository.stub` - shared base repository
//! - `repository-interface.stub` - per-model interface
//! - `repository.stub` - per-model repository
//! - `repository-provider.stub` - wiring provider
//!
//! Files that already exist are never touched again, so editing generated
//! repositories is safe.

mod naming;
mod project;
mod publish;
mod templates;
mod wiring;

pub use naming::{
    base_interface_path, base_repository_path, resolve_target, GenerationTarget, BASE_INTERFACE,
    BASE_REPOSITORY, INTERFACE_SUFFIX, REPOSITORY_SUFFIX,
};
pub use project::*;
pub use publish::{FilePublisher, PublishOutcome};
pub use templates::{substitute, TemplateContext, TemplateId, TemplateStore};
pub use wiring::WiringManifest;
