//! # eloquent-repogen
//!
//! **eloquent-repogen** generates the repository layer of a Laravel application: one
//! interface and one Eloquent-backed implementation per model, two shared base
//! artifacts, and a service provider binding every interface to its implementation.
//!
//! ## Overview
//!
//! Models are found by reading the project's `composer.json` psr-4 roots and statically
//! scanning each PHP file under them. No PHP runtime is needed. A class is a model when its
//! `extends` chain reaches a configured base (Eloquent `Model` by default), it is not
//! abstract, and it does not carry `#[Repository(enable: false)]`.
//!
//! ## Architecture
//!
//! - **[`discovery`]** - source roots, PHP declaration scanning, model eligibility
//! - **[`generator`]** - naming, `$KEY$` templates, publish-once writing, provider wiring
//! - **[`config`]** - optional `repogen.toml` and the derived output layout
//! - **[`error`]** - fatal error kinds
//! - **[`cli`]** - the `repogen` command line
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(repogen)
//!     participant Disc as discovery
//!     participant Gen as generator
//!     participant FS as File System
//!
//!     CLI->>Disc: read composer.json psr-4 roots
//!     Disc->>FS: walk roots, scan *.php
//!     Disc-->>CLI: eligible models (discovery order)
//!     CLI->>Gen: ensure directories
//!     Gen->>FS: publish bases (once)
//!     loop every model
//!         Gen->>FS: publish interface + repository (once)
//!     end
//!     Gen->>FS: delete + rewrite RepositoryServiceProvider
//! ```
//!
//! ## Idempotence
//!
//! Every generated file except the provider is written only if absent, through an atomic
//! create-if-absent. Re-running after editing a repository leaves the edit alone and only
//! adds files for new models. The provider always reflects the current model set.
//!
//! ## Quick Start
//!
//! ```bash
//! repogen generate --project path/to/laravel-app
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod generator;

pub use config::RepogenConfig;
pub use error::GenerateError;
pub use generator::{generate_repositories, GenerateOptions, GenerationReport};
