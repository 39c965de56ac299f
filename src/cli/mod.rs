//! # CLI Module
//!
//! Command-line interface of the `repogen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate repositories for every model of a Laravel project and rewrite the
//! binding provider:
//!
//! ```bash
//! repogen generate --project path/to/app
//! ```
//!
//! Options:
//! - `--project <DIR>` - Project root holding `composer.json` (default: current directory)
//! - `--config <FILE>` - Configuration file (default: `<project>/repogen.toml` if present)
//! - `--dry-run` - Report what would be written without touching the filesystem
//!
//! ### `models`
//!
//! List discovered models, their target files, and the types that were skipped:
//!
//! ```bash
//! repogen models --project path/to/app
//! ```
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` is honoured;
//! `--verbose` raises the default level from `warn` to `debug`.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use eloquent_repogen::cli::{run, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run(cli)?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{init_logging, run, run_cli, Cli, Commands};
