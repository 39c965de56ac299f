use crate::generator::{
    generate_repositories, resolve_target, GenerateOptions, RepositoryGenerator,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line interface for repogen
///
/// Generates repository interfaces, Eloquent repositories and the binding
/// provider for the models of a Laravel project.
#[derive(Parser, Debug)]
#[command(name = "repogen", version)]
#[command(about = "Repository generator for Laravel models", long_about = None)]
pub struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available repogen commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate repositories and rewrite the binding provider
    Generate {
        /// Project root holding composer.json
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Path to repogen.toml
        /// If not provided, <project>/repogen.toml is used when present
        #[arg(short, long, env = "REPOGEN_CONFIG")]
        config: Option<PathBuf>,

        /// Perform a dry run: show what would be written without writing files
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// List discovered models and skipped types
    Models {
        /// Project root holding composer.json
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Path to repogen.toml
        #[arg(short, long, env = "REPOGEN_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Parse the process arguments and run the selected command.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

/// Run an already parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            project,
            config,
            dry_run,
        } => {
            let options = GenerateOptions {
                config_path: config,
                dry_run,
            };
            let report = generate_repositories(&project, &options)
                .with_context(|| format!("Failed to generate repositories in {project:?}"))?;
            tracing::info!(
                models = report.models.len(),
                skipped = report.skipped.len(),
                unresolved = report.unresolved.len(),
                written = report.written(),
                "generation finished"
            );
            Ok(())
        }
        Commands::Models { project, config } => {
            let options = GenerateOptions {
                config_path: config,
                dry_run: true,
            };
            let generator = RepositoryGenerator::from_project(&project, &options)?;
            let discovery = generator
                .discover()
                .with_context(|| format!("Failed to discover models in {project:?}"))?;

            for model in discovery.models() {
                let target = resolve_target(model, generator.layout());
                println!("✅ {}", model.fqn);
                println!("   ↳ {}", target.interface_path.display());
                println!("   ↳ {}", target.repository_path.display());
            }
            for skipped in discovery.skipped() {
                println!("ℹ️  {} ({})", skipped.fqn, skipped.eligibility);
            }
            println!(
                "📦 {} model(s), {} skipped, {} unresolved",
                discovery.models().count(),
                discovery.skipped().count(),
                discovery.unresolved.len()
            );
            Ok(())
        }
    }
}
