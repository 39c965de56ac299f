//! Unit tests for CLI commands

#![allow(clippy::unwrap_used, clippy::panic)]

use crate::cli::{run, Cli, Commands};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_generate_defaults() {
    let cli = Cli::try_parse_from(["repogen", "generate"]).unwrap();
    assert!(!cli.verbose);
    match cli.command {
        Commands::Generate {
            project, dry_run, ..
        } => {
            assert_eq!(project, PathBuf::from("."));
            assert!(!dry_run);
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_generate_with_flags() {
    let cli = Cli::try_parse_from([
        "repogen",
        "generate",
        "--project",
        "shop",
        "--config",
        "shop/custom.toml",
        "--dry-run",
        "-v",
    ])
    .unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Generate {
            project,
            config,
            dry_run,
        } => {
            assert_eq!(project, PathBuf::from("shop"));
            assert_eq!(config, Some(PathBuf::from("shop/custom.toml")));
            assert!(dry_run);
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_models_command_exists() {
    let cli = Cli::try_parse_from(["repogen", "--verbose", "models", "-p", "shop"]).unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Models { project, .. } => assert_eq!(project, PathBuf::from("shop")),
        _ => panic!("Expected Models command"),
    }
}

#[test]
fn test_unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["repogen", "serve"]).is_err());
    assert!(Cli::try_parse_from(["repogen"]).is_err());
}

#[test]
fn test_run_reports_missing_manifest() {
    let dir = tempfile::TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "repogen",
        "generate",
        "--project",
        dir.path().to_str().unwrap(),
    ])
    .unwrap();
    let err = run(cli).unwrap_err();
    assert!(format!("{err:#}").contains("composer.json"));
}
