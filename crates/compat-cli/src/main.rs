//! Extension Compatibility Analyzer CLI
//!
//! Extracts extension archives, catalogs their manifests, and classifies
//! each extension against a base installation's module inventory.

mod cli;
mod error;
mod report;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use compat_core::inspect::PeImportInspector;
use compat_core::manifest::Strictness;
use compat_core::pipeline::{self, RunConfig};

use cli::Cli;
use error::Result;

fn main() {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = RunConfig {
        extensions_dir: cli.extensions_dir.clone(),
        base_install_dir: cli.base_install_dir.clone(),
        strictness: if cli.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        },
    };

    println!("Analyzer started.");
    let inspector = PeImportInspector::new();
    let report = pipeline::run(&config, &inspector)?;
    report::print(&report);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compat_test_utils::fixture::write_zip;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_with_empty_directories() {
        let temp = TempDir::new().unwrap();
        let extensions = temp.path().join("extensions");
        let base = temp.path().join("base");
        fs::create_dir_all(&extensions).unwrap();
        fs::create_dir_all(&base).unwrap();

        let cli = Cli::parse_from([
            "extcompat",
            extensions.to_str().unwrap(),
            base.to_str().unwrap(),
        ]);
        assert!(run(&cli).is_ok());
    }

    #[test]
    fn test_run_with_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "extcompat",
            temp.path().join("nope").to_str().unwrap(),
            temp.path().to_str().unwrap(),
        ]);
        let err = run(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_run_with_real_archives() {
        let temp = TempDir::new().unwrap();
        let extensions = temp.path().join("extensions");
        let base = temp.path().join("base");
        fs::create_dir_all(&extensions).unwrap();
        fs::create_dir_all(&base).unwrap();

        write_zip(&base.join("base.vsix"), &[("Core.dll", b"MZ")]);
        write_zip(
            &extensions.join("ext.vsix"),
            &[(
                "extension.vsixmanifest",
                br#"<Vsix><Identifier Id="ext"><Name>Ext</Name><Author>A</Author><Version>1.0</Version><Description>D</Description><AllUsers>false</AllUsers></Identifier></Vsix>"#
                    .as_slice(),
            )],
        );

        let cli = Cli::parse_from([
            "extcompat",
            extensions.to_str().unwrap(),
            base.to_str().unwrap(),
        ]);
        assert!(run(&cli).is_ok());
    }
}
