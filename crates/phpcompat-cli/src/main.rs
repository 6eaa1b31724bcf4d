use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use phpcompat_core::{Config, Diagnostic, Report, Severity};
use phpcompat_sniffs::{release_notes_table, CallSiteScanner, ScanOptions, TokenStream};

/// Suffix of token dumps produced by the tokenizer
const TOKEN_DUMP_SUFFIX: &str = ".tokens.json";

/// PHPCompat - flag PHP function calls whose behavior changed across versions
#[derive(Parser)]
#[command(name = "phpcompat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: phpcompat.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check token dumps for incompatible function calls
    Check {
        /// Token dump files, or directories searched for *.tokens.json
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// PHP version to check against (overrides config)
        #[arg(short, long)]
        test_version: Option<String>,

        /// Also match regular-expression rules
        #[arg(short, long)]
        pattern_match: bool,
    },

    /// List the built-in rules
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new("phpcompat.toml").exists() {
        Config::from_file(Path::new("phpcompat.toml")).context("Failed to load phpcompat.toml")?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Check { paths, test_version, pattern_match } => {
            let mut config = config;
            if test_version.is_some() {
                config.test_version = test_version;
            }
            config.pattern_match |= pattern_match;
            check_command(&config, &paths, cli.verbose)
        }
        Commands::Rules => rules_command(),
    }
}

/// Check command - scan every token dump against the built-in rules
fn check_command(config: &Config, paths: &[PathBuf], verbose: bool) -> Result<()> {
    let options = ScanOptions::from_config(config);

    if verbose {
        match options.target_version {
            Some(version) => eprintln!("{} PHP {}", "Target version:".cyan(), version),
            None => eprintln!("{}", "No target version, checking all thresholds".cyan()),
        }
    }

    let dumps = collect_token_dumps(paths)?;
    tracing::debug!(dumps = dumps.len(), "collected token dumps");
    if dumps.is_empty() {
        eprintln!("{}", "No token dumps found".yellow());
        return Ok(());
    }

    let scanner = CallSiteScanner::new(release_notes_table(), options);
    let mut report = Report::with_overrides(config.severity.clone());

    for dump in &dumps {
        if verbose {
            eprintln!("  {} {}...", "Checking".cyan(), dump.display());
        }

        let stream = TokenStream::from_file(dump)
            .with_context(|| format!("Failed to load token dump {}", dump.display()))?;

        report.begin_file(source_name(dump));
        scanner.scan(&stream, &mut report);
    }

    for diagnostic in &report.diagnostics {
        print_diagnostic(diagnostic);
    }

    println!();
    println!(
        "{} files checked: {} errors, {} warnings",
        report.summary.files_scanned,
        format!("{}", report.summary.errors).red().bold(),
        format!("{}", report.summary.warnings).yellow(),
    );

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Rules command - list the built-in rules
fn rules_command() -> Result<()> {
    for rule in release_notes_table().rules() {
        let thresholds: Vec<String> = rule
            .statuses()
            .iter()
            .map(|s| format!("{} {}", if s.forbidden { "forbidden" } else { "different" }, s.threshold))
            .collect();

        println!("{} - {}", rule.key().to_string().bold(), thresholds.join(", "));
        if let Some(alternative) = rule.alternative() {
            println!("    use {} instead", alternative.green());
        }
    }

    Ok(())
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warn => "warning".yellow().bold(),
        Severity::Info => "info".cyan(),
    };
    let location = diagnostic
        .location
        .as_ref()
        .map(|l| l.to_string())
        .unwrap_or_default();

    println!("{} {} [{}] {}", location.bold(), severity, diagnostic.code, diagnostic.message);
}

/// Expand paths into token dump files, sorted for stable output
fn collect_token_dumps(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut dumps = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
                if entry.file_type().is_file() && is_token_dump(entry.path()) {
                    dumps.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            dumps.push(path.clone());
        } else {
            anyhow::bail!("No such file or directory: {}", path.display());
        }
    }

    dumps.sort();
    dumps.dedup();
    Ok(dumps)
}

fn is_token_dump(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.ends_with(TOKEN_DUMP_SUFFIX))
}

/// Source file a token dump was produced from (`index.php.tokens.json` -> `index.php`)
fn source_name(dump: &Path) -> String {
    let display = dump.display().to_string();
    display
        .strip_suffix(TOKEN_DUMP_SUFFIX)
        .map(str::to_string)
        .unwrap_or(display)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_name_strips_suffix() {
        assert_eq!(source_name(Path::new("src/index.php.tokens.json")), "src/index.php");
        assert_eq!(source_name(Path::new("dump.json")), "dump.json");
    }

    #[test]
    fn collects_dumps_from_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("lib");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("b.php.tokens.json"), "[]").unwrap();
        std::fs::write(nested.join("a.php.tokens.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let dumps = collect_token_dumps(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(dumps.len(), 2);
        assert!(dumps.iter().all(|p| is_token_dump(p)));
    }

    #[test]
    fn explicit_files_are_kept_and_missing_paths_fail() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.json");
        std::fs::write(&file, "[]").unwrap();

        assert_eq!(collect_token_dumps(&[file.clone(), file.clone()]).unwrap(), vec![file]);
        assert!(collect_token_dumps(&[dir.path().join("missing")]).is_err());
    }
}
