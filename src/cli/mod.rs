//! CLI command definitions and handlers

mod analyze;
mod bind;
mod merge;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use smelltrail::config::{self, AnalysisConfig};
use smelltrail::pipeline::{ProgressCallback, ProjectFailure, RunOutcome};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// smelltrail - Code-smell lifecycles and ownership from git history
#[derive(Parser, Debug)]
#[command(name = "smelltrail")]
#[command(
    version,
    about = "Mine git history to classify commits, attribute file ownership and track code-smell lifecycles",
    after_help = "\
Examples:
  smelltrail analyze repos/                                  Commit records and ownership per repository
  smelltrail bind --input smells/ --repos repos/             Bind smell instances to file owners
  smelltrail merge --input smells/ --repos repos/ --logs logs/ --commits output/
                                                             Lifecycle events, counters and commit context"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of projects analyzed in parallel (1-64)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Directory receiving the output tables
    #[arg(long, short = 'o', global = true, default_value = "output")]
    pub output: PathBuf,

    /// Configuration file (default: smelltrail.toml or .smelltrailrc.json in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Field separator of the output tables
    #[arg(long, global = true)]
    pub delimiter: Option<String>,

    /// Branch to walk instead of HEAD
    #[arg(long, global = true)]
    pub branch: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify commits and audit file ownership of every repository in a directory
    Analyze {
        /// Directory with one git repository per project
        repos_dir: PathBuf,
    },

    /// Bind smell instances to the ownership of their files
    Bind {
        /// Directory with one smell detector output directory per project
        #[arg(long)]
        input: PathBuf,

        /// Directory with one git repository per project
        #[arg(long)]
        repos: PathBuf,

        /// Smell logs bound in parallel inside one project (1-64)
        #[arg(long, value_parser = parse_workers)]
        binding_workers: Option<usize>,
    },

    /// Rebuild smell lifecycles and join them with ownership and commit context
    Merge {
        /// Directory with one smell detector output directory per project
        #[arg(long)]
        input: PathBuf,

        /// Directory with one git repository per project
        #[arg(long)]
        repos: PathBuf,

        /// Directory with `<project>.logs` commit orders
        #[arg(long)]
        logs: Option<PathBuf>,

        /// Directory with `commits-<project>.csv` tables from `analyze`
        #[arg(long)]
        commits: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    match cli.command {
        Commands::Analyze { repos_dir } => analyze::run(&repos_dir, &cli.output, config),
        Commands::Bind {
            input,
            repos,
            binding_workers,
        } => {
            let mut config = config;
            if let Some(n) = binding_workers {
                config.analysis.binding_workers = n;
            }
            bind::run(&input, &repos, &cli.output, config)
        }
        Commands::Merge {
            input,
            repos,
            logs,
            commits,
        } => merge::run(&input, &repos, logs, commits, &cli.output, config),
    }
}

/// Config file values, overridden by command-line flags.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_config_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => config::load_config(&std::env::current_dir()?),
    };
    if let Some(workers) = cli.workers {
        config.analysis.workers = workers;
    }
    if let Some(delimiter) = &cli.delimiter {
        config.output.delimiter = delimiter.clone();
    }
    if let Some(branch) = &cli.branch {
        config.analysis.branch = Some(branch.clone());
    }
    config.validate()?;
    Ok(config)
}

fn require_dir(path: &Path, what: &str) -> Result<()> {
    if !path.is_dir() {
        bail!("{} {} is not a directory", what, path.display());
    }
    Ok(())
}

fn create_output_dir(output: &Path) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))
}

/// Create bar progress style
fn create_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░  ")
}

fn project_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(create_bar_style());
    bar
}

/// Drive `bar` from orchestrator progress.
fn progress_callback(bar: ProgressBar) -> ProgressCallback {
    Box::new(move |project, done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
        bar.set_message(project.to_string());
    })
}

fn print_summary<T>(title: &str, outcome: &RunOutcome<T>, written: &[PathBuf]) {
    println!("\n{}", style(title).bold());
    println!("{}", style("──────────────────────────────────────").dim());
    println!(
        "  {} projects analyzed, {} failed",
        style(outcome.results.len()).cyan(),
        style(outcome.failures.len()).red()
    );
    for path in written {
        println!("  {} {}", style("✓").green(), path.display());
    }
    print_failures(&outcome.failures);
}

fn print_failures(failures: &[ProjectFailure]) {
    for failure in failures {
        println!(
            "  {} {}: {}",
            style("✗").red(),
            style(&failure.project).bold(),
            failure.error
        );
    }
}

/// Fail only when there were projects and none of them succeeded.
fn check_outcome<T>(outcome: &RunOutcome<T>) -> Result<()> {
    if outcome.results.is_empty() && outcome.failures.is_empty() {
        println!("{}", style("No projects found").yellow());
    }
    if outcome.all_failed() {
        bail!("All {} projects failed", outcome.failures.len());
    }
    Ok(())
}
