//! `dep-auditor`: audit one dependency manifest and print a report.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and initialize logging.
//! 2. Read the manifest from a file or standard input.
//! 3. Load config ([`dep_auditor::config::load_config`]) and apply `--no-*` overrides.
//! 4. Run the engine ([`dep_auditor::auditor::audit_with`]).
//! 5. Render markdown, JSON or the terminal view.
//! 6. Exit `0` (clean) or `1` (critical/high issue found, or the audit failed).

mod cli;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use cli::{Cli, OutputFormat};
use dep_auditor::auditor::{audit_with, AuditRequest};
use dep_auditor::config::load_config;
use dep_auditor::detector::ParserRegistry;
use dep_auditor::report::{markdown, terminal};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let content = read_input(&cli)?;

    let project_path = if cli.reads_stdin() {
        Path::new(".")
    } else {
        Path::new(&cli.input).parent().unwrap_or(Path::new("."))
    };
    let config = load_config(project_path, cli.config.as_deref())?;
    let options = cli.apply_overrides(config.to_options());

    let registry = ParserRegistry::new();
    let file_type = cli.file_type.clone().or_else(|| file_type_from_name(&registry, &cli));

    let mut request = AuditRequest::new(content).with_options(options);
    request.file_type = file_type;

    let source = if cli.reads_stdin() { "<stdin>" } else { cli.input.as_str() };
    if !cli.quiet && cli.format != OutputFormat::Terminal {
        eprintln!("  {} auditing {}", "→".cyan(), source);
    }

    let analysis = match audit_with(&registry, &request) {
        Ok(analysis) => analysis,
        Err(err) => {
            match cli.format {
                OutputFormat::Markdown => print!("{}", markdown::render_error(&err)),
                OutputFormat::Json | OutputFormat::Terminal => eprintln!("{} {}", "error:".red().bold(), err),
            }
            std::process::exit(1);
        }
    };

    match cli.format {
        OutputFormat::Markdown => print!("{}", markdown::render(&analysis, &request.options)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Terminal => print!("{}", terminal::render(&analysis, source, cli.verbose, cli.quiet)),
    }

    if analysis.has_blocking_issues() {
        std::process::exit(1);
    }

    Ok(())
}

fn read_input(cli: &Cli) -> Result<String> {
    if cli.reads_stdin() {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read manifest from stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(&cli.input).with_context(|| format!("failed to read {}", cli.input))
}

/// Use the input's file name as the type hint when the registry knows it.
fn file_type_from_name(registry: &ParserRegistry, cli: &Cli) -> Option<String> {
    if cli.reads_stdin() {
        return None;
    }
    let name = Path::new(&cli.input).file_name()?.to_str()?;
    let parser = registry.by_file_type(name)?;
    debug!(name, file_type = parser.file_type(), "file type taken from file name");
    Some(parser.file_type().to_string())
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
