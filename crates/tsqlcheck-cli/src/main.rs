//! tsqlcheck CLI - T-SQL static analysis tool

mod args;
mod config;
mod output;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{miette, IntoDiagnostic, Report, WrapErr};
use tsqlcheck_core::{Analyzer, DiagnosticKind, Severity, SqlVersion};

use crate::args::Args;
use crate::config::Config;
use crate::output::{FileReport, OutputFormatter};

const INLINE_PATH: &str = "<inline>";

/// Why a run stopped before producing results
enum Failure {
    /// Bad arguments or configuration
    Usage(Report),
    /// An input could not be read
    Io(Report),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(Failure::Usage(e)) => {
            eprintln!("Error: {:?}", e);
            eprintln!("Run 'tsqlcheck --help' for usage");
            ExitCode::from(1)
        }
        Err(Failure::Io(e)) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

/// Check every input. Returns true if any input had syntax errors.
fn run(args: Args) -> Result<bool, Failure> {
    if args.list_warnings {
        print!("{}", output::warnings_markdown());
        return Ok(false);
    }

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::find_and_load().map(Option::unwrap_or_default),
    }
    .map_err(Failure::Usage)?;
    let config = config.merge_with_args(&args);

    let analyzer = build_analyzer(&config).map_err(Failure::Usage)?;
    let output_format = config.format.unwrap_or_default();

    if !args.nologo && output_format == args::OutputFormat::Human {
        println!("tsqlcheck version {}", env!("CARGO_PKG_VERSION"));
    }

    let mut reports = Vec::new();
    if let Some(sql) = &args.inline {
        reports.push(FileReport {
            path: INLINE_PATH.to_string(),
            results: analyzer.analyze(sql),
        });
    }

    for file in expand_files(&args.files).map_err(Failure::Usage)? {
        let content = fs::read_to_string(&file)
            .into_diagnostic()
            .wrap_err_with(|| format!("Error reading file {}", file.display()))
            .map_err(Failure::Io)?;
        tracing::debug!(file = %file.display(), "checking");
        reports.push(FileReport {
            path: file.display().to_string(),
            results: analyzer.analyze(&content),
        });
    }

    OutputFormatter::new(output_format)
        .print_reports(&reports)
        .map_err(Failure::Io)?;

    let errors: usize = reports.iter().map(|r| r.results.errors.len()).sum();
    let warnings: usize = reports.iter().map(|r| r.results.diagnostics.len()).sum();
    tracing::info!(files = reports.len(), errors, warnings, "done");

    Ok(errors > 0)
}

fn build_analyzer(config: &Config) -> miette::Result<Analyzer> {
    let version: SqlVersion = match &config.sql_version {
        Some(version) => version.parse().map_err(|e: String| miette!(e))?,
        None => SqlVersion::default(),
    };

    let threshold = match config.warn {
        Some(level) => Severity::from_level(level)
            .ok_or_else(|| miette!("Invalid Warning Level '{}'", level))?,
        None => Severity::default(),
    };

    let mut analyzer = Analyzer::with_version(version).with_threshold(threshold);
    for warning in &config.disable {
        let kind: DiagnosticKind = warning.parse().map_err(|e: String| miette!(e))?;
        analyzer = analyzer.disable(kind);
    }
    Ok(analyzer)
}

/// Expand glob patterns; plain paths are kept as given so a missing file
/// surfaces as a read error
fn expand_files(patterns: &[PathBuf]) -> miette::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.display().to_string();
        if !pattern_str.contains(['*', '?', '[']) {
            files.push(pattern.clone());
            continue;
        }

        let before = files.len();
        for path in glob::glob(&pattern_str).into_diagnostic()?.flatten() {
            files.push(path);
        }
        if files.len() == before {
            miette::bail!("No files match '{}'", pattern_str);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_analyzer_from_config() {
        let config = Config {
            sql_version: Some("2008".to_string()),
            warn: Some(3),
            format: None,
            disable: vec!["unused-variable".to_string()],
        };
        let analyzer = build_analyzer(&config).unwrap();
        assert_eq!(analyzer.version(), SqlVersion::Sql2008);
        assert!(analyzer.analyze("declare @a as int").is_clean());
    }

    #[test]
    fn test_bad_config_values() {
        let bad_version = Config {
            sql_version: Some("1999".to_string()),
            ..Config::default()
        };
        assert!(build_analyzer(&bad_version).is_err());

        let bad_warning = Config {
            disable: vec!["99".to_string()],
            ..Config::default()
        };
        assert!(build_analyzer(&bad_warning).is_err());

        let bad_level = Config {
            warn: Some(7),
            ..Config::default()
        };
        assert!(build_analyzer(&bad_level).is_err());
    }

    #[test]
    fn test_plain_paths_are_kept() {
        let files = expand_files(&[PathBuf::from("missing.sql")]).unwrap();
        assert_eq!(files, vec![PathBuf::from("missing.sql")]);
    }

    #[test]
    fn test_unmatched_glob_is_an_error() {
        assert!(expand_files(&[PathBuf::from("no/such/dir/*.sql")]).is_err());
    }
}
